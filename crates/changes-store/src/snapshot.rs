//! JSON snapshot files.
//!
//! Snapshots are written to a temporary file in the destination directory
//! and then renamed over the target, so a crash never leaves a half-written
//! state file behind.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Load a JSON snapshot. Returns `Ok(None)` if the file does not exist.
pub fn load<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(path)?;
    let value = serde_json::from_slice(&bytes)
        .map_err(|e| StoreError::Serialization(format!("{}: {e}", path.display())))?;
    Ok(Some(value))
}

/// Atomically write `value` as pretty-printed JSON to `path`.
pub fn save<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;

    debug!(path = %path.display(), bytes = bytes.len(), "wrote snapshot");
    Ok(())
}
