use async_trait::async_trait;
use serde_json::Value;

use crate::error::SyncResult;
use crate::file::FileSource;

/// A place changesets can be pulled from.
#[async_trait]
pub trait ChangesetSource: Send + Sync {
    /// Human-readable location, used in logs and errors.
    fn name(&self) -> String;

    /// Every serialized changeset the source offers, in its canonical form.
    async fn fetch(&self) -> SyncResult<Vec<Value>>;
}

/// Split a comma-separated source list, dropping blanks.
pub fn parse_sources(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Open a source from its configured location.
///
/// Locations are file paths, optionally prefixed with `file://`.
pub fn open_source(location: &str) -> Box<dyn ChangesetSource> {
    let path = location.strip_prefix("file://").unwrap_or(location);
    Box::new(FileSource::new(path))
}
