use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::{SyncError, SyncResult};
use crate::source::ChangesetSource;

/// A JSON document on disk.
///
/// Accepted shapes: a bare array of changesets, `{"changesets": [...]}`, or
/// a register state file (`{"store": {"changesets": [...]}, ...}`), so one
/// instance can pull straight from another's state.
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `payloads` as a `{"changesets": [...]}` document.
    pub async fn write(&self, payloads: Vec<Value>) -> SyncResult<()> {
        let document = serde_json::json!({ "changesets": payloads });
        let bytes = serde_json::to_vec_pretty(&document).map_err(|e| self.invalid(e))?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    fn invalid(&self, reason: impl ToString) -> SyncError {
        SyncError::InvalidPayload {
            origin: self.name(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl ChangesetSource for FileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> SyncResult<Vec<Value>> {
        let bytes = tokio::fs::read(&self.path).await?;
        let document: Value = serde_json::from_slice(&bytes).map_err(|e| self.invalid(e))?;

        let list = match document {
            Value::Array(items) => items,
            Value::Object(mut object) => {
                let nested = object
                    .remove("changesets")
                    .or_else(|| object.remove("store").and_then(|mut s| s.get_mut("changesets").map(Value::take)));
                match nested {
                    Some(Value::Array(items)) => items,
                    _ => return Err(self.invalid("expected a \"changesets\" array")),
                }
            }
            _ => return Err(self.invalid("expected an array or object")),
        };

        debug!(source = %self.name(), changesets = list.len(), "read pull source");
        Ok(list)
    }
}
