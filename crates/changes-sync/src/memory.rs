use async_trait::async_trait;
use serde_json::Value;

use changes_types::Changeset;

use crate::error::{SyncError, SyncResult};
use crate::source::ChangesetSource;

/// Serialized changesets held in memory. Used for tests and for pulling
/// between two registers in one process.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    name: String,
    payloads: Vec<Value>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, payloads: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            payloads,
        }
    }

    /// Serialize `changesets` into their canonical form.
    pub fn from_changesets<'a, I>(name: impl Into<String>, changesets: I) -> SyncResult<Self>
    where
        I: IntoIterator<Item = &'a Changeset>,
    {
        let name = name.into();
        let payloads = changesets
            .into_iter()
            .map(|changeset| {
                changeset.as_dict().map_err(|e| SyncError::InvalidPayload {
                    origin: name.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<SyncResult<Vec<_>>>()?;
        Ok(Self { name, payloads })
    }
}

#[async_trait]
impl ChangesetSource for MemorySource {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn fetch(&self) -> SyncResult<Vec<Value>> {
        Ok(self.payloads.clone())
    }
}
