use serde_json::Value;

use changes_types::Changeset;

use crate::error::{SyncError, SyncResult};

/// Decode a whole batch of payloads, failing on the first invalid one.
///
/// Nothing is returned unless every payload decodes, so a caller that only
/// stores the result never ingests half a pull.
pub fn decode_all(origin: &str, payloads: &[Value]) -> SyncResult<Vec<Changeset>> {
    payloads
        .iter()
        .enumerate()
        .map(|(index, payload)| {
            Changeset::from_dict(payload).map_err(|e| SyncError::InvalidPayload {
                origin: origin.to_string(),
                reason: format!("changeset #{index}: {e}"),
            })
        })
        .collect()
}
