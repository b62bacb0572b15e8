use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use changes_types::EntityRef;

/// Instruction to stop surfacing conflicts for one entity on `update`.
///
/// Written when a moderator declines a conflicting change and asks for it
/// to be masked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changemask {
    pub entity: EntityRef,
    pub author: String,
    pub created: DateTime<Utc>,
}

impl Changemask {
    pub fn new(entity: EntityRef, author: impl Into<String>) -> Self {
        Self {
            entity,
            author: author.into(),
            created: Utc::now(),
        }
    }
}
