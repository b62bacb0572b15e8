use thiserror::Error;

use changes_dag::DagError;
use changes_diff::{Conflict, DiffError};
use changes_merge::MergeError;
use changes_store::StoreError;
use changes_sync::SyncError;
use changes_types::{ChangesetId, TypeError};

#[derive(Debug, Error)]
pub enum RegisterError {
    /// Applying would overwrite an edit the changeset does not know about.
    #[error("{0}")]
    Conflict(Box<Conflict>),

    #[error("{0} revision(s) not yet committed; run commit first")]
    UncommittedChanges(usize),

    #[error("changeset not found: {0}")]
    NotFound(ChangesetId),

    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    #[error(transparent)]
    Dag(#[from] DagError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("pull failed: {0}")]
    Sync(#[from] SyncError),

    #[error("invalid changeset: {0}")]
    Type(#[from] TypeError),
}

impl From<Conflict> for RegisterError {
    fn from(conflict: Conflict) -> Self {
        Self::Conflict(Box::new(conflict))
    }
}

impl RegisterError {
    /// The conflict behind this error, wherever it was raised.
    pub fn conflict(&self) -> Option<&Conflict> {
        match self {
            Self::Conflict(conflict) => Some(conflict.as_ref()),
            Self::Diff(DiffError::Conflict(conflict)) => Some(conflict.as_ref()),
            Self::Merge(MergeError::Diff(DiffError::Conflict(conflict))) => Some(conflict.as_ref()),
            _ => None,
        }
    }
}

pub type RegisterResult<T> = Result<T, RegisterError>;
