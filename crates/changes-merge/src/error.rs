//! Error types for merging.

use changes_dag::DagError;
use changes_diff::DiffError;
use changes_store::StoreError;
use changes_types::TypeError;

/// Errors that can occur while merging.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Ancestry lookup failed (including `NoIntersection`).
    #[error(transparent)]
    Dag(#[from] DagError),

    /// The sum of the two ranges conflicts.
    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
