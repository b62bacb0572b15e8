//! Error types for ancestry arithmetic.

use changes_store::StoreError;
use changes_types::ChangesetId;

/// Errors that can occur while walking the changeset graph.
#[derive(Debug, thiserror::Error)]
pub enum DagError {
    /// A referenced changeset is not in the store.
    #[error("changeset not found: {0}")]
    NotFound(ChangesetId),

    /// The two changesets share no common ancestor.
    #[error("no common ancestor between {a} and {b}")]
    NoIntersection { a: ChangesetId, b: ChangesetId },

    /// `stop` cannot be reached from `start` along `follows_id`.
    #[error("{stop} does not descend from {start}")]
    Unreachable { start: ChangesetId, stop: ChangesetId },

    /// Underlying store error.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience alias for DAG results.
pub type DagResult<T> = Result<T, DagError>;
