use changes_types::ChangesetId;

/// Errors from changeset-store and model operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested changeset was not found.
    #[error("changeset not found: {0}")]
    NotFound(ChangesetId),

    /// A lock guarding in-memory state was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from a snapshot file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
