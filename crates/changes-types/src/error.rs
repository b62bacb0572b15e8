use thiserror::Error;

/// Errors produced while constructing or decoding engine types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid entity reference {reference:?}: {reason}")]
    InvalidRef { reference: String, reason: String },

    #[error("change for {0} has neither an old nor a new state")]
    EmptyChange(String),

    #[error("invalid changeset: {0}")]
    InvalidChangeset(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for type-level results.
pub type TypeResult<T> = Result<T, TypeError>;
