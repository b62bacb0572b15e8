//! Error types for the diff crate.

use crate::conflict::Conflict;

/// Errors that can occur during change arithmetic.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// Two change lists disagree on an attribute.
    #[error("{0}")]
    Conflict(Box<Conflict>),
}

impl From<Conflict> for DiffError {
    fn from(conflict: Conflict) -> Self {
        Self::Conflict(Box::new(conflict))
    }
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
