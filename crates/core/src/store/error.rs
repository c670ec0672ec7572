//! Persistence port errors.

use thiserror::Error;

/// Errors raised by repository implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store failed.
    #[error("Store backend error: {0}")]
    Backend(String),

    /// A row lock could not be acquired in time.
    #[error("Timed out waiting for lock on {0}")]
    LockTimeout(String),

    /// A row the caller expected to exist is missing.
    #[error("{entity} not found: {id}")]
    Missing {
        /// Entity name.
        entity: &'static str,
        /// Entity id.
        id: String,
    },

    /// A unique constraint was violated.
    #[error("Duplicate {entity}: {key}")]
    Duplicate {
        /// Entity name.
        entity: &'static str,
        /// Conflicting key.
        key: String,
    },

    /// A stored value could not be decoded.
    #[error("Corrupt {entity} row: {reason}")]
    Corrupt {
        /// Entity name.
        entity: &'static str,
        /// What was wrong.
        reason: String,
    },
}

impl StoreError {
    /// Shorthand for a missing row.
    pub fn missing(entity: &'static str, id: impl ToString) -> Self {
        Self::Missing {
            entity,
            id: id.to_string(),
        }
    }
}

/// Result type alias using `StoreError`.
pub type StoreResult<T> = Result<T, StoreError>;
