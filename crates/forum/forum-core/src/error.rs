use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by forum operations.
///
/// Every variant is scoped to the single operation that produced it.
#[derive(Debug, Error)]
pub enum ForumError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid vote choice: {0}")]
    InvalidChoice(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Concurrent update on {0} did not settle")]
    VersionConflict(String),

    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for forum operations
pub type ForumResult<T> = Result<T, ForumError>;

impl From<StoreError> for ForumError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ForumError::NotFound(id),
            StoreError::VersionConflict(id) => ForumError::VersionConflict(id),
            StoreError::Unavailable(msg) => ForumError::StoreUnavailable(msg),
            StoreError::Serialization(msg) => ForumError::Internal(msg),
            StoreError::Backend(msg) => ForumError::Internal(msg),
        }
    }
}
