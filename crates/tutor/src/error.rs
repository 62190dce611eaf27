//! Tutor error types.

use brain_core::BrainError;
use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur during a tutoring request.
#[derive(Debug, Error)]
pub enum TutorError {
    /// The conversation (or other record) does not exist for this user.
    #[error("{0} not found")]
    NotFound(String),

    /// The request was rejected before any work was done.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The completion backend returned nothing usable.
    #[error("completion returned no content")]
    UpstreamEmpty,

    /// The completion backend failed.
    #[error("completion backend error: {0}")]
    Brain(BrainError),

    /// The store failed.
    #[error("database error: {0}")]
    Database(DatabaseError),
}

impl From<BrainError> for TutorError {
    fn from(err: BrainError) -> Self {
        match err {
            BrainError::UpstreamEmpty => TutorError::UpstreamEmpty,
            other => TutorError::Brain(other),
        }
    }
}

impl From<DatabaseError> for TutorError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity, .. } => TutorError::NotFound(entity.to_string()),
            DatabaseError::Validation(e) => TutorError::InvalidInput(e.to_string()),
            other => TutorError::Database(other),
        }
    }
}

/// Result type for tutor operations.
pub type Result<T> = std::result::Result<T, TutorError>;
