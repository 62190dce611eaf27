//! Database error types.

use thiserror::Error;

use crate::validation::ValidationError;

/// Failures surfaced by the store.
///
/// `NotFound` also covers rows owned by another user.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A unique column (user email) already holds this value.
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
