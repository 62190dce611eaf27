//! Error types for the web layer.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::DatabaseError;
use ledger::LedgerError;
use thiserror::Error;
use tutor::TutorError;

/// Message shown for every failure whose cause stays server-side.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Errors a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No valid session.
    #[error("Unauthorized")]
    Unauthorized,

    /// The resource does not exist or belongs to someone else.
    #[error("{0} not found")]
    NotFound(String),

    /// The request was malformed.
    #[error("{0}")]
    InvalidInput(String),

    /// The webhook signature did not verify.
    #[error("Invalid signature")]
    SignatureMismatch,

    /// Payment secrets are not configured.
    #[error("Payments not configured")]
    PaymentsNotConfigured,

    /// The completion backend or payment gateway failed.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(DatabaseError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::InvalidInput(_) | ApiError::SignatureMismatch => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::PaymentsNotConfigured => {
                tracing::error!("Payment endpoint called without payment configuration");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            ApiError::Upstream(msg) => {
                tracing::error!("Upstream error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE.to_string())
            }
            ApiError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE.to_string())
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE.to_string())
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity, .. } => ApiError::NotFound(entity.to_string()),
            DatabaseError::Validation(e) => ApiError::InvalidInput(e.to_string()),
            other => ApiError::Database(other),
        }
    }
}

impl From<TutorError> for ApiError {
    fn from(err: TutorError) -> Self {
        match err {
            TutorError::NotFound(entity) => ApiError::NotFound(entity),
            TutorError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            TutorError::UpstreamEmpty => {
                ApiError::Upstream("completion returned no content".to_string())
            }
            TutorError::Brain(e) => ApiError::Upstream(e.to_string()),
            TutorError::Database(e) => ApiError::from(e),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::SignatureMismatch => ApiError::SignatureMismatch,
            LedgerError::InvalidPayload(msg) => ApiError::InvalidInput(msg),
            LedgerError::Gateway(msg) => ApiError::Upstream(msg),
            LedgerError::Database(e) => ApiError::from(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

/// Result type for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
