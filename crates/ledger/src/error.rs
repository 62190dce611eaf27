//! Ledger error types.

use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur while applying payment events.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The webhook signature was missing or did not match the body.
    #[error("webhook signature mismatch")]
    SignatureMismatch,

    /// The webhook body could not be decoded.
    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),

    /// The payment gateway request failed.
    #[error("payment gateway error: {0}")]
    Gateway(String),

    /// The store failed.
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
