//! Error types for completion backends.

use thiserror::Error;

/// Errors that can occur while talking to a completion backend.
#[derive(Debug, Error)]
pub enum BrainError {
    /// The backend is misconfigured (missing key, bad client setup).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request could not be delivered.
    #[error("network error: {0}")]
    Network(String),

    /// A timeout occurred while waiting for the backend.
    #[error("request timed out")]
    Timeout,

    /// The backend rejected the request or returned an unusable response.
    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    /// The backend answered without any candidate completion.
    #[error("no completion returned")]
    UpstreamEmpty,
}
