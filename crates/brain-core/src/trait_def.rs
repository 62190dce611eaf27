//! The CompletionClient trait definition.

use async_trait::async_trait;

use crate::completion::{Completion, CompletionRequest};
use crate::error::BrainError;

/// A backend that turns a message array into a completion.
///
/// Implementations range from scripted test doubles to real model APIs.
/// This trait is object-safe and can be used with `Arc<dyn CompletionClient>`.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Submit a request and return the first candidate completion.
    ///
    /// Returns [`BrainError::UpstreamEmpty`] when the backend produced no
    /// candidate at all.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, BrainError>;

    /// Get a human-readable name for this backend.
    fn name(&self) -> &str;

    /// Check if the backend is ready to serve requests.
    ///
    /// Default implementation always returns true.
    async fn is_ready(&self) -> bool {
        true
    }
}
