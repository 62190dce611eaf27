//! Echo brain implementation - echoes the last user message back.

use async_trait::async_trait;
use brain_core::{BrainError, Completion, CompletionClient, CompletionRequest};

/// A backend that replies with the last user message.
///
/// Useful for testing the chat flow without any AI processing.
#[derive(Debug, Clone, Default)]
pub struct EchoBrain {
    /// Optional prefix to add before the echo.
    prefix: Option<String>,
}

impl EchoBrain {
    /// Create a new EchoBrain with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new EchoBrain with a custom prefix.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mock_brain::EchoBrain;
    ///
    /// let brain = EchoBrain::with_prefix("Echo: ");
    /// // Will respond with "Echo: <last user message>"
    /// ```
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

#[async_trait]
impl CompletionClient for EchoBrain {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, BrainError> {
        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .ok_or(BrainError::UpstreamEmpty)?;

        let text = match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, last_user.content),
            None => last_user.content.clone(),
        };

        Ok(Completion::text(text))
    }

    fn name(&self) -> &str {
        "EchoBrain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_core::ChatMessage;

    #[tokio::test]
    async fn test_echo_last_user_message() {
        let brain = EchoBrain::new();
        let request = CompletionRequest::new(vec![
            ChatMessage::system("Be nice."),
            ChatMessage::user("first"),
            ChatMessage::assistant("reply"),
            ChatMessage::user("second"),
        ]);

        let completion = brain.complete(request).await.unwrap();
        assert_eq!(completion.content.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_echo_with_prefix() {
        let brain = EchoBrain::with_prefix("Echo: ");
        let request = CompletionRequest::new(vec![ChatMessage::user("Hello!")]);

        let completion = brain.complete(request).await.unwrap();
        assert_eq!(completion.content.as_deref(), Some("Echo: Hello!"));
    }

    #[tokio::test]
    async fn test_echo_without_user_message() {
        let brain = EchoBrain::new();
        let request = CompletionRequest::new(vec![ChatMessage::system("Be nice.")]);

        assert!(matches!(
            brain.complete(request).await,
            Err(BrainError::UpstreamEmpty)
        ));
    }

    #[tokio::test]
    async fn test_brain_name_and_ready() {
        let brain = EchoBrain::new();
        assert_eq!(brain.name(), "EchoBrain");
        assert!(brain.is_ready().await);
    }
}
