//! Scripted brain implementation - replays queued completions.

use std::collections::VecDeque;

use async_trait::async_trait;
use brain_core::{BrainError, Completion, CompletionClient, CompletionRequest};
use tokio::sync::Mutex;

/// A backend that returns queued results in order and records every request.
///
/// An exhausted script answers with [`BrainError::UpstreamEmpty`].
#[derive(Debug, Default)]
pub struct ScriptedBrain {
    script: Mutex<VecDeque<Result<Completion, BrainError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedBrain {
    /// Create a brain with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a brain that replies with the given texts in order.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let script = replies
            .into_iter()
            .map(|text| Ok(Completion::text(text)))
            .collect();
        Self {
            script: Mutex::new(script),
            requests: Mutex::default(),
        }
    }

    /// Queue a completion.
    pub async fn push(&self, completion: Completion) {
        self.script.lock().await.push_back(Ok(completion));
    }

    /// Queue an error.
    pub async fn push_error(&self, error: BrainError) {
        self.script.lock().await.push_back(Err(error));
    }

    /// All requests received so far.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    /// The most recent request, if any.
    pub async fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().await.last().cloned()
    }
}

#[async_trait]
impl CompletionClient for ScriptedBrain {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, BrainError> {
        self.requests.lock().await.push(request);
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or(Err(BrainError::UpstreamEmpty))
    }

    fn name(&self) -> &str {
        "ScriptedBrain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_core::ChatMessage;

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let brain = ScriptedBrain::with_replies(["one", "two"]);

        let first = brain
            .complete(CompletionRequest::new(vec![ChatMessage::user("a")]))
            .await
            .unwrap();
        let second = brain
            .complete(CompletionRequest::new(vec![ChatMessage::user("b")]))
            .await
            .unwrap();

        assert_eq!(first.content.as_deref(), Some("one"));
        assert_eq!(second.content.as_deref(), Some("two"));

        let requests = brain.requests().await;
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].messages[0].content, "b");
    }

    #[tokio::test]
    async fn test_exhausted_script() {
        let brain = ScriptedBrain::new();
        let result = brain.complete(CompletionRequest::default()).await;
        assert!(matches!(result, Err(BrainError::UpstreamEmpty)));
        assert!(brain.last_request().await.is_some());
    }

    #[tokio::test]
    async fn test_queued_error() {
        let brain = ScriptedBrain::new();
        brain.push_error(BrainError::Timeout).await;
        let result = brain.complete(CompletionRequest::default()).await;
        assert!(matches!(result, Err(BrainError::Timeout)));
    }
}
