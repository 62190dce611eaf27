//! Mock image tool - answers generate_image with a fixed URL.

use async_trait::async_trait;
use brain_core::{ToolExecutor, ToolRequest, ToolResult, GENERATE_IMAGE};
use tokio::sync::Mutex;

/// A `generate_image` executor that never leaves the process.
#[derive(Debug)]
pub struct MockImageTool {
    url: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl MockImageTool {
    /// Create a tool that always returns `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            prompts: Mutex::default(),
        }
    }

    /// Create a tool whose every call fails.
    pub fn failing() -> Self {
        Self {
            url: None,
            prompts: Mutex::default(),
        }
    }

    /// Prompts received so far.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl ToolExecutor for MockImageTool {
    async fn execute(&self, request: ToolRequest) -> ToolResult {
        let prompt = match request.require_string("prompt") {
            Ok(p) => p.to_string(),
            Err(e) => return ToolResult::error(&request.id, e),
        };
        self.prompts.lock().await.push(prompt);

        match &self.url {
            Some(url) => ToolResult::success(&request.id, url.clone()),
            None => ToolResult::error(&request.id, "image service unavailable"),
        }
    }

    fn supported_tools(&self) -> Vec<&str> {
        vec![GENERATE_IMAGE]
    }
}
