//! ToolExecutor serving `generate_image` through the image-generation API.

use brain_core::{async_trait, BrainError, ToolExecutor, ToolRequest, ToolResult, GENERATE_IMAGE};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api_types::{ImageGenerationRequest, ImageGenerationResponse};
use crate::brain::{build_client, post_json};
use crate::config::OpenAiBrainConfig;

/// Executes `generate_image` calls and returns the generated image URL.
pub struct OpenAiImageTool {
    client: Client,
    config: OpenAiBrainConfig,
}

impl OpenAiImageTool {
    /// Create a new image tool with the given configuration.
    pub fn new(config: OpenAiBrainConfig) -> Result<Self, BrainError> {
        let client = build_client(&config)?;

        info!(
            "OpenAiImageTool initialized with model: {}, size: {}",
            config.image_model, config.image_size
        );

        Ok(Self { client, config })
    }

    /// Generate one image and return its URL.
    pub async fn generate(&self, prompt: &str) -> Result<String, BrainError> {
        let body = ImageGenerationRequest {
            model: self.config.image_model.clone(),
            prompt: prompt.to_string(),
            n: 1,
            size: self.config.image_size.clone(),
        };

        let response: ImageGenerationResponse =
            post_json(&self.client, &self.config, "/v1/images/generations", &body).await?;

        response
            .data
            .into_iter()
            .find_map(|image| image.url)
            .ok_or(BrainError::UpstreamEmpty)
    }
}

#[async_trait]
impl ToolExecutor for OpenAiImageTool {
    async fn execute(&self, request: ToolRequest) -> ToolResult {
        if request.name != GENERATE_IMAGE {
            return ToolResult::error(&request.id, format!("Unknown tool: {}", request.name));
        }

        let prompt = match request.require_string("prompt") {
            Ok(p) => p,
            Err(e) => return ToolResult::error(&request.id, e),
        };

        debug!("Generating image ({} chars of prompt)", prompt.len());

        match self.generate(prompt).await {
            Ok(url) => ToolResult::success(&request.id, url),
            Err(e) => {
                warn!("Image generation failed: {}", e);
                ToolResult::error(&request.id, e.to_string())
            }
        }
    }

    fn supported_tools(&self) -> Vec<&str> {
        vec![GENERATE_IMAGE]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> OpenAiImageTool {
        OpenAiImageTool::new(OpenAiBrainConfig::builder().api_key("test-key").build()).unwrap()
    }

    #[test]
    fn test_supported_tools() {
        let tool = tool();
        assert!(tool.supports("generate_image"));
        assert!(!tool.supports("realtime_search"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_rejected() {
        let request =
            ToolRequest::from_call("call-1".to_string(), "other".to_string(), "{}").unwrap();
        let result = tool().execute(request).await;
        assert!(!result.success);
        assert!(result.content.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_missing_prompt_is_rejected() {
        let request =
            ToolRequest::from_call("call-1".to_string(), GENERATE_IMAGE.to_string(), "{}").unwrap();
        let result = tool().execute(request).await;
        assert!(!result.success);
        assert!(result.content.contains("prompt"));
    }
}
