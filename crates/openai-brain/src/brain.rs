//! OpenAiBrain implementation of the chat-completions API.

use std::time::Duration;

use brain_core::{
    async_trait, hash_prompt, BrainError, Completion, CompletionClient, CompletionRequest,
    ToolCall, Usage,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse};
use crate::config::OpenAiBrainConfig;

/// A completion backend for OpenAI-compatible chat-completions APIs.
///
/// The client is stateless: every request carries its full message history.
pub struct OpenAiBrain {
    client: Client,
    config: OpenAiBrainConfig,
}

impl OpenAiBrain {
    /// Create a new OpenAiBrain with the given configuration.
    pub fn new(config: OpenAiBrainConfig) -> Result<Self, BrainError> {
        let client = build_client(&config)?;

        info!(
            "OpenAiBrain initialized with model: {}, images: {}, timeout: {}s",
            config.model, config.enable_images, config.timeout_secs
        );

        Ok(Self { client, config })
    }

    /// Create an OpenAiBrain from environment variables.
    ///
    /// See [`OpenAiBrainConfig::from_env`] for required environment variables.
    pub fn from_env() -> Result<Self, BrainError> {
        let config = OpenAiBrainConfig::from_env()?;
        Self::new(config)
    }

    /// Get the configuration.
    pub fn config(&self) -> &OpenAiBrainConfig {
        &self.config
    }

    fn build_request(&self, request: CompletionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools: if request.tools.is_empty() {
                None
            } else {
                Some(request.tools)
            },
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiBrain {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, BrainError> {
        if let Some(prompt) = request.system_prompt() {
            debug!("System prompt fingerprint: {}", hash_prompt(prompt));
        }

        let body = self.build_request(request);
        debug!(
            "Sending {} messages to {} (tools: {})",
            body.messages.len(),
            body.model,
            body.tools.as_ref().map_or(0, Vec::len)
        );

        let response: ChatCompletionResponse =
            post_json(&self.client, &self.config, "/v1/chat/completions", &body).await?;

        into_completion(response)
    }

    fn name(&self) -> &str {
        "OpenAiBrain"
    }
}

/// Take the first choice of a response.
fn into_completion(response: ChatCompletionResponse) -> Result<Completion, BrainError> {
    if let Some(usage) = &response.usage {
        debug!(
            "Token usage - prompt: {}, completion: {}, total: {}",
            usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
        );
    }
    let usage = response.usage.map(|u| Usage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });

    let choice = response.choices.into_iter().next().ok_or_else(|| {
        warn!("Completion response contained no choices");
        BrainError::UpstreamEmpty
    })?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolCall {
            id: call.id,
            name: call.function.name,
            arguments: call.function.arguments,
        })
        .collect();

    Ok(Completion {
        content: choice.message.content,
        tool_calls,
        usage,
    })
}

/// Build an HTTP client with the configured timeout.
pub(crate) fn build_client(config: &OpenAiBrainConfig) -> Result<Client, BrainError> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| BrainError::Configuration(format!("Failed to create HTTP client: {}", e)))
}

/// POST a JSON body to `path` and decode the JSON response.
pub(crate) async fn post_json<Req, Resp>(
    client: &Client,
    config: &OpenAiBrainConfig,
    path: &str,
    body: &Req,
) -> Result<Resp, BrainError>
where
    Req: Serialize + ?Sized,
    Resp: DeserializeOwned,
{
    let url = format!("{}{}", config.api_url.trim_end_matches('/'), path);

    let response = client
        .post(&url)
        .bearer_auth(&config.api_key)
        .json(body)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                BrainError::Timeout
            } else {
                BrainError::Network(format!("Failed to send request: {}", e))
            }
        })?;

    let status = response.status();

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();

        // Try to parse as API error
        if let Ok(api_error) = serde_json::from_str::<ApiError>(&error_text) {
            return Err(BrainError::ProcessingFailed(format!(
                "API error ({}): {}",
                status.as_u16(),
                api_error.error.message
            )));
        }

        return Err(BrainError::ProcessingFailed(format!(
            "API error ({}): {}",
            status.as_u16(),
            error_text
        )));
    }

    response.json().await.map_err(|e| {
        if e.is_timeout() {
            BrainError::Timeout
        } else {
            BrainError::ProcessingFailed(format!("Failed to parse response: {}", e))
        }
    })
}
