//! Configuration for OpenAiBrain.

use brain_core::BrainError;
use std::env;

/// Configuration shared by the chat and image clients.
#[derive(Debug, Clone)]
pub struct OpenAiBrainConfig {
    /// API base URL.
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Chat model name.
    pub model: String,

    /// Image generation model name.
    pub image_model: String,

    /// Generated image size, e.g. "1024x1024".
    pub image_size: String,

    /// Timeout for every outbound request, in seconds.
    pub timeout_secs: u64,

    /// Offer the generate_image tool to the model.
    pub enable_images: bool,
}

impl Default for OpenAiBrainConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-3.5-turbo".to_string(),
            image_model: "dall-e-3".to_string(),
            image_size: "1024x1024".to_string(),
            timeout_secs: 30,
            enable_images: false,
        }
    }
}

impl OpenAiBrainConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `OPENAI_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `OPENAI_API_URL` - API URL (default: https://api.openai.com)
    /// - `OPENAI_MODEL` - Chat model (default: gpt-3.5-turbo)
    /// - `OPENAI_IMAGE_MODEL` - Image model (default: dall-e-3)
    /// - `OPENAI_IMAGE_SIZE` - Image size (default: 1024x1024)
    /// - `OPENAI_TIMEOUT_SECS` - Request timeout (default: 30)
    /// - `OPENAI_ENABLE_IMAGES` - Offer the generate_image tool (default: false)
    pub fn from_env() -> Result<Self, BrainError> {
        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| BrainError::Configuration("OPENAI_API_KEY not set".to_string()))?;

        let defaults = Self::default();

        let api_url = env::var("OPENAI_API_URL").unwrap_or(defaults.api_url);
        let model = env::var("OPENAI_MODEL").unwrap_or(defaults.model);
        let image_model = env::var("OPENAI_IMAGE_MODEL").unwrap_or(defaults.image_model);
        let image_size = env::var("OPENAI_IMAGE_SIZE").unwrap_or(defaults.image_size);

        let timeout_secs = env::var("OPENAI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.timeout_secs);

        let enable_images = env::var("OPENAI_ENABLE_IMAGES")
            .ok()
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            api_url,
            api_key,
            model,
            image_model,
            image_size,
            timeout_secs,
            enable_images,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> OpenAiBrainConfigBuilder {
        OpenAiBrainConfigBuilder::default()
    }
}

/// Builder for OpenAiBrainConfig.
#[derive(Debug, Default)]
pub struct OpenAiBrainConfigBuilder {
    config: OpenAiBrainConfig,
}

impl OpenAiBrainConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the chat model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the image model name.
    pub fn image_model(mut self, model: impl Into<String>) -> Self {
        self.config.image_model = model.into();
        self
    }

    /// Set the image size.
    pub fn image_size(mut self, size: impl Into<String>) -> Self {
        self.config.image_size = size.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    /// Offer the generate_image tool.
    pub fn enable_images(mut self, enable: bool) -> Self {
        self.config.enable_images = enable;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> OpenAiBrainConfig {
        self.config
    }
}
