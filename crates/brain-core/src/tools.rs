//! Tool execution support for completion backends.
//!
//! A backend offers function tools to the model through
//! [`crate::CompletionRequest::tools`]; calls the model makes come back as
//! [`crate::ToolCall`]s and are executed by a [`ToolExecutor`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Name of the image generation tool.
pub const GENERATE_IMAGE: &str = "generate_image";

/// A function tool definition in chat-completions format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

/// Function definition for a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema of the arguments object.
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create the generate_image tool definition.
    ///
    /// The model calls this when an illustration would help the learner,
    /// describing the picture it wants in `prompt`.
    pub fn generate_image() -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: GENERATE_IMAGE.to_string(),
                description: Some(
                    "Generate an illustration for the learner. Call this only when the \
                     user asks for a picture, diagram or visual, or when an image would \
                     clearly make the explanation easier to follow. Still answer in text."
                        .to_string(),
                ),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "prompt": {
                            "type": "string",
                            "description": "A self-contained description of the image to draw."
                        }
                    },
                    "required": ["prompt"]
                }),
            },
        }
    }

    /// The function name.
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Outcome of one tool call. For `generate_image`, `content` is the image URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub content: String,
    pub success: bool,
}

impl ToolResult {
    /// Create a successful tool result.
    pub fn success(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            success: true,
        }
    }

    /// Create a failed tool result.
    pub fn error(tool_call_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: format!("Error: {}", error.into()),
            success: false,
        }
    }
}

/// A tool call with its arguments decoded.
#[derive(Debug, Clone)]
pub struct ToolRequest {
    pub id: String,
    pub name: String,
    pub arguments: HashMap<String, Value>,
}

impl ToolRequest {
    /// Parse arguments from a JSON string.
    pub fn from_call(
        id: String,
        name: String,
        arguments_json: &str,
    ) -> Result<Self, serde_json::Error> {
        let arguments: HashMap<String, Value> = serde_json::from_str(arguments_json)?;
        Ok(Self {
            id,
            name,
            arguments,
        })
    }

    /// Get a string argument by name.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Get a required string argument, or return an error message.
    pub fn require_string(&self, key: &str) -> Result<&str, String> {
        self.get_string(key)
            .ok_or_else(|| format!("Missing required argument: {}", key))
    }
}

/// Runs the tool calls a completion asks for.
///
/// Failures are reported in the [`ToolResult`] rather than as errors, so a
/// failed image never aborts the reply it belongs to.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute a tool and return the result.
    async fn execute(&self, request: ToolRequest) -> ToolResult;

    /// List the tools this executor supports.
    fn supported_tools(&self) -> Vec<&str>;

    /// Whether this executor handles the named tool.
    fn supports(&self, name: &str) -> bool {
        self.supported_tools().contains(&name)
    }
}
