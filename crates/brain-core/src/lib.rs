//! Shared vocabulary between the tutor and its language-model backends.
//!
//! A backend implements [`CompletionClient`]; the image tool implements
//! [`ToolExecutor`]. The tutor depends only on these traits, which keeps the
//! HTTP backends swappable for the scripted ones in `mock-brain`.

mod completion;
mod error;
mod prompt;
mod tools;
mod trait_def;

pub use completion::{ChatMessage, Completion, CompletionRequest, ToolCall, Usage};
pub use error::BrainError;
pub use prompt::hash_prompt;
pub use tools::{
    FunctionDefinition, ToolDefinition, ToolExecutor, ToolRequest, ToolResult, GENERATE_IMAGE,
};
pub use trait_def::CompletionClient;

pub use async_trait::async_trait;
