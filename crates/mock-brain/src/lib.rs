//! Mock completion backends for tests.
//!
//! This crate provides test doubles for the brain-core traits:
//! - `ScriptedBrain` - Replays queued completions and records every request
//! - `EchoBrain` - Echoes the last user message back
//! - `MockImageTool` - Serves `generate_image` with a fixed URL
//!
//! For production use, see the `openai-brain` crate.
//!
//! # Example
//!
//! ```rust
//! use mock_brain::{ChatMessage, Completion, CompletionClient, CompletionRequest, ScriptedBrain};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_brain::BrainError> {
//!     let brain = ScriptedBrain::new();
//!     brain.push(Completion::text("Hello!")).await;
//!
//!     let request = CompletionRequest::new(vec![ChatMessage::user("Hi")]);
//!     let completion = brain.complete(request).await?;
//!     assert_eq!(completion.content.as_deref(), Some("Hello!"));
//!     Ok(())
//! }
//! ```

mod echo;
mod image;
mod scripted;

// Re-export brain-core types for convenience
pub use brain_core::{
    async_trait, BrainError, ChatMessage, Completion, CompletionClient, CompletionRequest,
    ToolExecutor, ToolRequest, ToolResult,
};

pub use echo::EchoBrain;
pub use image::MockImageTool;
pub use scripted::ScriptedBrain;
