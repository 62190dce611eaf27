//! OpenAI-based completion backend.
//!
//! This crate provides a [`CompletionClient`] that talks to an
//! OpenAI-compatible chat-completions API, and a [`ToolExecutor`] that serves
//! the `generate_image` tool through the image-generation API.
//!
//! # Usage
//!
//! ```rust,no_run
//! use openai_brain::{OpenAiBrain, OpenAiImageTool};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let brain = OpenAiBrain::from_env()?;
//!     let images = OpenAiImageTool::new(brain.config().clone())?;
//!     // Hand both to the tutor...
//!     Ok(())
//! }
//! ```

mod api_types;
mod brain;
mod config;
mod image;

pub use brain::OpenAiBrain;
pub use config::{OpenAiBrainConfig, OpenAiBrainConfigBuilder};
pub use image::OpenAiImageTool;

// Re-export brain-core types for convenience
pub use brain_core::{async_trait, BrainError, CompletionClient, ToolExecutor};
