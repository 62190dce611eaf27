//! AI tutor: system-prompt composition and chat-turn orchestration.
//!
//! The [`Tutor`] ties the conversation store in `database` to a
//! [`brain_core::CompletionClient`]. Each chat turn persists the learner's
//! message, builds a system prompt from their teaching preferences, sends a
//! bounded history to the backend and persists the reply.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tutor::{Tutor, TutorConfig};
//!
//! let tutor = Tutor::new(db, Arc::new(brain), TutorConfig::default());
//! let turn = tutor.chat_turn(&user_id, &conversation_id, "What is torque?", None).await?;
//! println!("{}", turn.message.content);
//! ```

mod config;
mod daily;
mod error;
mod prompt;
mod tone;
mod tutor;

pub use config::TutorConfig;
pub use daily::{DailyContent, Flashcard, Quiz, FLASHCARD_COUNT, QUIZ_COUNT};
pub use error::{Result, TutorError};
pub use prompt::{build_system_prompt, GENERIC_SYSTEM_PROMPT};
pub use tone::{interest_phrase, validate_tone, Tone, INTERESTS};
pub use tutor::{ChatTurn, Tutor, ANALOGY_SYSTEM_PROMPT, DEFAULT_DIFFICULTY, NO_INTERESTS_MESSAGE};
