//! Tutor configuration.

/// Generation knobs for chat turns and analogies.
#[derive(Debug, Clone, PartialEq)]
pub struct TutorConfig {
    /// Sampling temperature for every request.
    pub temperature: f32,
    /// Max tokens for a chat reply.
    pub max_tokens: u32,
    /// Number of most recent messages sent as history.
    pub history_limit: i64,
    /// Max tokens for a generated analogy.
    pub analogy_max_tokens: u32,
    /// Max tokens for each daily flashcard or quiz set.
    pub daily_max_tokens: u32,
    /// Offer the generate_image tool on chat turns.
    pub enable_images: bool,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
            history_limit: 10,
            analogy_max_tokens: 1000,
            daily_max_tokens: 2000,
            enable_images: false,
        }
    }
}
