//! System prompt composition.

use database::validation::CUSTOM_TONE;
use database::TeachingPreferences;

use crate::tone::{interest_phrase, Tone};

/// Used when preferences and topic contribute nothing.
pub const GENERIC_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant. Provide accurate and relevant information.";

/// Compose the system prompt for a chat turn.
///
/// Clauses are appended in order: tone, interests, custom interest, topic.
/// A `custom` tone without text and an unknown tone id contribute nothing.
pub fn build_system_prompt(prefs: &TeachingPreferences, topic: Option<&str>) -> String {
    let mut prompt = String::new();

    if let Some(tone) = non_blank(prefs.teaching_tone.as_deref()) {
        if tone == CUSTOM_TONE {
            if let Some(custom) = non_blank(prefs.custom_tone.as_deref()) {
                prompt.push_str(&format!("You are an AI tutor who teaches {}. ", custom));
            }
        } else if let Some(tone) = Tone::from_id(tone) {
            prompt.push_str(tone.description());
            prompt.push(' ');
        }
    }

    let areas: Vec<&str> = prefs
        .interests
        .iter()
        .map(|interest| interest.trim())
        .filter(|interest| !interest.is_empty())
        .map(interest_phrase)
        .collect();
    if !areas.is_empty() {
        prompt.push_str(
            "When explaining concepts, use analogies and examples from the following areas: ",
        );
        prompt.push_str(&areas.join(", "));
        prompt.push_str(". ");
    }

    if let Some(custom) = non_blank(prefs.custom_interest.as_deref()) {
        prompt.push_str(&format!("Also use analogies from: {}. ", custom));
    }

    if let Some(topic) = non_blank(topic) {
        prompt.push_str(&format!(
            "Focus on providing accurate and relevant information about {}.",
            topic
        ));
    }

    let prompt = prompt.trim_end();
    if prompt.is_empty() {
        GENERIC_SYSTEM_PROMPT.to_string()
    } else {
        prompt.to_string()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
