//! Prompt fingerprinting for logs.

use sha2::{Digest, Sha256};

/// Compute a stable SHA-256 fingerprint for a prompt string.
///
/// System prompts embed user preferences, so logs carry this instead of the
/// prompt text.
pub fn hash_prompt(prompt: &str) -> String {
    format!("{:x}", Sha256::digest(prompt.as_bytes()))
}
