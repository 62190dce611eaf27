//! Input validation for user and profile fields.

use std::fmt;

use crate::models::TeachingPreferences;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid email format.
    InvalidEmail(String),
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Too many entries in a list field.
    TooMany { field: String, max: usize, actual: usize },
    /// Empty value where one is required.
    Empty(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::TooMany { field, max, actual } => {
                write!(f, "too many {} ({}, max {})", field, actual, max)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum allowed length for display names.
pub const MAX_FULL_NAME_LENGTH: usize = 100;

/// Maximum allowed length for free-text tone and interest fields.
pub const MAX_CUSTOM_TEXT_LENGTH: usize = 200;

/// Maximum number of interest tags per profile.
pub const MAX_INTERESTS: usize = 12;

/// Maximum allowed length of a single interest tag.
pub const MAX_INTEREST_LENGTH: usize = 50;

/// Tone id that selects the free-text `custom_tone`.
pub const CUSTOM_TONE: &str = "custom";

/// Basic shape check for a sign-in email: one `@`, a non-empty local part,
/// and a dotted domain without empty labels.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::Empty("email".to_string()));
    }
    check_length("email", email, MAX_EMAIL_LENGTH)?;

    let invalid = |reason: &str| Err(ValidationError::InvalidEmail(reason.to_string()));
    let Some((local, domain)) = email.split_once('@') else {
        return invalid("missing @");
    };
    if domain.contains('@') {
        return invalid("more than one @");
    }
    if local.is_empty() {
        return invalid("nothing before @");
    }
    if !domain.contains('.') || domain.split('.').any(str::is_empty) {
        return invalid("malformed domain");
    }
    Ok(())
}

/// Validate a display name. Empty names are allowed.
pub fn validate_full_name(name: &str) -> Result<(), ValidationError> {
    check_length("full name", name.trim(), MAX_FULL_NAME_LENGTH)
}

/// Validate teaching preferences before they are stored.
pub fn validate_preferences(prefs: &TeachingPreferences) -> Result<(), ValidationError> {
    if prefs.teaching_tone.as_deref() == Some(CUSTOM_TONE) {
        let custom = prefs.custom_tone.as_deref().map(str::trim).unwrap_or("");
        if custom.is_empty() {
            return Err(ValidationError::Empty("custom tone".to_string()));
        }
    }

    if let Some(custom) = prefs.custom_tone.as_deref() {
        check_length("custom tone", custom.trim(), MAX_CUSTOM_TEXT_LENGTH)?;
    }

    if let Some(custom) = prefs.custom_interest.as_deref() {
        check_length("custom interest", custom.trim(), MAX_CUSTOM_TEXT_LENGTH)?;
    }

    if prefs.interests.len() > MAX_INTERESTS {
        return Err(ValidationError::TooMany {
            field: "interests".to_string(),
            max: MAX_INTERESTS,
            actual: prefs.interests.len(),
        });
    }

    for interest in &prefs.interests {
        if interest.trim().is_empty() {
            return Err(ValidationError::Empty("interest".to_string()));
        }
        check_length("interest", interest.trim(), MAX_INTEREST_LENGTH)?;
    }

    Ok(())
}

fn check_length(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
            actual,
        });
    }
    Ok(())
}
