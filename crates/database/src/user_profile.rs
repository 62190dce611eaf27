//! Teaching preference storage.

use sqlx::types::Json;
use sqlx::{SqliteExecutor, SqlitePool};

use crate::models::{TeachingPreferences, UserProfile};
use crate::validation::validate_preferences;
use crate::{user, Result};

/// Get a user's profile.
pub async fn get_profile(pool: &SqlitePool, user_id: &str) -> Result<Option<UserProfile>> {
    let record = sqlx::query_as::<_, UserProfile>(
        r#"
        SELECT user_id, teaching_tone, custom_tone, interests, custom_interest, created_at, updated_at
        FROM user_profiles
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Save a user's teaching preferences.
///
/// Creates the profile if it doesn't exist and replaces every preference
/// field otherwise, so repeated saves with the same input are idempotent.
/// Blank free-text fields are stored as NULL.
pub async fn save_preferences<'e>(
    executor: impl SqliteExecutor<'e>,
    user_id: &str,
    prefs: &TeachingPreferences,
) -> Result<UserProfile> {
    validate_preferences(prefs)?;

    let interests: Vec<String> = prefs
        .interests
        .iter()
        .map(|interest| interest.trim().to_string())
        .collect();

    let profile = sqlx::query_as::<_, UserProfile>(
        r#"
        INSERT INTO user_profiles (user_id, teaching_tone, custom_tone, interests, custom_interest)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            teaching_tone = excluded.teaching_tone,
            custom_tone = excluded.custom_tone,
            interests = excluded.interests,
            custom_interest = excluded.custom_interest,
            updated_at = datetime('now')
        RETURNING user_id, teaching_tone, custom_tone, interests, custom_interest, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(non_blank(prefs.teaching_tone.as_deref()))
    .bind(non_blank(prefs.custom_tone.as_deref()))
    .bind(Json(interests))
    .bind(non_blank(prefs.custom_interest.as_deref()))
    .fetch_one(executor)
    .await?;

    Ok(profile)
}

/// Save an optional display name and the teaching preferences together.
///
/// Either both writes land or neither does.
pub async fn update_profile(
    pool: &SqlitePool,
    user_id: &str,
    full_name: Option<&str>,
    prefs: &TeachingPreferences,
) -> Result<UserProfile> {
    let mut tx = pool.begin().await?;
    if let Some(name) = full_name {
        user::update_full_name(&mut *tx, user_id, name).await?;
    }
    let profile = save_preferences(&mut *tx, user_id, prefs).await?;
    tx.commit().await?;
    Ok(profile)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
