//! Profile and teaching preferences.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use database::models::User;
use database::validation::{validate_full_name, validate_preferences};
use database::{user, user_profile, PlanType, TeachingPreferences};
use serde::{Deserialize, Serialize};
use tracing::info;
use tutor::{validate_tone, Tone, INTERESTS};

use crate::error::{ApiError, Result};
use crate::guard::CurrentUser;
use crate::state::AppState;

/// A user as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub subscription_status: PlanType,
    pub subscription_end_date: Option<String>,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            full_name: u.full_name,
            subscription_status: u.subscription_status,
            subscription_end_date: u.subscription_end_date,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesView {
    pub teaching_tone: Option<String>,
    pub custom_tone: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    pub custom_interest: Option<String>,
}

impl From<TeachingPreferences> for PreferencesView {
    fn from(p: TeachingPreferences) -> Self {
        Self {
            teaching_tone: p.teaching_tone,
            custom_tone: p.custom_tone,
            interests: p.interests,
            custom_interest: p.custom_interest,
        }
    }
}

impl From<PreferencesView> for TeachingPreferences {
    fn from(p: PreferencesView) -> Self {
        Self {
            teaching_tone: p.teaching_tone,
            custom_tone: p.custom_tone,
            interests: p.interests,
            custom_interest: p.custom_interest,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OptionView {
    pub id: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: UserView,
    pub preferences: PreferencesView,
    pub tones: Vec<OptionView>,
    pub interests: Vec<OptionView>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    pub full_name: Option<String>,
    #[serde(flatten)]
    pub preferences: PreferencesView,
}

async fn load_profile(state: &AppState, user_id: &str) -> Result<ProfileResponse> {
    let pool = state.db.pool();
    let user = user::get_user(pool, user_id).await?;
    let preferences = user_profile::get_profile(pool, user_id)
        .await?
        .map(|p| p.preferences())
        .unwrap_or_default();

    Ok(ProfileResponse {
        user: user.into(),
        preferences: preferences.into(),
        tones: Tone::ALL
            .iter()
            .map(|tone| OptionView {
                id: tone.id(),
                label: tone.description(),
            })
            .collect(),
        interests: INTERESTS
            .iter()
            .map(|&(id, phrase)| OptionView { id, label: phrase })
            .collect(),
    })
}

/// The caller's profile, preferences, and the selectable options.
pub async fn get_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ProfileResponse>> {
    Ok(Json(load_profile(&state, &user.user_id).await?))
}

/// Save the caller's name and teaching preferences.
pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: std::result::Result<Json<UpdateProfile>, JsonRejection>,
) -> Result<Json<ProfileResponse>> {
    let Json(update) = payload?;
    let prefs: TeachingPreferences = update.preferences.into();

    if let Some(name) = update.full_name.as_deref() {
        validate_full_name(name).map_err(|e| ApiError::InvalidInput(e.to_string()))?;
    }
    if let Some(tone) = prefs.teaching_tone.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        validate_tone(tone).map_err(ApiError::InvalidInput)?;
    }
    validate_preferences(&prefs).map_err(|e| ApiError::InvalidInput(e.to_string()))?;

    let full_name = update.full_name.as_deref().map(str::trim);
    user_profile::update_profile(state.db.pool(), &user.user_id, full_name, &prefs).await?;

    info!(user_id = %user.user_id, "Profile saved");
    Ok(Json(load_profile(&state, &user.user_id).await?))
}
