//! Analogy generation.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::guard::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalogyRequest {
    #[serde(default)]
    pub concept: String,
    pub difficulty_level: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalogyResponse {
    pub success: bool,
    pub analogy: String,
}

/// Explain a concept through an analogy.
pub async fn generate(
    State(state): State<AppState>,
    _user: CurrentUser,
    payload: std::result::Result<Json<AnalogyRequest>, JsonRejection>,
) -> Result<Json<AnalogyResponse>> {
    let Json(request) = payload?;

    let analogy = state
        .tutor
        .generate_analogy(&request.concept, request.difficulty_level.as_deref())
        .await?;

    Ok(Json(AnalogyResponse {
        success: true,
        analogy,
    }))
}
