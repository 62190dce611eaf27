//! Conversation listing and management.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use database::models::Conversation;
use database::conversation;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::guard::CurrentUser;
use crate::state::AppState;

/// Title given to conversations created without one.
pub const DEFAULT_TITLE: &str = "New Chat";

/// A conversation as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Conversation> for ConversationView {
    fn from(c: Conversation) -> Self {
        Self {
            id: c.id,
            title: c.title,
            topic: c.topic,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateConversation {
    pub title: Option<String>,
    pub topic: Option<String>,
}

/// List the caller's conversations, most recently active first.
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<ConversationView>>> {
    let conversations = conversation::list_conversations(state.db.pool(), &user.user_id).await?;
    Ok(Json(conversations.into_iter().map(Into::into).collect()))
}

/// Start a conversation.
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: std::result::Result<Json<CreateConversation>, JsonRejection>,
) -> Result<(StatusCode, Json<ConversationView>)> {
    let Json(request) = payload?;
    let title = request
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TITLE);

    let created = conversation::create_conversation(
        state.db.pool(),
        &user.user_id,
        title,
        request.topic.as_deref(),
    )
    .await?;

    info!(user_id = %user.user_id, conversation_id = %created.id, "Conversation created");
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Delete one of the caller's conversations.
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    conversation::delete_conversation(state.db.pool(), &id, &user.user_id).await?;
    info!(user_id = %user.user_id, conversation_id = %id, "Conversation deleted");
    Ok(StatusCode::NO_CONTENT)
}
