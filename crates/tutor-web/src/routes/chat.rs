//! Chat transcript and chat turns.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use database::models::{ConversationMessage, Role};
use database::{conversation, message};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};
use crate::guard::CurrentUser;
use crate::state::AppState;

/// A transcript message as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl From<ConversationMessage> for MessageView {
    fn from(m: ConversationMessage) -> Self {
        Self {
            role: m.role,
            content: m.content,
            image_url: m.image_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub success: bool,
    pub messages: Vec<MessageView>,
}

/// The caller's transcript of one conversation, oldest first.
pub async fn transcript(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(conversation_id): Path<String>,
) -> Result<Json<TranscriptResponse>> {
    let pool = state.db.pool();
    let chat = conversation::get_conversation(pool, &conversation_id, &user.user_id).await?;
    let messages = message::list_messages(pool, &chat.id).await?;

    Ok(Json(TranscriptResponse {
        success: true,
        messages: messages.into_iter().map(Into::into).collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<IncomingMessage>,
    pub conversation_id: Option<String>,
    pub topic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub message: MessageView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Run a chat turn.
///
/// The last message of the body is the learner's new message; earlier
/// messages are ignored in favour of the stored transcript.
pub async fn send(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>> {
    let Json(request) = payload?;

    let conversation_id = request
        .conversation_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::InvalidInput("conversationId is required".to_string()))?;
    let last = request
        .messages
        .last()
        .ok_or_else(|| ApiError::InvalidInput("messages must not be empty".to_string()))?;
    if Role::parse(&last.role) != Some(Role::User) {
        return Err(ApiError::InvalidInput(
            "last message must come from the user".to_string(),
        ));
    }

    let turn = state
        .tutor
        .chat_turn(
            &user.user_id,
            conversation_id,
            &last.content,
            request.topic.as_deref(),
        )
        .await?;

    Ok(Json(ChatResponse {
        success: true,
        message: turn.message.into(),
        title: turn.title,
    }))
}
