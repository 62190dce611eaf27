//! Dashboard summary and daily learning content.

use axum::extract::State;
use axum::Json;
use database::{conversation, subscription, user};
use serde::Serialize;
use tutor::DailyContent;

use crate::error::Result;
use crate::guard::CurrentUser;
use crate::routes::billing::SubscriptionView;
use crate::routes::conversations::ConversationView;
use crate::routes::profile::UserView;
use crate::state::AppState;

/// Number of conversations shown on the dashboard.
pub const RECENT_CONVERSATIONS: i64 = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub user: UserView,
    pub subscription: Option<SubscriptionView>,
    pub conversation_count: i64,
    pub recent_conversations: Vec<ConversationView>,
}

/// The caller's dashboard.
pub async fn dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Dashboard>> {
    let pool = state.db.pool();

    let account = user::get_user(pool, &user.user_id).await?;
    let current = subscription::get_for_user(pool, &user.user_id).await?;
    let conversation_count = conversation::count_conversations(pool, &user.user_id).await?;
    let recent =
        conversation::list_recent_conversations(pool, &user.user_id, RECENT_CONVERSATIONS).await?;

    Ok(Json(Dashboard {
        user: account.into(),
        subscription: current.map(Into::into),
        conversation_count,
        recent_conversations: recent.into_iter().map(Into::into).collect(),
    }))
}

/// Today's flashcards and quizzes, generated from the caller's interests.
///
/// Answers 400 until the caller has saved at least one interest.
pub async fn daily(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<DailyContent>> {
    Ok(Json(state.tutor.daily_content(&user.user_id).await?))
}
