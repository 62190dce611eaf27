//! Conversation CRUD operations, always scoped to the owning user.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::Conversation;

/// Maximum number of characters kept when deriving a title.
pub const TITLE_MAX_CHARS: usize = 50;

const CONVERSATION_COLUMNS: &str = "id, user_id, title, topic, created_at, updated_at";

/// Derive a conversation title from the first user message.
///
/// Keeps the first 50 characters and appends `...` when the text is longer.
pub fn derive_title(text: &str) -> String {
    let text = text.trim();
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Create a conversation owned by `user_id`.
pub async fn create_conversation(
    pool: &SqlitePool,
    user_id: &str,
    title: &str,
    topic: Option<&str>,
) -> Result<Conversation> {
    let id = Uuid::new_v4().to_string();
    let topic = topic.map(str::trim).filter(|t| !t.is_empty());
    let query = format!(
        r#"
        INSERT INTO conversations (id, user_id, title, topic)
        VALUES (?, ?, ?, ?)
        RETURNING {CONVERSATION_COLUMNS}
        "#
    );

    let conversation = sqlx::query_as::<_, Conversation>(&query)
        .bind(&id)
        .bind(user_id)
        .bind(title)
        .bind(topic)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_foreign_key_violation() {
                    return DatabaseError::NotFound {
                        entity: "User",
                        id: user_id.to_string(),
                    };
                }
            }
            DatabaseError::Sqlx(e)
        })?;

    tracing::debug!(conversation_id = %conversation.id, user_id, "Created conversation");
    Ok(conversation)
}

/// List a user's conversations, most recently active first.
pub async fn list_conversations(pool: &SqlitePool, user_id: &str) -> Result<Vec<Conversation>> {
    let query = format!(
        r#"
        SELECT {CONVERSATION_COLUMNS}
        FROM conversations
        WHERE user_id = ?
        ORDER BY updated_at DESC, created_at DESC
        "#
    );

    let conversations = sqlx::query_as::<_, Conversation>(&query)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(conversations)
}

/// List a user's `limit` most recently active conversations.
pub async fn list_recent_conversations(
    pool: &SqlitePool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<Conversation>> {
    let query = format!(
        r#"
        SELECT {CONVERSATION_COLUMNS}
        FROM conversations
        WHERE user_id = ?
        ORDER BY updated_at DESC, created_at DESC
        LIMIT ?
        "#
    );

    let conversations = sqlx::query_as::<_, Conversation>(&query)
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(conversations)
}

/// Get a conversation by id, if and only if it belongs to `user_id`.
pub async fn get_conversation(
    pool: &SqlitePool,
    conversation_id: &str,
    user_id: &str,
) -> Result<Conversation> {
    let query = format!(
        r#"
        SELECT {CONVERSATION_COLUMNS}
        FROM conversations
        WHERE id = ? AND user_id = ?
        "#
    );

    sqlx::query_as::<_, Conversation>(&query)
        .bind(conversation_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Conversation",
            id: conversation_id.to_string(),
        })
}

/// Delete a conversation and its messages.
pub async fn delete_conversation(
    pool: &SqlitePool,
    conversation_id: &str,
    user_id: &str,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM conversations
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(conversation_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Conversation",
            id: conversation_id.to_string(),
        });
    }

    Ok(())
}

/// Count a user's conversations.
pub async fn count_conversations(pool: &SqlitePool, user_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM conversations WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
