//! Conversation message log.
//!
//! Messages are append-only and ordered by `(created_at, id)`; the
//! autoincrement id keeps messages written in the same second in insertion
//! order. Callers are expected to have checked conversation ownership with
//! [`crate::conversation::get_conversation`] before reading or writing.

use sqlx::SqlitePool;

use crate::conversation::derive_title;
use crate::error::{DatabaseError, Result};
use crate::models::{ConversationMessage, Role};

/// Message count at which the conversation title is derived.
pub const TITLE_MESSAGE_COUNT: i64 = 2;

/// A stored message plus the title it caused, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendedMessage {
    pub message: ConversationMessage,
    /// Set when this append brought the conversation to its first exchange.
    pub derived_title: Option<String>,
}

/// Append a message to a conversation.
///
/// Also bumps the conversation's `updated_at`. When the append brings the
/// conversation to exactly [`TITLE_MESSAGE_COUNT`] messages, the title is
/// set from the first user message. Later appends never touch the title.
pub async fn append_message(
    pool: &SqlitePool,
    conversation_id: &str,
    role: Role,
    content: &str,
    image_url: Option<&str>,
) -> Result<AppendedMessage> {
    let mut tx = pool.begin().await?;

    let message = sqlx::query_as::<_, ConversationMessage>(
        r#"
        INSERT INTO conversation_messages (conversation_id, role, content, image_url)
        VALUES (?, ?, ?, ?)
        RETURNING id, conversation_id, role, content, image_url, created_at
        "#,
    )
    .bind(conversation_id)
    .bind(role)
    .bind(content)
    .bind(image_url)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_foreign_key_violation() {
                return DatabaseError::NotFound {
                    entity: "Conversation",
                    id: conversation_id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    sqlx::query(
        r#"
        UPDATE conversations
        SET updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(conversation_id)
    .execute(&mut *tx)
    .await?;

    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM conversation_messages WHERE conversation_id = ?
        "#,
    )
    .bind(conversation_id)
    .fetch_one(&mut *tx)
    .await?;

    let mut derived_title = None;
    if count == TITLE_MESSAGE_COUNT {
        let first_user = sqlx::query_scalar::<_, String>(
            r#"
            SELECT content
            FROM conversation_messages
            WHERE conversation_id = ? AND role = 'user'
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(conversation_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(text) = first_user {
            let title = derive_title(&text);
            sqlx::query("UPDATE conversations SET title = ? WHERE id = ?")
                .bind(&title)
                .bind(conversation_id)
                .execute(&mut *tx)
                .await?;
            derived_title = Some(title);
        }
    }

    tx.commit().await?;

    Ok(AppendedMessage {
        message,
        derived_title,
    })
}

/// List all messages of a conversation in order.
pub async fn list_messages(
    pool: &SqlitePool,
    conversation_id: &str,
) -> Result<Vec<ConversationMessage>> {
    let messages = sqlx::query_as::<_, ConversationMessage>(
        r#"
        SELECT id, conversation_id, role, content, image_url, created_at
        FROM conversation_messages
        WHERE conversation_id = ?
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}

/// List the `limit` most recent messages of a conversation, oldest first.
pub async fn list_recent_messages(
    pool: &SqlitePool,
    conversation_id: &str,
    limit: i64,
) -> Result<Vec<ConversationMessage>> {
    let messages = sqlx::query_as::<_, ConversationMessage>(
        r#"
        SELECT id, conversation_id, role, content, image_url, created_at
        FROM (
            SELECT id, conversation_id, role, content, image_url, created_at
            FROM conversation_messages
            WHERE conversation_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
        )
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(conversation_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}

/// Count the messages in a conversation.
pub async fn count_messages(pool: &SqlitePool, conversation_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM conversation_messages WHERE conversation_id = ?
        "#,
    )
    .bind(conversation_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{conversation, user, Database};

    async fn test_db() -> (Database, String) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        user::create_user(db.pool(), "alice", "alice@example.com", "Alice")
            .await
            .unwrap();
        let conv = conversation::create_conversation(db.pool(), "alice", "New Chat", None)
            .await
            .unwrap();
        (db, conv.id)
    }

    #[tokio::test]
    async fn test_messages_keep_insertion_order() {
        let (db, conv) = test_db().await;
        for i in 0..5 {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            append_message(db.pool(), &conv, role, &format!("m{}", i), None)
                .await
                .unwrap();
        }

        let messages = list_messages(db.pool(), &conv).await.unwrap();
        let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m0", "m1", "m2", "m3", "m4"]);
        assert!(messages.windows(2).all(|w| w[0].created_at <= w[1].created_at));
        assert!(messages.iter().all(|m| m.conversation_id == conv));
    }

    #[tokio::test]
    async fn test_title_derived_on_second_message_only() {
        let (db, conv) = test_db().await;
        let question = "Can you explain how a four-stroke combustion engine actually works?";

        let first = append_message(db.pool(), &conv, Role::User, question, None)
            .await
            .unwrap();
        assert!(first.derived_title.is_none());

        let second = append_message(db.pool(), &conv, Role::Assistant, "Sure!", None)
            .await
            .unwrap();
        let expected = format!("{}...", &question[..50]);
        assert_eq!(second.derived_title.as_deref(), Some(expected.as_str()));

        append_message(db.pool(), &conv, Role::User, "A totally different question", None)
            .await
            .unwrap();
        let fourth = append_message(db.pool(), &conv, Role::Assistant, "Answer", None)
            .await
            .unwrap();
        assert!(fourth.derived_title.is_none());

        let stored = conversation::get_conversation(db.pool(), &conv, "alice")
            .await
            .unwrap();
        assert_eq!(stored.title, expected);
    }

    #[tokio::test]
    async fn test_append_to_missing_conversation() {
        let (db, _) = test_db().await;
        let result = append_message(db.pool(), "missing", Role::User, "hi", None).await;
        assert!(matches!(
            result,
            Err(DatabaseError::NotFound { entity: "Conversation", .. })
        ));
    }

    #[tokio::test]
    async fn test_list_recent_messages() {
        let (db, conv) = test_db().await;
        for i in 0..12 {
            append_message(db.pool(), &conv, Role::User, &format!("m{}", i), None)
                .await
                .unwrap();
        }

        let recent = list_recent_messages(db.pool(), &conv, 10).await.unwrap();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent.first().unwrap().content, "m2");
        assert_eq!(recent.last().unwrap().content, "m11");
    }

    #[tokio::test]
    async fn test_image_url_is_stored() {
        let (db, conv) = test_db().await;
        let appended = append_message(
            db.pool(),
            &conv,
            Role::Assistant,
            "Here is a cat",
            Some("https://img.example/cat.png"),
        )
        .await
        .unwrap();
        assert_eq!(
            appended.message.image_url.as_deref(),
            Some("https://img.example/cat.png")
        );
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_all_visible() {
        let (db, conv) = test_db().await;

        let mut handles = Vec::new();
        for i in 0..8 {
            let db = db.clone();
            let conv = conv.clone();
            handles.push(tokio::spawn(async move {
                append_message(db.pool(), &conv, Role::User, &format!("m{}", i), None)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let messages = list_messages(db.pool(), &conv).await.unwrap();
        assert_eq!(messages.len(), 8);
        assert!(messages.iter().all(|m| m.conversation_id == conv));
        assert!(messages.windows(2).all(|w| w[0].id < w[1].id));
        assert_eq!(count_messages(db.pool(), &conv).await.unwrap(), 8);
    }
}
