//! Identity provider session storage.

use std::time::Duration;

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::Session;
use crate::Result;

/// Issue a session for a user that expires after `ttl`.
pub async fn create_session(pool: &SqlitePool, user_id: &str, ttl: Duration) -> Result<Session> {
    let token = Uuid::new_v4().simple().to_string();
    let modifier = format!("+{} seconds", ttl.as_secs());

    let session = sqlx::query_as::<_, Session>(
        r#"
        INSERT INTO sessions (token, user_id, expires_at)
        VALUES (?, ?, datetime('now', ?))
        RETURNING token, user_id, expires_at, created_at
        "#,
    )
    .bind(&token)
    .bind(user_id)
    .bind(modifier)
    .fetch_one(pool)
    .await?;

    Ok(session)
}

/// Resolve a session token. Expired sessions resolve to `None`.
pub async fn resolve_session(pool: &SqlitePool, token: &str) -> Result<Option<Session>> {
    let session = sqlx::query_as::<_, Session>(
        r#"
        SELECT token, user_id, expires_at, created_at
        FROM sessions
        WHERE token = ? AND expires_at > datetime('now')
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

/// Delete expired sessions.
pub async fn prune_expired(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM sessions
        WHERE expires_at <= datetime('now')
        "#,
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
