//! User CRUD operations.

use sqlx::{SqliteExecutor, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::{PlanType, User};
use crate::validation::{validate_email, validate_full_name};

const USER_COLUMNS: &str =
    "id, email, full_name, subscription_status, subscription_end_date, created_at, updated_at";

/// Create a new user on the free plan.
pub async fn create_user(pool: &SqlitePool, id: &str, email: &str, full_name: &str) -> Result<User> {
    validate_email(email)?;
    validate_full_name(full_name)?;

    let query = format!(
        r#"
        INSERT INTO users (id, email, full_name)
        VALUES (?, ?, ?)
        RETURNING {USER_COLUMNS}
        "#
    );

    sqlx::query_as::<_, User>(&query)
        .bind(id)
        .bind(email.trim())
        .bind(full_name.trim())
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return DatabaseError::AlreadyExists {
                        entity: "User",
                        id: id.to_string(),
                    };
                }
            }
            DatabaseError::Sqlx(e)
        })
}

/// Get a user by ID.
pub async fn get_user(pool: &SqlitePool, id: &str) -> Result<User> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");

    sqlx::query_as::<_, User>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "User",
            id: id.to_string(),
        })
}

/// Find a user by email address.
pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let query = format!(
        "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower(?) ORDER BY created_at LIMIT 1"
    );

    let user = sqlx::query_as::<_, User>(&query)
        .bind(email.trim())
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Update a user's display name.
pub async fn update_full_name<'e>(
    executor: impl SqliteExecutor<'e>,
    id: &str,
    full_name: &str,
) -> Result<()> {
    validate_full_name(full_name)?;

    let result = sqlx::query(
        r#"
        UPDATE users
        SET full_name = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(full_name.trim())
    .bind(id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "User",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Record a user's current plan tier.
///
/// Returns false when no such user exists.
pub async fn set_subscription_status(
    pool: &SqlitePool,
    id: &str,
    plan: PlanType,
    end_date: Option<&str>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET subscription_status = ?, subscription_end_date = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(plan)
    .bind(end_date)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
