//! Subscription storage, one row per user.

use sqlx::{SqliteExecutor, SqlitePool};
use uuid::Uuid;

use crate::models::{
    BillingHistoryEntry, NewBillingEntry, Subscription, SubscriptionStatus, SubscriptionUpsert,
};
use crate::{billing, Result};

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, external_customer_id, external_subscription_id, \
    plan_type, status, current_period_start, current_period_end, created_at, updated_at";

/// Create or reactivate the subscription for `upsert.user_id`.
///
/// The row is keyed by user id. A missing gateway subscription code keeps
/// the previously stored one.
pub async fn upsert_active<'e>(
    executor: impl SqliteExecutor<'e>,
    upsert: &SubscriptionUpsert,
) -> Result<Subscription> {
    let query = format!(
        r#"
        INSERT INTO subscriptions
            (id, user_id, external_customer_id, external_subscription_id, plan_type, status,
             current_period_start, current_period_end)
        VALUES (?, ?, ?, ?, ?, 'active', ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            external_customer_id = excluded.external_customer_id,
            external_subscription_id = COALESCE(
                excluded.external_subscription_id,
                subscriptions.external_subscription_id
            ),
            plan_type = excluded.plan_type,
            status = 'active',
            current_period_start = excluded.current_period_start,
            current_period_end = excluded.current_period_end,
            updated_at = datetime('now')
        RETURNING {SUBSCRIPTION_COLUMNS}
        "#
    );

    let subscription = sqlx::query_as::<_, Subscription>(&query)
        .bind(Uuid::new_v4().to_string())
        .bind(&upsert.user_id)
        .bind(&upsert.external_customer_id)
        .bind(&upsert.external_subscription_id)
        .bind(upsert.plan_type)
        .bind(&upsert.current_period_start)
        .bind(&upsert.current_period_end)
        .fetch_one(executor)
        .await?;

    Ok(subscription)
}

/// Activate a subscription and record the charge that paid for it.
///
/// Both writes, plus the user's plan tier, commit together. The billing
/// entry's `subscription_id` is always the upserted subscription's id.
pub async fn record_charge(
    pool: &SqlitePool,
    upsert: &SubscriptionUpsert,
    charge: &NewBillingEntry,
) -> Result<(Subscription, BillingHistoryEntry)> {
    let mut tx = pool.begin().await?;

    let subscription = upsert_active(&mut *tx, upsert).await?;

    let entry = NewBillingEntry {
        subscription_id: Some(subscription.id.clone()),
        ..charge.clone()
    };
    let billing_entry = billing::insert_entry(&mut *tx, &entry).await?;

    sqlx::query(
        r#"
        UPDATE users
        SET subscription_status = ?, subscription_end_date = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(upsert.plan_type)
    .bind(&upsert.current_period_end)
    .bind(&upsert.user_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((subscription, billing_entry))
}

/// Get the subscription for a user.
pub async fn get_for_user(pool: &SqlitePool, user_id: &str) -> Result<Option<Subscription>> {
    let query = format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = ?");

    let subscription = sqlx::query_as::<_, Subscription>(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(subscription)
}

/// Find a subscription by its gateway subscription code.
pub async fn find_by_external_subscription(
    pool: &SqlitePool,
    external_subscription_id: &str,
) -> Result<Option<Subscription>> {
    let query = format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE external_subscription_id = ? LIMIT 1"
    );

    let subscription = sqlx::query_as::<_, Subscription>(&query)
        .bind(external_subscription_id)
        .fetch_optional(pool)
        .await?;

    Ok(subscription)
}

/// Find a subscription by its gateway customer code.
pub async fn find_by_external_customer(
    pool: &SqlitePool,
    external_customer_id: &str,
) -> Result<Option<Subscription>> {
    let query = format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE external_customer_id = ? LIMIT 1"
    );

    let subscription = sqlx::query_as::<_, Subscription>(&query)
        .bind(external_customer_id)
        .fetch_optional(pool)
        .await?;

    Ok(subscription)
}

/// Set the status of the subscription with a gateway subscription code.
///
/// With `close_period` the current period also ends now. Returns the number
/// of rows updated; zero when no subscription matches.
pub async fn set_status_by_external(
    pool: &SqlitePool,
    external_subscription_id: &str,
    status: SubscriptionStatus,
    close_period: bool,
) -> Result<u64> {
    let query = if close_period {
        r#"
        UPDATE subscriptions
        SET status = ?, current_period_end = datetime('now'), updated_at = datetime('now')
        WHERE external_subscription_id = ?
        "#
    } else {
        r#"
        UPDATE subscriptions
        SET status = ?, updated_at = datetime('now')
        WHERE external_subscription_id = ?
        "#
    };

    let result = sqlx::query(query)
        .bind(status)
        .bind(external_subscription_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
