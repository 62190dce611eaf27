//! Billing history storage.

use sqlx::{SqliteExecutor, SqlitePool};

use crate::models::{BillingHistoryEntry, NewBillingEntry};
use crate::Result;

const ENTRY_COLUMNS: &str = "id, user_id, subscription_id, amount, currency, status, \
    external_transaction_id, external_reference, payment_date, refund_amount, refund_date";

/// Append a successful payment to the billing history.
pub async fn insert_entry<'e>(
    executor: impl SqliteExecutor<'e>,
    entry: &NewBillingEntry,
) -> Result<BillingHistoryEntry> {
    let query = format!(
        r#"
        INSERT INTO billing_history
            (user_id, subscription_id, amount, currency, status,
             external_transaction_id, external_reference, payment_date)
        VALUES (?, ?, ?, ?, 'success', ?, ?, datetime('now'))
        RETURNING {ENTRY_COLUMNS}
        "#
    );

    let record = sqlx::query_as::<_, BillingHistoryEntry>(&query)
        .bind(&entry.user_id)
        .bind(&entry.subscription_id)
        .bind(entry.amount)
        .bind(&entry.currency)
        .bind(&entry.external_transaction_id)
        .bind(&entry.external_reference)
        .fetch_one(executor)
        .await?;

    Ok(record)
}

/// Mark the entry for a gateway transaction as refunded.
///
/// Returns the number of entries updated; zero when no entry matches.
pub async fn mark_refunded(
    pool: &SqlitePool,
    external_transaction_id: &str,
    refund_amount: f64,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE billing_history
        SET status = 'refunded', refund_amount = ?, refund_date = datetime('now')
        WHERE external_transaction_id = ?
        "#,
    )
    .bind(refund_amount)
    .bind(external_transaction_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Find the entry for a gateway transaction.
pub async fn find_by_transaction(
    pool: &SqlitePool,
    external_transaction_id: &str,
) -> Result<Option<BillingHistoryEntry>> {
    let query = format!(
        "SELECT {ENTRY_COLUMNS} FROM billing_history WHERE external_transaction_id = ? LIMIT 1"
    );

    let record = sqlx::query_as::<_, BillingHistoryEntry>(&query)
        .bind(external_transaction_id)
        .fetch_optional(pool)
        .await?;

    Ok(record)
}

/// List a user's billing history, newest first.
pub async fn list_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<BillingHistoryEntry>> {
    let query = format!(
        r#"
        SELECT {ENTRY_COLUMNS}
        FROM billing_history
        WHERE user_id = ?
        ORDER BY payment_date DESC, id DESC
        "#
    );

    let records = sqlx::query_as::<_, BillingHistoryEntry>(&query)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(records)
}
