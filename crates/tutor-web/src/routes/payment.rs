//! Payment verification after checkout.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use ledger::Outcome;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub reference: Option<String>,
}

/// Confirm a checkout with the gateway and apply the purchased plan.
pub async fn verify_payment(
    State(state): State<AppState>,
    query: std::result::Result<Query<VerifyQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(query) = query?;
    let reference = query
        .reference
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ApiError::InvalidInput("reference is required".to_string()))?;

    let payments = state.payments()?;
    let transaction = payments.gateway.verify_transaction(reference).await?;
    let outcome = state.ledger.confirm_payment(&transaction).await?;

    info!(reference = %reference, status = %transaction.status, "Payment verified");

    Ok(Json(json!({
        "success": outcome == Outcome::Applied,
        "status": transaction.status,
    })))
}
