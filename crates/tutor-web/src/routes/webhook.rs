//! Payment-gateway webhook.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use ledger::SIGNATURE_HEADER;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::Result;
use crate::state::AppState;

/// Receive a signed event from the payment gateway.
///
/// Without payment secrets the delivery is acknowledged and dropped.
pub async fn paystack_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    let Some(payments) = state.payments.as_ref() else {
        warn!("Webhook received but payments are not configured, ignoring");
        return Ok(Json(json!({"received": true})));
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let outcome = state
        .ledger
        .handle_webhook(&body, signature, &payments.webhook_secret)
        .await?;
    debug!(outcome = ?outcome, "Webhook handled");

    Ok(Json(json!({"received": true})))
}

/// Any method other than POST.
pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({"error": "Method not allowed"})),
    )
}
