//! Billing overview, checkout, cancellation, and refund requests.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use database::models::{BillingHistoryEntry, BillingStatus, Subscription};
use database::{billing, subscription, user, PlanType, SubscriptionStatus};
use ledger::{Checkout, Plan, WebhookEvent};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::error::{ApiError, Result};
use crate::guard::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    pub id: String,
    pub plan_type: PlanType,
    pub status: SubscriptionStatus,
    pub current_period_start: String,
    pub current_period_end: String,
}

impl From<Subscription> for SubscriptionView {
    fn from(s: Subscription) -> Self {
        Self {
            id: s.id,
            plan_type: s.plan_type,
            status: s.status,
            current_period_start: s.current_period_start,
            current_period_end: s.current_period_end,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingEntryView {
    pub id: i64,
    pub amount: f64,
    pub currency: String,
    pub status: BillingStatus,
    pub transaction_id: Option<String>,
    pub reference: Option<String>,
    pub payment_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_date: Option<String>,
}

impl From<BillingHistoryEntry> for BillingEntryView {
    fn from(e: BillingHistoryEntry) -> Self {
        Self {
            id: e.id,
            amount: e.amount,
            currency: e.currency,
            status: e.status,
            transaction_id: e.external_transaction_id,
            reference: e.external_reference,
            payment_date: e.payment_date,
            refund_amount: e.refund_amount,
            refund_date: e.refund_date,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingResponse {
    pub current_plan: PlanType,
    pub subscription: Option<SubscriptionView>,
    pub history: Vec<BillingEntryView>,
    pub plans: Vec<Plan>,
}

/// The caller's plan, subscription, payment history, and the plan catalog.
pub async fn overview(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<BillingResponse>> {
    let pool = state.db.pool();
    let account = user::get_user(pool, &user.user_id).await?;
    let current = subscription::get_for_user(pool, &user.user_id).await?;
    let history = billing::list_for_user(pool, &user.user_id).await?;

    Ok(Json(BillingResponse {
        current_plan: account.subscription_status,
        subscription: current.map(Into::into),
        history: history.into_iter().map(Into::into).collect(),
        plans: state.ledger.plans().all().to_vec(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub plan_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub authorization_url: String,
    pub reference: String,
}

impl From<Checkout> for CheckoutResponse {
    fn from(c: Checkout) -> Self {
        Self {
            authorization_url: c.authorization_url,
            reference: c.reference,
        }
    }
}

/// Start a checkout for a paid plan.
pub async fn checkout(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: std::result::Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutResponse>> {
    let Json(request) = payload?;
    let plan = state.ledger.plans().from_id(&request.plan_id);
    if plan.is_free() {
        return Err(ApiError::InvalidInput(format!(
            "plan {:?} cannot be purchased",
            request.plan_id
        )));
    }

    let payments = state.payments()?;
    let account = user::get_user(state.db.pool(), &user.user_id).await?;

    let metadata = json!({"userId": account.id, "planType": plan.id.as_str()});
    let checkout = payments
        .gateway
        .initialize_transaction(
            &account.email,
            plan.price_minor,
            metadata,
            &state.config.payment_callback_url(),
        )
        .await?;

    info!(user_id = %user.user_id, plan = plan.id.as_str(), "Checkout started");
    Ok(Json(checkout.into()))
}

/// Cancel the caller's recurring subscription.
///
/// The gateway is told first; the local row is closed the same way a
/// `subscription.disable` webhook would close it.
pub async fn cancel(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<serde_json::Value>> {
    let payments = state.payments()?;
    let code = subscription::get_for_user(state.db.pool(), &user.user_id)
        .await?
        .filter(|s| s.status != SubscriptionStatus::Cancelled)
        .and_then(|s| s.external_subscription_id)
        .ok_or_else(|| ApiError::NotFound("Subscription".to_string()))?;

    payments.gateway.disable_subscription(&code).await?;
    state
        .ledger
        .apply(WebhookEvent::SubscriptionDisable {
            subscription_code: code,
        })
        .await?;

    info!(user_id = %user.user_id, "Subscription cancelled");
    Ok(Json(json!({"success": true})))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    #[serde(default)]
    pub transaction_id: String,
    /// Major units; a full refund when absent.
    pub amount: Option<f64>,
}

/// Ask the gateway to refund one of the caller's payments.
///
/// Only the request is made here; the entry is marked refunded when the
/// gateway's `refund.processed` webhook arrives.
pub async fn refund(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: std::result::Result<Json<RefundRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>> {
    let Json(request) = payload?;
    let transaction_id = request.transaction_id.trim();
    if transaction_id.is_empty() {
        return Err(ApiError::InvalidInput("transactionId is required".to_string()));
    }

    let payments = state.payments()?;
    let entry = billing::find_by_transaction(state.db.pool(), transaction_id)
        .await?
        .filter(|e| e.user_id == user.user_id)
        .ok_or_else(|| ApiError::NotFound("Transaction".to_string()))?;

    if entry.status == BillingStatus::Refunded {
        return Err(ApiError::InvalidInput(
            "transaction is already refunded".to_string(),
        ));
    }
    let amount_minor = match request.amount {
        Some(amount) if amount <= 0.0 || amount > entry.amount => {
            return Err(ApiError::InvalidInput(format!(
                "refund amount must be between 0 and {}",
                entry.amount
            )));
        }
        Some(amount) => Some((amount * 100.0).round() as i64),
        None => None,
    };

    payments
        .gateway
        .refund_transaction(transaction_id, amount_minor)
        .await?;

    info!(user_id = %user.user_id, transaction = %transaction_id, "Refund requested");
    Ok(Json(json!({"success": true})))
}
