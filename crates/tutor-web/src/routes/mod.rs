//! Route handlers.

pub mod analogies;
pub mod billing;
pub mod chat;
pub mod conversations;
pub mod dashboard;
pub mod health;
pub mod payment;
pub mod profile;
pub mod webhook;

use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::guard::require_session;
use crate::state::AppState;

/// Build the router with all routes behind the session guard.
pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(health::home))
        .route("/health", get(health::health))
        .route(
            "/api/webhook/paystack",
            post(webhook::paystack_webhook).fallback(webhook::method_not_allowed),
        )
        .route("/api/payment/verify", get(payment::verify_payment))
        .route("/payment/verify", get(payment::verify_payment))
        // Session required
        .route(
            "/api/conversations",
            get(conversations::list).post(conversations::create),
        )
        .route("/api/conversations/:id", delete(conversations::delete))
        .route("/api/chat", post(chat::send))
        .route("/api/chat/:conversation_id", get(chat::transcript))
        .route("/api/analogies", post(analogies::generate))
        .route(
            "/api/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/api/billing", get(billing::overview))
        .route("/api/billing/checkout", post(billing::checkout))
        .route("/api/billing/cancel", post(billing::cancel))
        .route("/api/billing/refund", post(billing::refund))
        .route("/api/dashboard", get(dashboard::dashboard))
        .route("/api/dashboard/daily", get(dashboard::daily))
        .fallback(not_found)
        .layer(from_fn_with_state(state.clone(), require_session))
        .with_state(state)
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({"error": "Not found"})))
}
