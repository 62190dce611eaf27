//! AI tutor web server.
//!
//! Serves the JSON API for chat, profiles, billing, and dashboard, and
//! receives payment-gateway webhooks.

use std::sync::Arc;

use database::Database;
use ledger::{Ledger, PaystackClient, PaystackConfig};
use openai_brain::{OpenAiBrain, OpenAiBrainConfig, OpenAiImageTool};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tutor::{Tutor, TutorConfig};
use tutor_web::{app, AppState, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting tutor web server");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // Completion backend
    let brain_config = OpenAiBrainConfig::from_env()?;
    let tutor_config = TutorConfig {
        enable_images: brain_config.enable_images,
        ..TutorConfig::default()
    };
    let brain = OpenAiBrain::new(brain_config.clone())?;
    let mut tutor = Tutor::new(db.clone(), Arc::new(brain), tutor_config);
    if brain_config.enable_images {
        tutor = tutor.with_image_tool(Arc::new(OpenAiImageTool::new(brain_config)?));
    }

    // Payments
    let paystack = PaystackConfig::from_env();
    let plans = paystack
        .as_ref()
        .map(PaystackConfig::plan_catalog)
        .unwrap_or_default();
    let ledger = Ledger::new(db.clone(), plans);

    // Build application state
    let mut state = AppState::new(db, tutor, ledger, config.clone());
    match paystack {
        Some(paystack) => {
            let secret = paystack.webhook_secret.clone();
            state = state.with_payments(Arc::new(PaystackClient::new(paystack)?), secret);
        }
        None => warn!("PAYSTACK_SECRET_KEY not set, payment endpoints disabled"),
    }

    // Start server
    let app = app(state);
    info!(addr = %config.addr, "Tutor web server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
