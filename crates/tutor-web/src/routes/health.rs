//! Health check and home.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
}

/// Liveness check. Public, and never touches the database.
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

#[derive(Serialize)]
pub struct Home {
    pub service: &'static str,
    pub version: &'static str,
}

/// Landing endpoint; also the sign-in redirect target.
pub async fn home() -> Json<Home> {
    Json(Home {
        service: "tutor",
        version: env!("CARGO_PKG_VERSION"),
    })
}
