//! HTTP surface of the AI tutor.
//!
//! Every request passes the session guard in [`guard`] before reaching a
//! handler. Payment-gateway callbacks are public and go straight to the
//! subscription ledger; everything under `/api` except those requires a
//! session.

pub mod config;
pub mod error;
pub mod guard;
pub mod routes;
pub mod state;

pub use config::{Config, ConfigError};
pub use error::{ApiError, Result};
pub use guard::{CurrentUser, DatabaseSessions, GuardDecision, GuardPolicy, SessionStore};
pub use routes::app;
pub use state::{AppState, Payments};
