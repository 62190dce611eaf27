//! Application state shared across handlers.

use std::sync::Arc;

use database::Database;
use ledger::{Ledger, PaymentGateway};
use tutor::Tutor;

use crate::config::Config;
use crate::guard::{DatabaseSessions, GuardPolicy, SessionStore};

/// Payment gateway access, present only when payment secrets are configured.
#[derive(Clone)]
pub struct Payments {
    /// Outbound gateway client.
    pub gateway: Arc<dyn PaymentGateway>,
    /// Key webhook signatures are checked against.
    pub webhook_secret: String,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Chat and analogy generation.
    pub tutor: Arc<Tutor>,
    /// Subscription ledger.
    pub ledger: Arc<Ledger>,
    /// Payment gateway, if configured.
    pub payments: Option<Payments>,
    /// Session resolution for the guard.
    pub sessions: Arc<dyn SessionStore>,
    /// Public-path policy for the guard.
    pub policy: Arc<GuardPolicy>,
    /// Server configuration.
    pub config: Arc<Config>,
}

impl AppState {
    /// Create application state with database-backed sessions and no payments.
    pub fn new(db: Database, tutor: Tutor, ledger: Ledger, config: Config) -> Self {
        Self {
            sessions: Arc::new(DatabaseSessions::new(db.clone())),
            db,
            tutor: Arc::new(tutor),
            ledger: Arc::new(ledger),
            payments: None,
            policy: Arc::new(GuardPolicy::default()),
            config: Arc::new(config),
        }
    }

    /// Enable payment endpoints.
    pub fn with_payments(
        mut self,
        gateway: Arc<dyn PaymentGateway>,
        webhook_secret: impl Into<String>,
    ) -> Self {
        self.payments = Some(Payments {
            gateway,
            webhook_secret: webhook_secret.into(),
        });
        self
    }

    /// Replace the session store.
    pub fn with_sessions(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    /// Payment access, or the error payment endpoints return without it.
    pub fn payments(&self) -> crate::Result<&Payments> {
        self.payments
            .as_ref()
            .ok_or(crate::ApiError::PaymentsNotConfigured)
    }
}
