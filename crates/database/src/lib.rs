//! SQLite store for tutor users, profiles, sessions, conversations and billing.
//!
//! Each module exposes free async functions taking the pool. Row ownership
//! is checked in SQL: a row belonging to another user reads as
//! [`DatabaseError::NotFound`].

pub mod billing;
pub mod conversation;
pub mod error;
pub mod message;
pub mod models;
pub mod session;
pub mod subscription;
pub mod time;
pub mod user;
pub mod user_profile;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use message::AppendedMessage;
pub use models::{
    BillingHistoryEntry, BillingStatus, Conversation, ConversationMessage, NewBillingEntry,
    PlanType, Role, Session, Subscription, SubscriptionStatus, SubscriptionUpsert,
    TeachingPreferences, User, UserProfile,
};
pub use validation::ValidationError;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

const POOL_SIZE: u32 = 20;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared handle to the SQLite pool. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database at `url`, e.g.
    /// `sqlite:tutor.db?mode=rwc` or `sqlite::memory:`. Foreign keys are
    /// enforced so conversation deletes cascade to messages.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(POOL_SIZE)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database: {}", url);
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
