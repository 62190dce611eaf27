//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// Paid-plan tier recorded on users and subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PlanType {
    #[default]
    Free,
    Basic,
    Pro,
}

impl PlanType {
    /// Parse a plan id, falling back to `Free` for anything unrecognized.
    pub fn from_id(id: &str) -> Self {
        match id.trim().to_lowercase().as_str() {
            "basic" => PlanType::Basic,
            "pro" => PlanType::Pro,
            _ => PlanType::Free,
        }
    }

    /// The stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Free => "free",
            PlanType::Basic => "basic",
            PlanType::Pro => "pro",
        }
    }
}

/// Lifecycle state of a subscription row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Expiring,
}

/// State of a billing history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum BillingStatus {
    Success,
    Refunded,
}

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// The role name used by completion APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    /// Parse a role name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            "system" => Some(Role::System),
            _ => None,
        }
    }
}

/// A user, identified by the id issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Identity provider user id.
    pub id: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Current plan tier.
    pub subscription_status: PlanType,
    /// When the paid plan lapses, if any.
    pub subscription_end_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Teaching preferences as submitted from the profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeachingPreferences {
    /// Tone id (e.g. "friendly") or "custom".
    pub teaching_tone: Option<String>,
    /// Free-text tone used when `teaching_tone` is "custom".
    pub custom_tone: Option<String>,
    /// Interest ids (e.g. "cars", "music").
    #[serde(default)]
    pub interests: Vec<String>,
    /// Free-text interest.
    pub custom_interest: Option<String>,
}

/// Stored teaching preferences for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub user_id: String,
    pub teaching_tone: Option<String>,
    pub custom_tone: Option<String>,
    /// Interest ids, stored as a JSON array.
    pub interests: Json<Vec<String>>,
    pub custom_interest: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl UserProfile {
    /// The preference fields without bookkeeping columns.
    pub fn preferences(&self) -> TeachingPreferences {
        TeachingPreferences {
            teaching_tone: self.teaching_tone.clone(),
            custom_tone: self.custom_tone.clone(),
            interests: self.interests.0.clone(),
            custom_interest: self.custom_interest.clone(),
        }
    }
}

/// A login session issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Opaque bearer credential.
    pub token: String,
    pub user_id: String,
    pub expires_at: String,
    pub created_at: String,
}

/// A titled thread of messages owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    pub id: String,
    pub user_id: String,
    pub title: String,
    /// Optional subject the tutor should focus on.
    pub topic: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// One entry in a conversation's append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ConversationMessage {
    /// Monotonic sequence number.
    pub id: i64,
    pub conversation_id: String,
    pub role: Role,
    pub content: String,
    /// Generated image attached to the message, if any.
    pub image_url: Option<String>,
    pub created_at: String,
}

/// A user's paid-plan subscription (at most one per user).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    /// Payment gateway customer code.
    pub external_customer_id: String,
    /// Payment gateway subscription code.
    pub external_subscription_id: Option<String>,
    pub plan_type: PlanType,
    pub status: SubscriptionStatus,
    pub current_period_start: String,
    pub current_period_end: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields written when a successful charge activates a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionUpsert {
    pub user_id: String,
    pub external_customer_id: String,
    pub external_subscription_id: Option<String>,
    pub plan_type: PlanType,
    pub current_period_start: String,
    pub current_period_end: String,
}

/// A payment or refund record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct BillingHistoryEntry {
    pub id: i64,
    pub user_id: String,
    pub subscription_id: Option<String>,
    /// Amount in major currency units.
    pub amount: f64,
    pub currency: String,
    pub status: BillingStatus,
    pub external_transaction_id: Option<String>,
    pub external_reference: Option<String>,
    pub payment_date: String,
    pub refund_amount: Option<f64>,
    pub refund_date: Option<String>,
}

/// Fields for a new successful billing entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBillingEntry {
    pub user_id: String,
    pub subscription_id: Option<String>,
    /// Amount in major currency units.
    pub amount: f64,
    pub currency: String,
    pub external_transaction_id: Option<String>,
    pub external_reference: Option<String>,
}
