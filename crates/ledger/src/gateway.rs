//! Payment gateway abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::event::{lenient_metadata, Metadata, DEFAULT_CURRENCY};

/// A hosted checkout page created for one payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkout {
    pub authorization_url: String,
    pub reference: String,
    #[serde(default)]
    pub access_code: Option<String>,
}

/// A transaction as reported by the gateway's verify endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifiedTransaction {
    pub status: String,
    /// Amount in minor currency units.
    #[serde(default)]
    pub amount: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default, deserialize_with = "lenient_metadata")]
    pub metadata: Metadata,
}

impl VerifiedTransaction {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

/// Outbound calls to the payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Start a one-off payment and return the hosted checkout.
    async fn initialize_transaction(
        &self,
        email: &str,
        amount_minor: i64,
        metadata: Value,
        callback_url: &str,
    ) -> Result<Checkout>;

    /// Look up the final state of a payment by reference.
    async fn verify_transaction(&self, reference: &str) -> Result<VerifiedTransaction>;

    /// Stop a recurring subscription.
    async fn disable_subscription(&self, subscription_code: &str) -> Result<()>;

    /// Ask the gateway to refund a transaction, in full when `amount_minor`
    /// is `None`. The gateway confirms with a `refund.processed` webhook.
    async fn refund_transaction(&self, transaction_id: &str, amount_minor: Option<i64>)
        -> Result<()>;
}
