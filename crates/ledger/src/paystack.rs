//! Paystack implementation of [`PaymentGateway`].

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::{LedgerError, Result};
use crate::gateway::{Checkout, PaymentGateway, VerifiedTransaction};
use crate::plans::PlanCatalog;

/// Paystack credentials and endpoints.
#[derive(Debug, Clone)]
pub struct PaystackConfig {
    /// API base URL.
    pub api_url: String,

    /// Secret key used for API calls.
    pub secret_key: String,

    /// Key the gateway signs webhooks with.
    pub webhook_secret: String,

    /// Timeout for every outbound request, in seconds.
    pub timeout_secs: u64,

    /// Gateway plan code of the basic plan.
    pub basic_plan_code: Option<String>,

    /// Gateway plan code of the pro plan.
    pub pro_plan_code: Option<String>,
}

impl PaystackConfig {
    /// Configuration with the default endpoint for a secret key.
    pub fn new(secret_key: impl Into<String>) -> Self {
        let secret_key = secret_key.into();
        Self {
            api_url: "https://api.paystack.co".to_string(),
            webhook_secret: secret_key.clone(),
            secret_key,
            timeout_secs: 15,
            basic_plan_code: None,
            pro_plan_code: None,
        }
    }

    /// Read configuration from environment variables.
    ///
    /// Returns `None` when `PAYSTACK_SECRET_KEY` is unset or blank.
    ///
    /// Optional environment variables:
    /// - `PAYSTACK_WEBHOOK_SECRET` - Webhook signing key (default: the secret key)
    /// - `PAYSTACK_API_URL` - API URL (default: https://api.paystack.co)
    /// - `PAYSTACK_TIMEOUT_SECS` - Request timeout (default: 15)
    /// - `PAYSTACK_BASIC_PLAN` / `PAYSTACK_PRO_PLAN` - Recurring plan codes
    pub fn from_env() -> Option<Self> {
        let secret_key = non_blank_var("PAYSTACK_SECRET_KEY")?;
        let mut config = Self::new(secret_key);

        if let Some(secret) = non_blank_var("PAYSTACK_WEBHOOK_SECRET") {
            config.webhook_secret = secret;
        }
        if let Some(url) = non_blank_var("PAYSTACK_API_URL") {
            config.api_url = url;
        }
        if let Some(timeout) = non_blank_var("PAYSTACK_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            config.timeout_secs = timeout;
        }
        config.basic_plan_code = non_blank_var("PAYSTACK_BASIC_PLAN");
        config.pro_plan_code = non_blank_var("PAYSTACK_PRO_PLAN");

        Some(config)
    }

    /// The plan catalog carrying this account's plan codes.
    pub fn plan_catalog(&self) -> PlanCatalog {
        PlanCatalog::with_plan_codes(self.basic_plan_code.clone(), self.pro_plan_code.clone())
    }
}

fn non_blank_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Every Paystack response is wrapped in this envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionDetails {
    email_token: String,
}

/// HTTP client for the Paystack API.
pub struct PaystackClient {
    client: Client,
    config: PaystackConfig,
}

impl PaystackClient {
    pub fn new(config: PaystackConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LedgerError::Gateway(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "PaystackClient initialized for {}, timeout: {}s",
            config.api_url, config.timeout_secs
        );

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &PaystackConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LedgerError::Gateway("request timed out".to_string())
                } else {
                    LedgerError::Gateway(format!("Failed to send request: {}", e))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LedgerError::Gateway(format!("Failed to read response: {}", e)))?;

        let envelope: Envelope<T> = serde_json::from_str(&text).map_err(|e| {
            LedgerError::Gateway(format!("Unexpected response ({}): {}", status.as_u16(), e))
        })?;

        if !status.is_success() || !envelope.status {
            warn!("Paystack rejected request ({}): {}", status.as_u16(), envelope.message);
            return Err(LedgerError::Gateway(envelope.message));
        }

        envelope
            .data
            .ok_or_else(|| LedgerError::Gateway("response carried no data".to_string()))
    }
}

/// Reject path segments that would change the request path.
fn path_segment(value: &str) -> Result<&str> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid && value != "." && value != ".." {
        Ok(value)
    } else {
        Err(LedgerError::Gateway(format!("invalid identifier: {:?}", value)))
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn initialize_transaction(
        &self,
        email: &str,
        amount_minor: i64,
        metadata: Value,
        callback_url: &str,
    ) -> Result<Checkout> {
        debug!("Initializing transaction of {} minor units", amount_minor);

        let body = json!({
            "email": email,
            "amount": amount_minor,
            "metadata": metadata,
            "callback_url": callback_url,
        });
        self.send(self.client.post(self.url("/transaction/initialize")).json(&body))
            .await
    }

    async fn verify_transaction(&self, reference: &str) -> Result<VerifiedTransaction> {
        let reference = path_segment(reference)?;
        debug!("Verifying transaction {}", reference);

        self.send(
            self.client
                .get(self.url(&format!("/transaction/verify/{}", reference))),
        )
        .await
    }

    async fn disable_subscription(&self, subscription_code: &str) -> Result<()> {
        let code = path_segment(subscription_code)?;

        let details: SubscriptionDetails = self
            .send(self.client.get(self.url(&format!("/subscription/{}", code))))
            .await?;

        let body = json!({"code": code, "token": details.email_token});
        let _: Value = self
            .send(self.client.post(self.url("/subscription/disable")).json(&body))
            .await?;

        info!(subscription = %code, "Disabled subscription at gateway");
        Ok(())
    }

    async fn refund_transaction(
        &self,
        transaction_id: &str,
        amount_minor: Option<i64>,
    ) -> Result<()> {
        let _: Value = self
            .send(
                self.client
                    .post(self.url("/refund"))
                    .json(&refund_body(transaction_id, amount_minor)),
            )
            .await?;

        info!(transaction = %transaction_id, amount = ?amount_minor, "Refund requested");
        Ok(())
    }
}

/// `amount` is left out for a full refund.
fn refund_body(transaction_id: &str, amount_minor: Option<i64>) -> Value {
    let mut body = json!({"transaction": transaction_id});
    if let Some(amount) = amount_minor {
        body["amount"] = json!(amount);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PaystackConfig::new("sk_test");
        assert_eq!(config.api_url, "https://api.paystack.co");
        assert_eq!(config.webhook_secret, "sk_test");
        assert_eq!(config.timeout_secs, 15);
        assert!(config.plan_catalog().all().iter().all(|p| p.plan_code.is_none()));
    }

    #[test]
    fn test_config_from_env() {
        // Env vars are process-global, so every case lives in one test.
        env::remove_var("PAYSTACK_SECRET_KEY");
        assert!(PaystackConfig::from_env().is_none());

        env::set_var("PAYSTACK_SECRET_KEY", "  ");
        assert!(PaystackConfig::from_env().is_none());

        env::set_var("PAYSTACK_SECRET_KEY", "sk_live");
        env::set_var("PAYSTACK_WEBHOOK_SECRET", "whsec");
        env::set_var("PAYSTACK_TIMEOUT_SECS", "5");
        env::set_var("PAYSTACK_PRO_PLAN", "PLN_pro");
        let config = PaystackConfig::from_env().unwrap();
        assert_eq!(config.secret_key, "sk_live");
        assert_eq!(config.webhook_secret, "whsec");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.plan_catalog().by_plan_code("PLN_pro").name, "Pro");

        for name in [
            "PAYSTACK_SECRET_KEY",
            "PAYSTACK_WEBHOOK_SECRET",
            "PAYSTACK_TIMEOUT_SECS",
            "PAYSTACK_PRO_PLAN",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn test_path_segment() {
        assert!(path_segment("REF_1-abc.2").is_ok());
        assert!(path_segment("").is_err());
        assert!(path_segment("..").is_err());
        assert!(path_segment("a/b").is_err());
        assert!(path_segment("a?b=c").is_err());
    }

    #[test]
    fn test_envelope_decoding() {
        let envelope: Envelope<Checkout> = serde_json::from_str(
            r#"{"status":true,"message":"Authorization URL created","data":{
                "authorization_url":"https://checkout.paystack.com/abc",
                "access_code":"abc","reference":"REF_1"}}"#,
        )
        .unwrap();
        assert!(envelope.status);
        assert_eq!(envelope.data.unwrap().reference, "REF_1");

        let envelope: Envelope<Checkout> =
            serde_json::from_str(r#"{"status":false,"message":"Invalid key"}"#).unwrap();
        assert!(!envelope.status);
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_refund_body() {
        assert_eq!(refund_body("302961", None), json!({"transaction": "302961"}));
        assert_eq!(
            refund_body("302961", Some(500)),
            json!({"transaction": "302961", "amount": 500})
        );
    }

    #[tokio::test]
    async fn test_unreachable_gateway() {
        let mut config = PaystackConfig::new("sk_test");
        config.api_url = "http://127.0.0.1:9".to_string();
        config.timeout_secs = 2;
        let client = PaystackClient::new(config).unwrap();

        let result = client.verify_transaction("REF_1").await;
        assert!(matches!(result, Err(LedgerError::Gateway(_))));
    }
}
