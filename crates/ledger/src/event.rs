//! Payment-gateway webhook events.
//!
//! The gateway is loose about types: ids arrive as numbers or strings,
//! references to related records arrive as bare codes or nested objects, and
//! metadata can be an object, a JSON-encoded string, or an empty string.
//! Everything is normalised here so the ledger only sees `Option<String>`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{LedgerError, Result};

/// Currency assumed when the gateway omits one.
pub const DEFAULT_CURRENCY: &str = "NGN";

/// A decoded webhook delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    /// `charge.success`
    ChargeSuccess(ChargeSuccess),
    /// `refund.processed`
    RefundProcessed(RefundProcessed),
    /// `subscription.disable`
    SubscriptionDisable { subscription_code: String },
    /// `subscription.expiring`
    SubscriptionExpiring { subscription_code: String },
    /// `subscription.create`
    SubscriptionCreate(SubscriptionCreated),
    /// Any other event type. Acknowledged and ignored.
    Unknown(String),
}

/// Metadata attached to a transaction at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Metadata {
    #[serde(rename = "userId", default, deserialize_with = "opt_id")]
    pub user_id: Option<String>,
    #[serde(rename = "planType", default, deserialize_with = "opt_id")]
    pub plan_type: Option<String>,
}

/// The gateway's view of the paying customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Customer {
    #[serde(default, deserialize_with = "opt_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "opt_id")]
    pub customer_code: Option<String>,
    #[serde(default, deserialize_with = "opt_id")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_metadata")]
    pub metadata: Metadata,
}

/// Data of a `charge.success` event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChargeSuccess {
    /// Gateway transaction id.
    #[serde(default, deserialize_with = "opt_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "opt_id")]
    pub reference: Option<String>,
    /// Amount in minor currency units.
    pub amount: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default, deserialize_with = "opt_subscription_code")]
    pub subscription: Option<String>,
    #[serde(default, deserialize_with = "opt_plan_code")]
    pub plan: Option<String>,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default, deserialize_with = "lenient_metadata")]
    pub metadata: Metadata,
}

/// Data of a `refund.processed` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefundProcessed {
    /// Gateway id of the refunded transaction.
    #[serde(default, deserialize_with = "opt_id")]
    pub transaction: Option<String>,
    /// Refunded amount in minor currency units.
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default, deserialize_with = "opt_subscription_code")]
    pub subscription: Option<String>,
}

/// Data of a `subscription.create` event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubscriptionCreated {
    #[serde(default, deserialize_with = "opt_id")]
    pub subscription_code: Option<String>,
    /// Amount in minor currency units.
    #[serde(default)]
    pub amount: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default, deserialize_with = "opt_id")]
    pub transaction: Option<String>,
    #[serde(default, deserialize_with = "opt_id")]
    pub reference: Option<String>,
}

#[derive(Deserialize)]
struct SubscriptionCode {
    #[serde(deserialize_with = "required_id")]
    subscription_code: String,
}

impl WebhookEvent {
    /// Decode a raw webhook body.
    ///
    /// The event type is read from `event`, or `type` when `event` is absent.
    /// A recognised type whose `data` does not decode is an error; an
    /// unrecognised type decodes to [`WebhookEvent::Unknown`].
    pub fn parse(body: &[u8]) -> Result<Self> {
        let envelope: Value = serde_json::from_slice(body)
            .map_err(|e| LedgerError::InvalidPayload(format!("body is not JSON: {}", e)))?;

        let tag = envelope
            .get("event")
            .or_else(|| envelope.get("type"))
            .and_then(Value::as_str)
            .ok_or_else(|| LedgerError::InvalidPayload("missing event type".to_string()))?
            .to_string();
        let data = envelope.get("data").cloned().unwrap_or(Value::Null);

        let event = match tag.as_str() {
            "charge.success" => WebhookEvent::ChargeSuccess(decode(&tag, data)?),
            "refund.processed" => WebhookEvent::RefundProcessed(decode(&tag, data)?),
            "subscription.disable" => {
                let data: SubscriptionCode = decode(&tag, data)?;
                WebhookEvent::SubscriptionDisable {
                    subscription_code: data.subscription_code,
                }
            }
            "subscription.expiring" => {
                let data: SubscriptionCode = decode(&tag, data)?;
                WebhookEvent::SubscriptionExpiring {
                    subscription_code: data.subscription_code,
                }
            }
            "subscription.create" => WebhookEvent::SubscriptionCreate(decode(&tag, data)?),
            _ => WebhookEvent::Unknown(tag),
        };

        Ok(event)
    }

    /// The gateway's event type string.
    pub fn tag(&self) -> &str {
        match self {
            WebhookEvent::ChargeSuccess(_) => "charge.success",
            WebhookEvent::RefundProcessed(_) => "refund.processed",
            WebhookEvent::SubscriptionDisable { .. } => "subscription.disable",
            WebhookEvent::SubscriptionExpiring { .. } => "subscription.expiring",
            WebhookEvent::SubscriptionCreate(_) => "subscription.create",
            WebhookEvent::Unknown(tag) => tag,
        }
    }
}

fn decode<T: DeserializeOwned>(tag: &str, data: Value) -> Result<T> {
    serde_json::from_value(data)
        .map_err(|e| LedgerError::InvalidPayload(format!("{} data: {}", tag, e)))
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

/// Normalise a string, number, or object holding `key` into a string.
fn normalise(value: &Value, key: &str) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get(key).and_then(|inner| normalise(inner, key)),
        _ => None,
    }
}

fn opt_field<'de, D>(deserializer: D, key: &str) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(|v| normalise(v, key)))
}

fn opt_id<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    opt_field(d, "id")
}

fn opt_subscription_code<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<String>, D::Error> {
    opt_field(d, "subscription_code")
}

fn opt_plan_code<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<String>, D::Error> {
    opt_field(d, "plan_code")
}

fn required_id<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    opt_id(d)?.ok_or_else(|| serde::de::Error::custom("expected a non-empty id"))
}

pub(crate) fn lenient_metadata<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Metadata, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    let metadata = match value {
        Some(object @ Value::Object(_)) => serde_json::from_value(object).unwrap_or_default(),
        Some(Value::String(encoded)) => serde_json::from_str(&encoded).unwrap_or_default(),
        _ => Metadata::default(),
    };
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<WebhookEvent> {
        WebhookEvent::parse(value.to_string().as_bytes())
    }

    #[test]
    fn test_parse_charge_success() {
        let event = parse(json!({
            "event": "charge.success",
            "data": {
                "id": 302961,
                "reference": "REF_1",
                "amount": 5000,
                "currency": "NGN",
                "subscription": "SUB_1",
                "customer": {"id": 84312, "customer_code": "CUS_1", "email": "ada@example.com"},
                "metadata": {"userId": "user-1", "planType": "basic"}
            }
        }))
        .unwrap();

        let WebhookEvent::ChargeSuccess(charge) = event else {
            panic!("expected charge.success");
        };
        assert_eq!(charge.id.as_deref(), Some("302961"));
        assert_eq!(charge.reference.as_deref(), Some("REF_1"));
        assert_eq!(charge.amount, 5000);
        assert_eq!(charge.subscription.as_deref(), Some("SUB_1"));
        assert_eq!(charge.metadata.user_id.as_deref(), Some("user-1"));
        assert_eq!(charge.metadata.plan_type.as_deref(), Some("basic"));
        let customer = charge.customer.unwrap();
        assert_eq!(customer.id.as_deref(), Some("84312"));
        assert_eq!(customer.customer_code.as_deref(), Some("CUS_1"));
    }

    #[test]
    fn test_type_field_and_nested_references() {
        let event = parse(json!({
            "type": "charge.success",
            "data": {
                "amount": 1999,
                "subscription": {"subscription_code": "SUB_9"},
                "plan": {"plan_code": "PLN_pro"},
                "metadata": "{\"userId\": 42}"
            }
        }))
        .unwrap();

        let WebhookEvent::ChargeSuccess(charge) = event else {
            panic!("expected charge.success");
        };
        assert_eq!(charge.currency, DEFAULT_CURRENCY);
        assert_eq!(charge.subscription.as_deref(), Some("SUB_9"));
        assert_eq!(charge.plan.as_deref(), Some("PLN_pro"));
        assert_eq!(charge.metadata.user_id.as_deref(), Some("42"));
        assert!(charge.metadata.plan_type.is_none());
    }

    #[test]
    fn test_empty_metadata_string() {
        let event = parse(json!({
            "event": "charge.success",
            "data": {"amount": 100, "metadata": ""}
        }))
        .unwrap();
        let WebhookEvent::ChargeSuccess(charge) = event else {
            panic!("expected charge.success");
        };
        assert_eq!(charge.metadata, Metadata::default());
    }

    #[test]
    fn test_parse_refund_with_numeric_transaction() {
        let event = parse(json!({
            "event": "refund.processed",
            "data": {"transaction": 1234, "amount": 2500, "subscription": "SUB_1"}
        }))
        .unwrap();
        assert_eq!(
            event,
            WebhookEvent::RefundProcessed(RefundProcessed {
                transaction: Some("1234".to_string()),
                amount: Some(2500),
                subscription: Some("SUB_1".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_subscription_code_events() {
        let event = parse(json!({
            "event": "subscription.disable",
            "data": {"subscription_code": "SUB_1"}
        }))
        .unwrap();
        assert_eq!(
            event,
            WebhookEvent::SubscriptionDisable {
                subscription_code: "SUB_1".to_string()
            }
        );

        let event = parse(json!({
            "event": "subscription.expiring",
            "data": {"subscription_code": "SUB_2"}
        }))
        .unwrap();
        assert_eq!(event.tag(), "subscription.expiring");
    }

    #[test]
    fn test_recognised_event_with_bad_data() {
        let result = parse(json!({"event": "subscription.disable", "data": {}}));
        assert!(matches!(result, Err(LedgerError::InvalidPayload(_))));

        let result = parse(json!({"event": "charge.success"}));
        assert!(matches!(result, Err(LedgerError::InvalidPayload(_))));

        let result = parse(json!({"event": "charge.success", "data": {"amount": "lots"}}));
        assert!(matches!(result, Err(LedgerError::InvalidPayload(_))));
    }

    #[test]
    fn test_unknown_and_malformed() {
        let event = parse(json!({"event": "invoice.create", "data": {}})).unwrap();
        assert_eq!(event, WebhookEvent::Unknown("invoice.create".to_string()));
        assert_eq!(event.tag(), "invoice.create");

        assert!(WebhookEvent::parse(b"not json").is_err());
        assert!(parse(json!({"data": {}})).is_err());
    }
}
