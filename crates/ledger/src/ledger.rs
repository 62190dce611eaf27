//! Applying payment events to subscriptions and billing history.

use chrono::Utc;
use database::time::{days_after, format_timestamp};
use database::{billing, subscription, user};
use database::{Database, NewBillingEntry, PlanType, SubscriptionStatus, SubscriptionUpsert};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::event::{ChargeSuccess, RefundProcessed, SubscriptionCreated, WebhookEvent};
use crate::gateway::VerifiedTransaction;
use crate::locks::KeyedLocks;
use crate::plans::PlanCatalog;
use crate::signature::verify_signature;

/// Length of a paid period.
pub const PERIOD_DAYS: i64 = 30;

/// What applying an event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Rows were written.
    Applied,
    /// The event referenced records that do not exist. Nothing changed.
    NoMatch,
    /// The event carries nothing to act on. Nothing changed.
    Ignored,
}

/// Gateway amounts are minor units; the ledger stores major units.
fn to_major(minor: i64) -> f64 {
    minor as f64 / 100.0
}

/// The subscription ledger.
///
/// Writes for one owner are serialised through [`KeyedLocks`] keyed by user
/// id. Events whose owner is not known locally lock on the subscription code.
pub struct Ledger {
    db: Database,
    plans: PlanCatalog,
    locks: KeyedLocks,
}

impl Ledger {
    pub fn new(db: Database, plans: PlanCatalog) -> Self {
        Self {
            db,
            plans,
            locks: KeyedLocks::new(),
        }
    }

    pub fn plans(&self) -> &PlanCatalog {
        &self.plans
    }

    /// Verify, decode, and apply one webhook delivery.
    pub async fn handle_webhook(
        &self,
        body: &[u8],
        signature: Option<&str>,
        secret: &str,
    ) -> Result<Outcome> {
        verify_signature(body, signature, secret)?;
        let event = WebhookEvent::parse(body)?;
        self.apply(event).await
    }

    /// Apply a decoded event.
    pub async fn apply(&self, event: WebhookEvent) -> Result<Outcome> {
        let tag = event.tag().to_string();

        let outcome = match event {
            WebhookEvent::ChargeSuccess(charge) => self.charge_success(charge).await?,
            WebhookEvent::RefundProcessed(refund) => self.refund_processed(refund).await?,
            WebhookEvent::SubscriptionDisable { subscription_code } => {
                self.close_subscription(&subscription_code, SubscriptionStatus::Cancelled, true)
                    .await?
            }
            WebhookEvent::SubscriptionExpiring { subscription_code } => {
                self.close_subscription(&subscription_code, SubscriptionStatus::Expiring, false)
                    .await?
            }
            WebhookEvent::SubscriptionCreate(created) => self.subscription_created(created).await?,
            WebhookEvent::Unknown(_) => {
                debug!(event = %tag, "Ignoring unhandled webhook event");
                Outcome::Ignored
            }
        };

        info!(event = %tag, outcome = ?outcome, "Webhook event processed");
        Ok(outcome)
    }

    /// Record a payment confirmed through the verify endpoint.
    ///
    /// Moves the paying user to the plan named in the checkout metadata for
    /// one period. Unsuccessful transactions and transactions without a user
    /// id change nothing.
    pub async fn confirm_payment(&self, transaction: &VerifiedTransaction) -> Result<Outcome> {
        if !transaction.is_success() {
            debug!(status = %transaction.status, "Payment not successful");
            return Ok(Outcome::Ignored);
        }
        let Some(user_id) = transaction.metadata.user_id.as_deref() else {
            warn!("Verified payment carries no user id");
            return Ok(Outcome::Ignored);
        };

        let plan = self.plan_for(transaction.metadata.plan_type.as_deref(), None);
        let end = days_after(Utc::now(), PERIOD_DAYS);

        let _guard = self.locks.lock(user_id).await;
        let updated = user::set_subscription_status(self.db.pool(), user_id, plan, Some(&end)).await?;

        if updated {
            info!(user_id = %user_id, plan = plan.as_str(), "Payment confirmed");
            Ok(Outcome::Applied)
        } else {
            warn!(user_id = %user_id, "Verified payment for unknown user");
            Ok(Outcome::NoMatch)
        }
    }

    /// Metadata plan id first, then the gateway plan code, then free.
    fn plan_for(&self, plan_type: Option<&str>, plan_code: Option<&str>) -> PlanType {
        match (plan_type, plan_code) {
            (Some(id), _) => self.plans.from_id(id).id,
            (None, Some(code)) => self.plans.by_plan_code(code).id,
            (None, None) => PlanType::Free,
        }
    }

    async fn charge_success(&self, charge: ChargeSuccess) -> Result<Outcome> {
        let Some(user_id) = charge.metadata.user_id.clone() else {
            warn!(reference = ?charge.reference, "charge.success without a user id, ignoring");
            return Ok(Outcome::Ignored);
        };

        let plan = self.plan_for(charge.metadata.plan_type.as_deref(), charge.plan.as_deref());
        let now = Utc::now();

        let upsert = SubscriptionUpsert {
            user_id: user_id.clone(),
            external_customer_id: charge
                .customer
                .and_then(|c| c.customer_code)
                .unwrap_or_default(),
            external_subscription_id: charge.subscription,
            plan_type: plan,
            current_period_start: format_timestamp(now),
            current_period_end: days_after(now, PERIOD_DAYS),
        };
        let entry = NewBillingEntry {
            user_id: user_id.clone(),
            subscription_id: None,
            amount: to_major(charge.amount),
            currency: charge.currency,
            external_transaction_id: charge.id,
            external_reference: charge.reference,
        };

        let _guard = self.locks.lock(&user_id).await;
        let (subscription, entry) =
            subscription::record_charge(self.db.pool(), &upsert, &entry).await?;

        info!(
            user_id = %user_id,
            subscription_id = %subscription.id,
            plan = plan.as_str(),
            amount = entry.amount,
            "Subscription activated"
        );
        Ok(Outcome::Applied)
    }

    async fn refund_processed(&self, refund: RefundProcessed) -> Result<Outcome> {
        let pool = self.db.pool();

        let _guard = self.locks.lock(&self.refund_lock_key(&refund).await?).await;

        // Rows may have changed while waiting for the lock.
        let entry = match refund.transaction.as_deref() {
            Some(txn) => billing::find_by_transaction(pool, txn).await?,
            None => None,
        };

        let mut changed = 0;
        if let (Some(txn), Some(entry)) = (refund.transaction.as_deref(), entry.as_ref()) {
            let amount = refund.amount.map(to_major).unwrap_or(entry.amount);
            changed += billing::mark_refunded(pool, txn, amount).await?;
        }
        if let Some(code) = refund.subscription.as_deref() {
            changed +=
                subscription::set_status_by_external(pool, code, SubscriptionStatus::Cancelled, true)
                    .await?;
        }

        if changed == 0 {
            warn!(
                transaction = ?refund.transaction,
                subscription = ?refund.subscription,
                "Refund matched no billing entry or subscription"
            );
            return Ok(Outcome::NoMatch);
        }

        info!(transaction = ?refund.transaction, "Refund recorded");
        Ok(Outcome::Applied)
    }

    /// The owning user of a refund when known locally, else its gateway ids.
    async fn refund_lock_key(&self, refund: &RefundProcessed) -> Result<String> {
        let pool = self.db.pool();

        if let Some(code) = refund.subscription.as_deref() {
            if let Some(owned) = subscription::find_by_external_subscription(pool, code).await? {
                return Ok(owned.user_id);
            }
        }
        if let Some(txn) = refund.transaction.as_deref() {
            if let Some(entry) = billing::find_by_transaction(pool, txn).await? {
                return Ok(entry.user_id);
            }
        }

        Ok(refund
            .subscription
            .clone()
            .or_else(|| refund.transaction.clone())
            .unwrap_or_default())
    }

    async fn close_subscription(
        &self,
        code: &str,
        status: SubscriptionStatus,
        close_period: bool,
    ) -> Result<Outcome> {
        let pool = self.db.pool();

        let lock_key = subscription::find_by_external_subscription(pool, code)
            .await?
            .map(|s| s.user_id)
            .unwrap_or_else(|| code.to_string());
        let _guard = self.locks.lock(&lock_key).await;

        let changed = subscription::set_status_by_external(pool, code, status, close_period).await?;
        if changed == 0 {
            warn!(subscription = %code, "No local subscription for gateway code");
            return Ok(Outcome::NoMatch);
        }

        info!(subscription = %code, status = ?status, "Subscription status changed");
        Ok(Outcome::Applied)
    }

    /// Resolve the local user a gateway customer belongs to.
    async fn resolve_owner(&self, created: &SubscriptionCreated) -> Result<Option<String>> {
        let Some(customer) = created.customer.as_ref() else {
            return Ok(None);
        };
        let pool = self.db.pool();

        if let Some(user_id) = customer.metadata.user_id.clone() {
            return Ok(Some(user_id));
        }
        if let Some(code) = customer.customer_code.as_deref() {
            if let Some(existing) = subscription::find_by_external_customer(pool, code).await? {
                return Ok(Some(existing.user_id));
            }
        }
        if let Some(email) = customer.email.as_deref() {
            if let Some(found) = user::find_user_by_email(pool, email).await? {
                return Ok(Some(found.id));
            }
        }

        Ok(None)
    }

    async fn subscription_created(&self, created: SubscriptionCreated) -> Result<Outcome> {
        let Some(user_id) = self.resolve_owner(&created).await? else {
            warn!(
                subscription = ?created.subscription_code,
                "subscription.create for unknown customer, ignoring"
            );
            return Ok(Outcome::Ignored);
        };

        let _guard = self.locks.lock(&user_id).await;
        let pool = self.db.pool();

        let local = subscription::get_for_user(pool, &user_id).await?;
        let entry = NewBillingEntry {
            user_id: user_id.clone(),
            subscription_id: local.map(|s| s.id),
            amount: to_major(created.amount),
            currency: created.currency,
            external_transaction_id: created.transaction,
            external_reference: created.reference,
        };
        let entry = billing::insert_entry(pool, &entry).await?;

        info!(user_id = %user_id, entry_id = entry.id, "Subscription billing recorded");
        Ok(Outcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::signature::sign;
    use database::{BillingStatus, Subscription};
    use serde_json::{json, Value};
    use std::sync::Arc;

    const SECRET: &str = "sk_test_secret";

    async fn test_ledger() -> Ledger {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        user::create_user(db.pool(), "user-1", "ada@example.com", "Ada")
            .await
            .unwrap();
        Ledger::new(db, PlanCatalog::default())
    }

    async fn deliver(ledger: &Ledger, payload: Value) -> Result<Outcome> {
        let body = payload.to_string();
        let signature = sign(body.as_bytes(), SECRET);
        ledger
            .handle_webhook(body.as_bytes(), Some(&signature), SECRET)
            .await
    }

    fn charge(user_id: &str, plan: &str, amount: i64, txn: &str) -> Value {
        json!({
            "event": "charge.success",
            "data": {
                "id": txn,
                "reference": format!("REF_{}", txn),
                "amount": amount,
                "currency": "NGN",
                "subscription": "SUB_1",
                "customer": {"customer_code": "CUS_1", "email": "ada@example.com"},
                "metadata": {"userId": user_id, "planType": plan}
            }
        })
    }

    async fn subscription_of(ledger: &Ledger, user_id: &str) -> Subscription {
        subscription::get_for_user(ledger.db.pool(), user_id)
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_charge_success_activates_subscription() {
        let ledger = test_ledger().await;

        let outcome = deliver(&ledger, charge("user-1", "basic", 5000, "1")).await.unwrap();
        assert_eq!(outcome, Outcome::Applied);

        let sub = subscription_of(&ledger, "user-1").await;
        assert_eq!(sub.plan_type, PlanType::Basic);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.external_subscription_id.as_deref(), Some("SUB_1"));
        assert_eq!(sub.external_customer_id, "CUS_1");
        assert!(sub.current_period_end > sub.current_period_start);

        let history = billing::list_for_user(ledger.db.pool(), "user-1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].amount, 50.0);
        assert_eq!(history[0].currency, "NGN");
        assert_eq!(history[0].status, BillingStatus::Success);
        assert_eq!(history[0].external_reference.as_deref(), Some("REF_1"));
        assert_eq!(history[0].subscription_id.as_deref(), Some(sub.id.as_str()));

        let user = user::get_user(ledger.db.pool(), "user-1").await.unwrap();
        assert_eq!(user.subscription_status, PlanType::Basic);
        assert_eq!(user.subscription_end_date, Some(sub.current_period_end));
    }

    #[tokio::test]
    async fn test_repeat_charge_reuses_subscription() {
        let ledger = test_ledger().await;

        deliver(&ledger, charge("user-1", "basic", 999, "1")).await.unwrap();
        let first = subscription_of(&ledger, "user-1").await;
        deliver(&ledger, charge("user-1", "pro", 1999, "2")).await.unwrap();
        let second = subscription_of(&ledger, "user-1").await;

        assert_eq!(first.id, second.id);
        assert_eq!(second.plan_type, PlanType::Pro);
        let history = billing::list_for_user(ledger.db.pool(), "user-1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|e| e.subscription_id.as_deref() == Some(first.id.as_str())));
    }

    #[tokio::test]
    async fn test_plan_code_when_metadata_has_no_plan() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let plans = PlanCatalog::with_plan_codes(None, Some("PLN_pro".to_string()));
        let ledger = Ledger::new(db, plans);

        let payload = json!({
            "event": "charge.success",
            "data": {"amount": 1999, "plan": {"plan_code": "PLN_pro"}, "metadata": {"userId": "user-9"}}
        });
        assert_eq!(deliver(&ledger, payload).await.unwrap(), Outcome::Applied);
        assert_eq!(subscription_of(&ledger, "user-9").await.plan_type, PlanType::Pro);
    }

    #[tokio::test]
    async fn test_charge_without_user_is_ignored() {
        let ledger = test_ledger().await;
        let payload = json!({"event": "charge.success", "data": {"amount": 5000, "metadata": ""}});

        assert_eq!(deliver(&ledger, payload).await.unwrap(), Outcome::Ignored);
        assert!(billing::list_for_user(ledger.db.pool(), "user-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tampered_body_is_rejected() {
        let ledger = test_ledger().await;
        let body = charge("user-1", "pro", 1999, "1").to_string();
        let signature = sign(body.as_bytes(), SECRET);
        let tampered = body.replace("1999", "1");

        let result = ledger
            .handle_webhook(tampered.as_bytes(), Some(&signature), SECRET)
            .await;
        assert!(matches!(result, Err(LedgerError::SignatureMismatch)));

        let result = ledger.handle_webhook(body.as_bytes(), None, SECRET).await;
        assert!(matches!(result, Err(LedgerError::SignatureMismatch)));

        assert!(subscription::get_for_user(ledger.db.pool(), "user-1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_refund_marks_entry_and_cancels() {
        let ledger = test_ledger().await;
        deliver(&ledger, charge("user-1", "basic", 999, "7001")).await.unwrap();

        let outcome = deliver(
            &ledger,
            json!({
                "event": "refund.processed",
                "data": {"transaction": 7001, "amount": 500, "subscription": "SUB_1"}
            }),
        )
        .await
        .unwrap();
        assert_eq!(outcome, Outcome::Applied);

        let entry = billing::find_by_transaction(ledger.db.pool(), "7001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.status, BillingStatus::Refunded);
        assert_eq!(entry.refund_amount, Some(5.0));
        assert!(entry.refund_date.is_some());

        let sub = subscription_of(&ledger, "user-1").await;
        assert_eq!(sub.status, SubscriptionStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_refund_without_match_changes_nothing() {
        let ledger = test_ledger().await;
        deliver(&ledger, charge("user-1", "basic", 999, "1")).await.unwrap();

        let outcome = deliver(
            &ledger,
            json!({"event": "refund.processed", "data": {"transaction": "missing", "amount": 500}}),
        )
        .await
        .unwrap();
        assert_eq!(outcome, Outcome::NoMatch);

        let entry = billing::find_by_transaction(ledger.db.pool(), "1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.status, BillingStatus::Success);
        assert_eq!(subscription_of(&ledger, "user-1").await.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn test_disable_and_expiring() {
        let ledger = test_ledger().await;
        deliver(&ledger, charge("user-1", "pro", 1999, "1")).await.unwrap();
        let before = subscription_of(&ledger, "user-1").await;

        let expiring = json!({"event": "subscription.expiring", "data": {"subscription_code": "SUB_1"}});
        assert_eq!(deliver(&ledger, expiring).await.unwrap(), Outcome::Applied);
        let sub = subscription_of(&ledger, "user-1").await;
        assert_eq!(sub.status, SubscriptionStatus::Expiring);
        assert_eq!(sub.current_period_end, before.current_period_end);

        let disable = json!({"event": "subscription.disable", "data": {"subscription_code": "SUB_1"}});
        assert_eq!(deliver(&ledger, disable).await.unwrap(), Outcome::Applied);
        let sub = subscription_of(&ledger, "user-1").await;
        assert_eq!(sub.status, SubscriptionStatus::Cancelled);

        let unknown = json!({"event": "subscription.disable", "data": {"subscription_code": "SUB_X"}});
        assert_eq!(deliver(&ledger, unknown).await.unwrap(), Outcome::NoMatch);
    }

    #[tokio::test]
    async fn test_subscription_create_resolves_owner() {
        let ledger = test_ledger().await;
        deliver(&ledger, charge("user-1", "basic", 999, "1")).await.unwrap();
        let sub = subscription_of(&ledger, "user-1").await;

        // By customer code of the existing subscription.
        let payload = json!({
            "event": "subscription.create",
            "data": {
                "subscription_code": "SUB_2",
                "amount": 999,
                "currency": "NGN",
                "transaction": 88,
                "reference": "REF_CREATE",
                "customer": {"id": 5, "customer_code": "CUS_1"}
            }
        });
        assert_eq!(deliver(&ledger, payload).await.unwrap(), Outcome::Applied);

        let entry = billing::find_by_transaction(ledger.db.pool(), "88")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.user_id, "user-1");
        assert_eq!(entry.amount, 9.99);
        assert_eq!(entry.subscription_id.as_deref(), Some(sub.id.as_str()));
    }

    #[tokio::test]
    async fn test_subscription_create_by_email_and_unknown() {
        let ledger = test_ledger().await;

        let payload = json!({
            "event": "subscription.create",
            "data": {"amount": 1999, "transaction": "t-1", "customer": {"email": "ada@example.com"}}
        });
        assert_eq!(deliver(&ledger, payload).await.unwrap(), Outcome::Applied);
        let entry = billing::find_by_transaction(ledger.db.pool(), "t-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.user_id, "user-1");
        assert!(entry.subscription_id.is_none());

        let payload = json!({
            "event": "subscription.create",
            "data": {"amount": 1999, "customer": {"email": "nobody@example.com"}}
        });
        assert_eq!(deliver(&ledger, payload).await.unwrap(), Outcome::Ignored);
    }

    #[tokio::test]
    async fn test_unknown_event_is_ignored() {
        let ledger = test_ledger().await;
        let payload = json!({"event": "transfer.success", "data": {"amount": 1}});
        assert_eq!(deliver(&ledger, payload).await.unwrap(), Outcome::Ignored);
    }

    #[tokio::test]
    async fn test_malformed_recognised_event() {
        let ledger = test_ledger().await;
        let payload = json!({"event": "subscription.expiring", "data": {"code": "SUB_1"}});
        let result = deliver(&ledger, payload).await;
        assert!(matches!(result, Err(LedgerError::InvalidPayload(_))));
    }

    #[tokio::test]
    async fn test_confirm_payment() {
        let ledger = test_ledger().await;

        let failed: VerifiedTransaction = serde_json::from_value(json!({
            "status": "failed",
            "metadata": {"userId": "user-1", "planType": "pro"}
        }))
        .unwrap();
        assert_eq!(ledger.confirm_payment(&failed).await.unwrap(), Outcome::Ignored);

        let paid: VerifiedTransaction = serde_json::from_value(json!({
            "status": "success",
            "amount": 1999,
            "metadata": {"userId": "user-1", "planType": "pro"}
        }))
        .unwrap();
        assert_eq!(ledger.confirm_payment(&paid).await.unwrap(), Outcome::Applied);

        let user = user::get_user(ledger.db.pool(), "user-1").await.unwrap();
        assert_eq!(user.subscription_status, PlanType::Pro);
        assert!(user.subscription_end_date.is_some());

        let stranger: VerifiedTransaction = serde_json::from_value(json!({
            "status": "success",
            "metadata": {"userId": "user-404"}
        }))
        .unwrap();
        assert_eq!(ledger.confirm_payment(&stranger).await.unwrap(), Outcome::NoMatch);
    }

    #[tokio::test]
    async fn test_concurrent_charges_for_one_user() {
        let ledger = Arc::new(test_ledger().await);

        let mut handles = Vec::new();
        for i in 0..5 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                deliver(&ledger, charge("user-1", "basic", 999, &format!("c{}", i))).await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), Outcome::Applied);
        }

        let history = billing::list_for_user(ledger.db.pool(), "user-1").await.unwrap();
        assert_eq!(history.len(), 5);
        let sub = subscription_of(&ledger, "user-1").await;
        assert!(history.iter().all(|e| e.subscription_id.as_deref() == Some(sub.id.as_str())));
    }

    #[tokio::test]
    async fn test_refund_rereads_entry_after_waiting_for_lock() {
        let ledger = Arc::new(test_ledger().await);
        deliver(&ledger, charge("user-1", "basic", 999, "8001")).await.unwrap();

        // Another write for user-1 is in flight and records the charge the
        // refund refers to.
        let guard = ledger.locks.lock("user-1").await;
        let refund = {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                deliver(
                    &ledger,
                    json!({
                        "event": "refund.processed",
                        "data": {"transaction": 8002, "subscription": "SUB_1"}
                    }),
                )
                .await
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        billing::insert_entry(
            ledger.db.pool(),
            &NewBillingEntry {
                user_id: "user-1".to_string(),
                subscription_id: None,
                amount: 19.99,
                currency: "NGN".to_string(),
                external_transaction_id: Some("8002".to_string()),
                external_reference: Some("REF_8002".to_string()),
            },
        )
        .await
        .unwrap();
        drop(guard);

        assert_eq!(refund.await.unwrap().unwrap(), Outcome::Applied);
        let entry = billing::find_by_transaction(ledger.db.pool(), "8002")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.status, BillingStatus::Refunded);
        assert_eq!(entry.refund_amount, Some(19.99));
    }
}
