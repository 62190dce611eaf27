//! Subscription ledger for the tutor service.
//!
//! Payment-gateway webhooks are authenticated with [`verify_signature`],
//! decoded into a [`WebhookEvent`], and applied to the subscriptions and
//! billing history tables by [`Ledger::apply`]. Updates for the same owner
//! are serialised so interleaved deliveries cannot lose writes.
//!
//! # Example
//!
//! ```rust,ignore
//! use ledger::{Ledger, PlanCatalog};
//!
//! let ledger = Ledger::new(db, PlanCatalog::default());
//! let outcome = ledger.handle_webhook(&body, signature, &secret).await?;
//! ```

pub mod error;
pub mod event;
pub mod gateway;
pub mod ledger;
pub mod locks;
pub mod paystack;
pub mod plans;
pub mod signature;

pub use error::{LedgerError, Result};
pub use event::{
    ChargeSuccess, Customer, Metadata, RefundProcessed, SubscriptionCreated, WebhookEvent,
};
pub use gateway::{Checkout, PaymentGateway, VerifiedTransaction};
pub use ledger::{Ledger, Outcome};
pub use locks::KeyedLocks;
pub use paystack::{PaystackClient, PaystackConfig};
pub use plans::{Plan, PlanCatalog};
pub use signature::{sign, verify_signature, SIGNATURE_HEADER};
