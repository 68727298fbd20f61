//! Payment-provider webhooks.
//!
//! Signature verification, payload types for Stripe and Zaxaa, the mapping from
//! provider event types to billing lifecycle events, and the idempotent processor.

mod billing_event;
mod errors;
mod processor;
mod stripe_event;
mod verifier;
mod zaxaa_event;

pub use billing_event::{BillingEvent, BillingMetadata, WebhookEnvelope, WebhookProvider};
pub use errors::WebhookError;
pub use processor::{
    DispatchOutcome, IdempotentWebhookProcessor, WebhookDispatcher, DEFAULT_CLAIM_LEASE,
};
pub use stripe_event::{StripeEvent, StripeEventData, StripeEventType};
pub use verifier::{SignatureHeader, StripeWebhookVerifier, ZaxaaWebhookVerifier};
pub use zaxaa_event::{ZaxaaEvent, ZaxaaTransactionType};

#[cfg(test)]
pub use stripe_event::StripeEventBuilder;
#[cfg(test)]
pub(crate) use verifier::{sign_stripe_payload, sign_zaxaa_payload};
