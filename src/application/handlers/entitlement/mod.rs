//! Entitlement handlers.
//!
//! ## Commands
//! - Applying a billing event to a user's entitlement
//! - Dispatching verified Stripe and Zaxaa webhooks
//!
//! ## Queries
//! - Get a user's entitlement with its access decision

mod apply_billing_event;
mod get_entitlement;
mod stripe_webhook;
mod zaxaa_webhook;

pub use apply_billing_event::{
    ApplyBillingEventCommand, ApplyBillingEventHandler, ApplyBillingEventResult,
};
pub use get_entitlement::{
    EntitlementView, GetEntitlementHandler, GetEntitlementQuery, GetEntitlementResult,
};
pub use stripe_webhook::StripeWebhookHandler;
pub use zaxaa_webhook::ZaxaaWebhookHandler;
