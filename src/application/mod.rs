//! Application layer - Commands, Queries, and Handlers.
//!
//! Orchestrates the entitlement lifecycle and text composition over the ports.
//! Command handlers (write) are kept apart from query handlers (read).

pub mod handlers;

pub use handlers::compose::{ComposeTextCommand, ComposeTextHandler};
pub use handlers::entitlement::{
    ApplyBillingEventCommand, ApplyBillingEventHandler, ApplyBillingEventResult,
    EntitlementView, GetEntitlementHandler, GetEntitlementQuery, GetEntitlementResult,
    StripeWebhookHandler, ZaxaaWebhookHandler,
};
