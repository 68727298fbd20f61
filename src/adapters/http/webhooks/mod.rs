//! HTTP adapter for payment-provider webhooks.
//!
//! - `POST /api/webhooks/stripe` - `Stripe-Signature` verified events
//! - `POST /api/webhooks/zaxaa` - `X-Zaxaa-Signature` verified notifications

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::WebhookAck;
pub use handlers::{handle_stripe_webhook, handle_zaxaa_webhook, WebhookApiError};
pub use routes::webhook_routes;
