//! Axum router configuration for webhook endpoints.

use axum::{routing::post, Router};

use super::super::state::AppState;
use super::handlers::{handle_stripe_webhook, handle_zaxaa_webhook};

/// Webhook routes, mounted at `/api/webhooks`.
///
/// No user authentication: every request is verified by its provider signature.
pub fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/stripe", post(handle_stripe_webhook))
        .route("/zaxaa", post(handle_zaxaa_webhook))
}
