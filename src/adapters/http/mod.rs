//! HTTP adapters - REST API implementations.
//!
//! Each area has its own adapter module; [`api_router`] mounts them all:
//! - `/api/webhooks` - payment-provider webhooks
//! - `/api/entitlements` - entitlement queries
//! - `/api/ai` - text composition
//! - `/health` - liveness

pub mod compose;
pub mod entitlement;
mod error;
mod state;
pub mod webhooks;

pub use error::ErrorResponse;
pub use state::{AppState, AppStateBuilder};

use axum::{routing::get, Router};

/// Complete API router with every route mounted.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api/webhooks", webhooks::webhook_routes())
        .nest("/api/entitlements", entitlement::entitlement_routes())
        .nest("/api/ai", compose::compose_routes())
}

async fn health() -> &'static str {
    "ok"
}
