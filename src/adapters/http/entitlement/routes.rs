//! Axum router configuration for entitlement endpoints.

use axum::{routing::get, Router};

use super::super::state::AppState;
use super::handlers::get_entitlement;

/// Entitlement routes, mounted at `/api/entitlements`.
pub fn entitlement_routes() -> Router<AppState> {
    Router::new().route("/:user_id", get(get_entitlement))
}
