//! Axum router configuration for composition endpoints.

use axum::{routing::post, Router};

use super::super::state::AppState;
use super::handlers::compose_text;

/// Composition routes, mounted at `/api/ai`.
pub fn compose_routes() -> Router<AppState> {
    Router::new().route("/compose", post(compose_text))
}
