//! HTTP adapter for entitlement queries.
//!
//! - `GET /api/entitlements/:user_id` - stored entitlement plus `is_active`

pub mod handlers;
pub mod routes;

pub use handlers::{get_entitlement, EntitlementApiError};
pub use routes::entitlement_routes;
