//! HTTP adapter for text composition.
//!
//! - `POST /api/ai/compose` - `{prompt}` -> `{text, provider}`

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{ComposeRequest, ComposeResponse};
pub use handlers::{compose_text, ComposeApiError};
pub use routes::compose_routes;
