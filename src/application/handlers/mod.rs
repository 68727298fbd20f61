//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod compose;
pub mod entitlement;
