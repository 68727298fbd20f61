//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `entitlement` - Access status, revocation dates and billing-event transitions
//! - `webhooks` - Payment-provider payloads, signatures and idempotent processing

pub mod entitlement;
pub mod foundation;
pub mod webhooks;
