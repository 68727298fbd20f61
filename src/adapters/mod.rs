//! Adapters - Implementations of port interfaces.
//!
//! - `ai` - text generators and the provider chain
//! - `http` - axum routes for webhooks, entitlements and composition
//! - `memory` - in-memory repositories for tests and local runs
//! - `postgres` - sqlx repositories
//! - `stripe` - Stripe API client for subscription metadata

pub mod ai;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;
