//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresEntitlementRepository` - Atomic merge-patch upsert of entitlements
//! - `PostgresWebhookEventRepository` - Webhook idempotency claims

mod entitlement_repository;
mod webhook_event_repository;

pub use entitlement_repository::PostgresEntitlementRepository;
pub use webhook_event_repository::PostgresWebhookEventRepository;
