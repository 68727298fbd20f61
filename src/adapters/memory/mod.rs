//! In-memory adapters for tests and local runs without a database.

mod entitlement_repository;
mod webhook_event_repository;

pub use entitlement_repository::InMemoryEntitlementRepository;
pub use webhook_event_repository::InMemoryWebhookEventRepository;
