//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `EntitlementRepository` - Atomic merge-patch upsert of entitlements
//! - `WebhookEventRepository` - Webhook idempotency claims
//!
//! ## Provider Ports
//!
//! - `SubscriptionMetadataSource` - Stripe subscription metadata lookup
//! - `TextGenerator` - Prompt-to-text generation (OpenAI, Gemini, template)
//! - `GenerationChain` - Prioritized generators answering with the first success

mod entitlement_repository;
mod subscription_metadata;
mod text_generator;
mod webhook_event_repository;

pub use entitlement_repository::EntitlementRepository;
pub use subscription_metadata::SubscriptionMetadataSource;
pub use text_generator::{GeneratedText, GenerationChain, GenerationError, TextGenerator};
pub use webhook_event_repository::{
    ClaimToken, SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookOutcome, WebhookResult,
};
