//! Stripe API adapters.

mod metadata_client;

pub use metadata_client::{StripeApiConfig, StripeMetadataClient};
