//! Subscription metadata source.
//!
//! Invoices, charges and disputes do not always carry the CRM metadata set at checkout.
//! When they reference a subscription, its metadata is fetched from the provider.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::webhooks::BillingMetadata;

#[async_trait]
pub trait SubscriptionMetadataSource: Send + Sync {
    /// Metadata attached to the subscription.
    ///
    /// Returns `Ok(None)` when the provider does not know the subscription.
    ///
    /// # Errors
    ///
    /// - `ProviderError` on API failure
    /// - `Timeout` when the call exceeds its budget
    async fn subscription_metadata(
        &self,
        subscription_id: &str,
    ) -> Result<Option<BillingMetadata>, DomainError>;
}
