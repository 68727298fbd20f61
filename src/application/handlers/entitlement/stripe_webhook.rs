//! StripeWebhookHandler - dispatches verified Stripe events to the lifecycle.
//!
//! `userId` / `productType` are read from the event object's metadata, then from
//! `subscription_details.metadata`, then from the referenced subscription itself.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::webhooks::{
    BillingEvent, BillingMetadata, DispatchOutcome, StripeEvent, WebhookDispatcher, WebhookError,
};
use crate::ports::{ClaimToken, SubscriptionMetadataSource};

use super::apply_billing_event::{
    ApplyBillingEventCommand, ApplyBillingEventHandler, ApplyBillingEventResult,
};

pub struct StripeWebhookHandler {
    apply: Arc<ApplyBillingEventHandler>,
    metadata_source: Option<Arc<dyn SubscriptionMetadataSource>>,
    metadata_timeout: Duration,
}

impl StripeWebhookHandler {
    pub fn new(apply: Arc<ApplyBillingEventHandler>) -> Self {
        Self {
            apply,
            metadata_source: None,
            metadata_timeout: Duration::from_secs(5),
        }
    }

    /// Enables the subscription lookup for events without inline metadata.
    pub fn with_metadata_source(
        mut self,
        source: Arc<dyn SubscriptionMetadataSource>,
        timeout: Duration,
    ) -> Self {
        self.metadata_source = Some(source);
        self.metadata_timeout = timeout;
        self
    }

    async fn resolve_metadata(&self, event: &StripeEvent) -> Result<BillingMetadata, WebhookError> {
        let inline = event.inline_metadata();
        if inline.is_complete() {
            return Ok(inline);
        }

        let (Some(source), Some(subscription_id)) = (&self.metadata_source, event.subscription_id())
        else {
            return Ok(inline);
        };

        let fetched = tokio::time::timeout(
            self.metadata_timeout,
            source.subscription_metadata(&subscription_id),
        )
        .await
        .map_err(|_| WebhookError::Timeout(self.metadata_timeout.as_secs()))?
        .map_err(|e| {
            tracing::warn!(
                event_id = %event.id,
                subscription_id = %subscription_id,
                error = %e,
                "Subscription metadata lookup failed"
            );
            WebhookError::from(e)
        })?;

        Ok(inline.or(fetched.unwrap_or_default()))
    }
}

#[async_trait]
impl WebhookDispatcher<StripeEvent> for StripeWebhookHandler {
    async fn dispatch(
        &self,
        event: &StripeEvent,
        claim: &ClaimToken,
    ) -> Result<DispatchOutcome, WebhookError> {
        let Some(kind) = event.parsed_type().billing_kind() else {
            tracing::debug!(
                event_id = %event.id,
                event_type = %event.event_type,
                "Unhandled Stripe event type"
            );
            return Ok(DispatchOutcome::Ignored(format!(
                "unhandled event type {}",
                event.event_type
            )));
        };

        let (user_id, product_type) = self.resolve_metadata(event).await?.resolve()?;
        let billing_event = BillingEvent {
            kind,
            user_id,
            product_type,
            references: event.references(),
        };

        match self
            .apply
            .handle(ApplyBillingEventCommand::new(billing_event).claimed_by(claim.clone()))
            .await?
        {
            ApplyBillingEventResult::Updated(_) => Ok(DispatchOutcome::Applied),
            ApplyBillingEventResult::Unchanged => Ok(DispatchOutcome::Ignored(format!(
                "{} does not change a {} entitlement",
                kind, product_type
            ))),
        }
    }
}
