//! Webhook processor - idempotent dispatch of provider events.
//!
//! ## Steps
//!
//! 1. Claim `(provider, event_id)`; an existing claim means a duplicate delivery
//! 2. Dispatch the event to the lifecycle handler
//! 3. Mark the claim `applied` or `ignored`, or release it on failure so the
//!    provider's redelivery can retry
//!
//! ## Race Condition Handling
//!
//! When deliveries of one event arrive simultaneously, the claim insert is arbitrated
//! by the primary key: the first insert wins and the rest are acknowledged as duplicates.
//!
//! ## Abandoned Claims
//!
//! A handler future can be dropped between claim and completion (request timeout, client
//! disconnect, crash), leaving the claim `processing`. Once it is older than the claim
//! lease, the next delivery reclaims it. The lease must exceed the longest time a live
//! handler can hold a claim, which is the request timeout.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::ports::{
    ClaimToken, SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookOutcome,
    WebhookResult,
};

use super::billing_event::WebhookEnvelope;
use super::errors::WebhookError;

/// What a dispatcher did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Applied,
    Ignored(String),
}

/// Applies one provider event `E`.
///
/// Skippable errors (`MissingMetadata`, `UnknownProductType`) are acknowledged by the
/// processor; every other error releases the claim.
///
/// Dispatchers that write entitlements pass `claim` to
/// [`EntitlementRepository::upsert_claimed`](crate::ports::EntitlementRepository::upsert_claimed)
/// so the write and the claim completion commit together.
#[async_trait]
pub trait WebhookDispatcher<E: Sync + ?Sized>: Send + Sync {
    async fn dispatch(&self, event: &E, claim: &ClaimToken)
        -> Result<DispatchOutcome, WebhookError>;
}

/// Default age after which a `processing` claim may be taken over.
pub const DEFAULT_CLAIM_LEASE: Duration = Duration::from_secs(60);

/// Processes webhook events at most once per `(provider, event_id)`.
#[derive(Clone)]
pub struct IdempotentWebhookProcessor {
    repository: Arc<dyn WebhookEventRepository>,
    claim_lease: Duration,
}

impl IdempotentWebhookProcessor {
    pub fn new(repository: Arc<dyn WebhookEventRepository>) -> Self {
        Self {
            repository,
            claim_lease: DEFAULT_CLAIM_LEASE,
        }
    }

    pub fn with_claim_lease(mut self, lease: Duration) -> Self {
        self.claim_lease = lease;
        self
    }

    /// Process a webhook event exactly once.
    ///
    /// # Returns
    ///
    /// - `Ok(WebhookResult::Applied)` - the entitlement was updated
    /// - `Ok(WebhookResult::Ignored(_))` - acknowledged without changes
    /// - `Ok(WebhookResult::Duplicate)` - an earlier delivery already claimed it
    /// - `Err(_)` - processing failed and the claim was released, unless the entitlement
    ///   write had already committed
    pub async fn process<E, D>(
        &self,
        envelope: &WebhookEnvelope,
        event: &E,
        dispatcher: &D,
    ) -> Result<WebhookResult, WebhookError>
    where
        E: Sync + ?Sized,
        D: WebhookDispatcher<E> + ?Sized,
    {
        let claim = WebhookEventRecord::claim(
            envelope.provider,
            envelope.event_id.clone(),
            envelope.event_type.clone(),
        );
        let token = claim.token();
        let stale_before = claim.received_at.minus_elapsed(self.claim_lease);
        match self.repository.claim(claim, stale_before).await? {
            SaveResult::Inserted => {}
            SaveResult::Reclaimed => tracing::warn!(
                provider = %envelope.provider,
                event_id = %envelope.event_id,
                event_type = %envelope.event_type,
                lease_secs = self.claim_lease.as_secs(),
                "Reclaimed abandoned webhook claim"
            ),
            SaveResult::AlreadyExists => {
                tracing::info!(
                    provider = %envelope.provider,
                    event_id = %envelope.event_id,
                    event_type = %envelope.event_type,
                    "Duplicate webhook delivery acknowledged"
                );
                return Ok(WebhookResult::Duplicate);
            }
        }

        let (outcome, detail, result) = match dispatcher.dispatch(event, &token).await {
            Ok(DispatchOutcome::Applied) => {
                (WebhookOutcome::Applied, None, WebhookResult::Applied)
            }
            Ok(DispatchOutcome::Ignored(reason)) => (
                WebhookOutcome::Ignored,
                Some(reason.clone()),
                WebhookResult::Ignored(reason),
            ),
            Err(err) if err.is_skippable() => {
                tracing::warn!(
                    provider = %envelope.provider,
                    event_id = %envelope.event_id,
                    event_type = %envelope.event_type,
                    error = %err,
                    "Webhook event skipped"
                );
                let reason = err.to_string();
                (
                    WebhookOutcome::Ignored,
                    Some(reason.clone()),
                    WebhookResult::Ignored(reason),
                )
            }
            Err(err) => {
                tracing::error!(
                    provider = %envelope.provider,
                    event_id = %envelope.event_id,
                    event_type = %envelope.event_type,
                    error = %err,
                    "Webhook processing failed, releasing claim"
                );
                if let Err(release_err) = self.repository.release(&token).await {
                    tracing::error!(
                        provider = %envelope.provider,
                        event_id = %envelope.event_id,
                        error = %release_err,
                        "Failed to release webhook claim"
                    );
                }
                return Err(err);
            }
        };

        // Entitlement writes already completed the claim; failures here are logged only.
        if let Err(err) = self.repository.mark_completed(&token, outcome, detail).await {
            tracing::error!(
                provider = %envelope.provider,
                event_id = %envelope.event_id,
                error = %err,
                "Failed to mark webhook claim completed"
            );
        }

        Ok(result)
    }
}
