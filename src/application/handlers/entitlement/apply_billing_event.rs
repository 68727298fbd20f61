//! ApplyBillingEventHandler - Command handler that turns a billing event into an
//! entitlement upsert.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::entitlement::{Entitlement, EntitlementError, EntitlementLifecycle};
use crate::domain::foundation::Timestamp;
use crate::domain::webhooks::BillingEvent;
use crate::ports::{ClaimToken, EntitlementRepository};

/// Command to apply one billing event.
#[derive(Debug, Clone)]
pub struct ApplyBillingEventCommand {
    pub event: BillingEvent,
    /// Clock reading used for revocation dates.
    pub now: Timestamp,
    /// Webhook claim completed together with the write.
    pub claim: Option<ClaimToken>,
}

impl ApplyBillingEventCommand {
    pub fn new(event: BillingEvent) -> Self {
        Self {
            event,
            now: Timestamp::now(),
            claim: None,
        }
    }

    pub fn claimed_by(mut self, claim: ClaimToken) -> Self {
        self.claim = Some(claim);
        self
    }

    pub fn at(mut self, now: Timestamp) -> Self {
        self.now = now;
        self
    }
}

/// Result of applying a billing event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyBillingEventResult {
    /// The row was created or merged; carries the stored state.
    Updated(Entitlement),
    /// The event leaves the row untouched (lifetime refunds).
    Unchanged,
}

pub struct ApplyBillingEventHandler {
    lifecycle: EntitlementLifecycle,
    repository: Arc<dyn EntitlementRepository>,
    persistence_timeout: Duration,
}

impl ApplyBillingEventHandler {
    pub fn new(
        lifecycle: EntitlementLifecycle,
        repository: Arc<dyn EntitlementRepository>,
        persistence_timeout: Duration,
    ) -> Self {
        Self {
            lifecycle,
            repository,
            persistence_timeout,
        }
    }

    pub async fn handle(
        &self,
        cmd: ApplyBillingEventCommand,
    ) -> Result<ApplyBillingEventResult, EntitlementError> {
        let event = &cmd.event;
        let Some(patch) = self.lifecycle.patch_for(
            event.kind,
            event.product_type,
            &event.references,
            cmd.now,
        ) else {
            tracing::info!(
                user_id = %event.user_id,
                kind = %event.kind,
                product_type = %event.product_type,
                "Billing event leaves entitlement unchanged"
            );
            return Ok(ApplyBillingEventResult::Unchanged);
        };

        let write = async {
            match &cmd.claim {
                Some(claim) => {
                    self.repository
                        .upsert_claimed(&event.user_id, &patch, claim)
                        .await
                }
                None => self.repository.upsert(&event.user_id, &patch).await,
            }
        };
        let entitlement = tokio::time::timeout(self.persistence_timeout, write)
            .await
            .map_err(|_| EntitlementError::Timeout(self.persistence_timeout.as_secs()))??;

        tracing::info!(
            user_id = %event.user_id,
            kind = %event.kind,
            product_type = %event.product_type,
            status = %entitlement.status,
            delinquency_count = entitlement.delinquency_count,
            "Entitlement updated"
        );

        Ok(ApplyBillingEventResult::Updated(entitlement))
    }
}
