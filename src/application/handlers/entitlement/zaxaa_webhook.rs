//! ZaxaaWebhookHandler - dispatches verified Zaxaa notifications to the lifecycle.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::webhooks::{
    BillingEvent, DispatchOutcome, WebhookDispatcher, WebhookError, ZaxaaEvent,
};
use crate::ports::ClaimToken;

use super::apply_billing_event::{
    ApplyBillingEventCommand, ApplyBillingEventHandler, ApplyBillingEventResult,
};

pub struct ZaxaaWebhookHandler {
    apply: Arc<ApplyBillingEventHandler>,
}

impl ZaxaaWebhookHandler {
    pub fn new(apply: Arc<ApplyBillingEventHandler>) -> Self {
        Self { apply }
    }
}

#[async_trait]
impl WebhookDispatcher<ZaxaaEvent> for ZaxaaWebhookHandler {
    async fn dispatch(
        &self,
        event: &ZaxaaEvent,
        claim: &ClaimToken,
    ) -> Result<DispatchOutcome, WebhookError> {
        let Some(kind) = event.parsed_type().billing_kind() else {
            tracing::debug!(
                receipt = %event.trans_receipt,
                trans_type = %event.trans_type,
                "Unhandled Zaxaa transaction type"
            );
            return Ok(DispatchOutcome::Ignored(format!(
                "unhandled transaction type {}",
                event.trans_type
            )));
        };

        let (user_id, product_type) = event.metadata().resolve()?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryEntitlementRepository;
    use crate::domain::entitlement::{EntitlementLifecycle, EntitlementStatus, ProductType};
    use crate::domain::foundation::UserId;
    use crate::domain::webhooks::WebhookProvider;
    use crate::ports::{EntitlementRepository, WebhookEventRecord};
    use serde_json::json;
    use std::time::Duration;

    /// A token for a claim that no claim store tracks.
    fn claim() -> ClaimToken {
        WebhookEventRecord::claim(WebhookProvider::Zaxaa, "evt_test", "test").token()
    }

    fn setup() -> (Arc<InMemoryEntitlementRepository>, ZaxaaWebhookHandler) {
        let repo = Arc::new(InMemoryEntitlementRepository::new());
        let apply = Arc::new(ApplyBillingEventHandler::new(
            EntitlementLifecycle::default(),
            repo.clone(),
            Duration::from_secs(5),
        ));
        (repo, ZaxaaWebhookHandler::new(apply))
    }

    fn notification(trans_type: &str) -> ZaxaaEvent {
        serde_json::from_value(json!({
            "trans_type": trans_type,
            "trans_receipt": "ZX-1001",
            "trans_amount": "49.00",
            "trans_currency": "usd",
            "subscription_id": "zsub_1",
            "product_name": "Pro Monthly",
            "custom": {"userId": "z1", "productType": "payment_plan"}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn sale_activates_and_records_plan() {
        let (repo, handler) = setup();

        let outcome = handler.dispatch(&notification("SALE"), &claim()).await.unwrap();

        assert_eq!(outcome, DispatchOutcome::Applied);
        let e = repo
            .find_by_user_id(&UserId::new("z1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(e.status, EntitlementStatus::Active);
        assert_eq!(e.product_type, Some(ProductType::PaymentPlan));
        assert_eq!(e.zaxaa_subscription_id.as_deref(), Some("zsub_1"));
        assert_eq!(e.plan_amount, Some(4900));
        assert_eq!(e.currency, "USD");
    }

    #[tokio::test]
    async fn rebill_failure_increments_delinquency() {
        let (repo, handler) = setup();

        handler.dispatch(&notification("SALE"), &claim()).await.unwrap();
        handler.dispatch(&notification("rebill_failed"), &claim()).await.unwrap();

        let e = repo
            .find_by_user_id(&UserId::new("z1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(e.status, EntitlementStatus::PastDue);
        assert_eq!(e.delinquency_count, 1);
        assert!(e.revoke_at.is_some());
    }

    #[tokio::test]
    async fn unknown_transaction_type_is_ignored() {
        let (repo, handler) = setup();

        let outcome = handler.dispatch(&notification("UPSELL_VIEW"), &claim()).await.unwrap();

        assert!(matches!(outcome, DispatchOutcome::Ignored(_)));
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn missing_user_id_is_skippable() {
        let (_repo, handler) = setup();
        let event: ZaxaaEvent = serde_json::from_value(json!({
            "trans_type": "SALE",
            "trans_receipt": "ZX-2",
            "productType": "monthly"
        }))
        .unwrap();

        let err = handler.dispatch(&event, &claim()).await.unwrap_err();

        assert!(matches!(err, WebhookError::MissingMetadata("userId")));
    }
}
