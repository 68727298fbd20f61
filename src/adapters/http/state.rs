//! Shared application state for the HTTP adapters.

use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::ai::ProviderChain;
use crate::application::{
    ApplyBillingEventHandler, ComposeTextHandler, GetEntitlementHandler, StripeWebhookHandler,
    ZaxaaWebhookHandler,
};
use crate::domain::entitlement::EntitlementLifecycle;
use crate::domain::webhooks::{
    IdempotentWebhookProcessor, StripeWebhookVerifier, ZaxaaWebhookVerifier, DEFAULT_CLAIM_LEASE,
};
use crate::ports::{
    EntitlementRepository, GenerationChain, SubscriptionMetadataSource, WebhookEventRepository,
};

/// Cloned per request; every dependency sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub processor: IdempotentWebhookProcessor,
    /// `None` when no Stripe webhook secret is configured.
    pub stripe_verifier: Option<Arc<StripeWebhookVerifier>>,
    /// `None` when no Zaxaa webhook secret is configured.
    pub zaxaa_verifier: Option<Arc<ZaxaaWebhookVerifier>>,
    pub stripe_handler: Arc<StripeWebhookHandler>,
    pub zaxaa_handler: Arc<ZaxaaWebhookHandler>,
    pub entitlement_query: Arc<GetEntitlementHandler>,
    pub composer: Arc<ComposeTextHandler>,
}

/// Assembles an [`AppState`] from its ports.
///
/// ```ignore
/// let state = AppStateBuilder::new(entitlements, webhook_events)
///     .stripe_webhook_secret(config.payment.stripe_webhook_secret.clone())
///     .lifecycle(EntitlementLifecycle::new(RevocationPolicy::new(calendar)))
///     .build();
/// ```
pub struct AppStateBuilder {
    entitlement_repository: Arc<dyn EntitlementRepository>,
    webhook_event_repository: Arc<dyn WebhookEventRepository>,
    stripe_webhook_secret: Option<SecretString>,
    zaxaa_webhook_secret: Option<SecretString>,
    metadata_source: Option<(Arc<dyn SubscriptionMetadataSource>, Duration)>,
    lifecycle: EntitlementLifecycle,
    persistence_timeout: Duration,
    claim_lease: Duration,
    provider_chain: Option<Arc<dyn GenerationChain>>,
}

impl AppStateBuilder {
    pub fn new(
        entitlement_repository: Arc<dyn EntitlementRepository>,
        webhook_event_repository: Arc<dyn WebhookEventRepository>,
    ) -> Self {
        Self {
            entitlement_repository,
            webhook_event_repository,
            stripe_webhook_secret: None,
            zaxaa_webhook_secret: None,
            metadata_source: None,
            lifecycle: EntitlementLifecycle::default(),
            persistence_timeout: Duration::from_secs(10),
            claim_lease: DEFAULT_CLAIM_LEASE,
            provider_chain: None,
        }
    }

    pub fn stripe_webhook_secret(mut self, secret: Option<SecretString>) -> Self {
        self.stripe_webhook_secret = secret;
        self
    }

    pub fn zaxaa_webhook_secret(mut self, secret: Option<SecretString>) -> Self {
        self.zaxaa_webhook_secret = secret;
        self
    }

    pub fn metadata_source(
        mut self,
        source: Arc<dyn SubscriptionMetadataSource>,
        timeout: Duration,
    ) -> Self {
        self.metadata_source = Some((source, timeout));
        self
    }

    pub fn lifecycle(mut self, lifecycle: EntitlementLifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    pub fn persistence_timeout(mut self, timeout: Duration) -> Self {
        self.persistence_timeout = timeout;
        self
    }

    /// Age after which an abandoned `processing` webhook claim is taken over.
    /// Must be at least the request timeout.
    pub fn claim_lease(mut self, lease: Duration) -> Self {
        self.claim_lease = lease;
        self
    }

    pub fn provider_chain(mut self, chain: Arc<dyn GenerationChain>) -> Self {
        self.provider_chain = Some(chain);
        self
    }

    pub fn build(self) -> AppState {
        let apply = Arc::new(ApplyBillingEventHandler::new(
            self.lifecycle,
            self.entitlement_repository.clone(),
            self.persistence_timeout,
        ));

        let mut stripe_handler = StripeWebhookHandler::new(apply.clone());
        if let Some((source, timeout)) = self.metadata_source {
            stripe_handler = stripe_handler.with_metadata_source(source, timeout);
        }

        let chain: Arc<dyn GenerationChain> = match self.provider_chain {
            Some(chain) => chain,
            None => Arc::new(ProviderChain::new(Vec::new())),
        };
        let processor = IdempotentWebhookProcessor::new(self.webhook_event_repository)
            .with_claim_lease(self.claim_lease);

        AppState {
            processor,
            stripe_verifier: non_blank(self.stripe_webhook_secret)
                .map(|s| Arc::new(StripeWebhookVerifier::new(s))),
            zaxaa_verifier: non_blank(self.zaxaa_webhook_secret)
                .map(|s| Arc::new(ZaxaaWebhookVerifier::new(s))),
            stripe_handler: Arc::new(stripe_handler),
            zaxaa_handler: Arc::new(ZaxaaWebhookHandler::new(apply)),
            entitlement_query: Arc::new(GetEntitlementHandler::new(self.entitlement_repository)),
            composer: Arc::new(ComposeTextHandler::new(chain)),
        }
    }
}

fn non_blank(secret: Option<SecretString>) -> Option<String> {
    secret
        .map(|s| s.expose_secret().trim().to_string())
        .filter(|s| !s.is_empty())
}
