//! In-memory EntitlementRepository.
//!
//! The whole merge runs under one write lock, which gives the same no-lost-update
//! guarantee as the Postgres upsert. With a claim store attached, `upsert_claimed` also
//! holds the claim table lock, so the claim completion and the merge are one step.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::webhook_event_repository::{mark_applied, InMemoryWebhookEventRepository};
use crate::domain::entitlement::{Entitlement, EntitlementPatch};
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::ports::{ClaimToken, EntitlementRepository};

#[derive(Default)]
pub struct InMemoryEntitlementRepository {
    rows: RwLock<HashMap<UserId, Entitlement>>,
    claims: Option<Arc<InMemoryWebhookEventRepository>>,
}

impl InMemoryEntitlementRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completes webhook claims in `claims` together with `upsert_claimed` writes.
    pub fn with_claims(claims: Arc<InMemoryWebhookEventRepository>) -> Self {
        Self {
            rows: RwLock::default(),
            claims: Some(claims),
        }
    }

    async fn merge(
        &self,
        user_id: &UserId,
        patch: &EntitlementPatch,
        now: Timestamp,
    ) -> Entitlement {
        let mut rows = self.rows.write().await;
        rows.entry(user_id.clone())
            .and_modify(|existing| existing.apply(patch, now))
            .or_insert_with(|| Entitlement::from_patch(user_id.clone(), patch, now))
            .clone()
    }

    /// Number of stored rows.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl EntitlementRepository for InMemoryEntitlementRepository {
    async fn upsert(
        &self,
        user_id: &UserId,
        patch: &EntitlementPatch,
    ) -> Result<Entitlement, DomainError> {
        Ok(self.merge(user_id, patch, Timestamp::now()).await)
    }

    async fn upsert_claimed(
        &self,
        user_id: &UserId,
        patch: &EntitlementPatch,
        claim: &ClaimToken,
    ) -> Result<Entitlement, DomainError> {
        let now = Timestamp::now();
        let Some(store) = &self.claims else {
            return Ok(self.merge(user_id, patch, now).await);
        };

        let mut table = store.lock_claims().await;
        if !mark_applied(&mut table, claim, now) {
            return Err(DomainError::conflict(format!(
                "Webhook claim {} {} is no longer held",
                claim.provider, claim.event_id
            )));
        }
        Ok(self.merge(user_id, patch, now).await)
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<Entitlement>, DomainError> {
        Ok(self.rows.read().await.get(user_id).cloned())
    }
}
