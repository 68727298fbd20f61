//! In-memory WebhookEventRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{RwLock, RwLockWriteGuard};

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::webhooks::WebhookProvider;
use crate::ports::{
    ClaimToken, SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookOutcome,
};

type Key = (WebhookProvider, String);

pub(super) type ClaimTable = HashMap<Key, WebhookEventRecord>;

#[derive(Default)]
pub struct InMemoryWebhookEventRepository {
    records: RwLock<ClaimTable>,
}

impl InMemoryWebhookEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write access to the claim table for writes that commit together with a claim.
    pub(super) async fn lock_claims(&self) -> RwLockWriteGuard<'_, ClaimTable> {
        self.records.write().await
    }
}

fn key(token: &ClaimToken) -> Key {
    (token.provider, token.event_id.clone())
}

/// The record `token` still holds, in any state.
fn held_mut<'a>(
    table: &'a mut ClaimTable,
    token: &ClaimToken,
) -> Option<&'a mut WebhookEventRecord> {
    table
        .get_mut(&key(token))
        .filter(|record| record.received_at == token.claimed_at)
}

/// Marks a `processing` claim held by `token` as applied. Returns false if it is not held.
pub(super) fn mark_applied(table: &mut ClaimTable, token: &ClaimToken, now: Timestamp) -> bool {
    match held_mut(table, token) {
        Some(record) if record.outcome == WebhookOutcome::Processing => {
            record.outcome = WebhookOutcome::Applied;
            record.detail = None;
            record.completed_at = Some(now);
            true
        }
        _ => false,
    }
}

#[async_trait]
impl WebhookEventRepository for InMemoryWebhookEventRepository {
    async fn claim(
        &self,
        record: WebhookEventRecord,
        stale_before: Timestamp,
    ) -> Result<SaveResult, DomainError> {
        let mut records = self.records.write().await;
        let key = (record.provider, record.event_id.clone());
        let result = match records.get(&key) {
            None => SaveResult::Inserted,
            Some(existing)
                if existing.outcome == WebhookOutcome::Processing
                    && existing.received_at.is_before(&stale_before) =>
            {
                SaveResult::Reclaimed
            }
            Some(_) => return Ok(SaveResult::AlreadyExists),
        };
        records.insert(key, record);
        Ok(result)
    }

    async fn mark_completed(
        &self,
        token: &ClaimToken,
        outcome: WebhookOutcome,
        detail: Option<String>,
    ) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        if let Some(record) = held_mut(&mut records, token) {
            record.outcome = outcome;
            record.detail = detail;
            record.completed_at = Some(Timestamp::now());
        }
        Ok(())
    }

    async fn release(&self, token: &ClaimToken) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        let processing = held_mut(&mut records, token)
            .map(|r| r.outcome == WebhookOutcome::Processing)
            .unwrap_or(false);
        if processing {
            records.remove(&key(token));
        }
        Ok(())
    }

    async fn find(
        &self,
        provider: WebhookProvider,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records.get(&(provider, event_id.to_string())).cloned())
    }

    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| !r.received_at.is_before(&cutoff));
        Ok((before - records.len()) as u64)
    }
}
