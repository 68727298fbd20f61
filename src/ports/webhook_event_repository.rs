//! WebhookEventRepository port - claims on delivered webhook events.
//!
//! Payment providers deliver at least once. Stripe and Zaxaa both redeliver after
//! network timeouts or a 5xx from our endpoint, so the same event can arrive twice,
//! sometimes concurrently. A claim row keyed by `(provider, event_id)` is inserted before
//! the event is applied; whoever inserts it first applies the event.
//!
//! ## Claim lifecycle
//!
//! ```text
//! claim() ──Inserted | Reclaimed──> apply ──ok──> mark_completed(applied | ignored)
//!                                          └─err─> release()   (redelivery may retry)
//!        └─AlreadyExists──> acknowledge as duplicate
//! ```
//!
//! A claim left in `processing` (the handler future was dropped, or the process died) is
//! taken over by the next delivery once it is older than the lease. Every later write on
//! a claim is fenced by its [`ClaimToken`], so a stale holder cannot complete or release
//! a claim that was taken over.

use async_trait::async_trait;
use std::fmt;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::webhooks::WebhookProvider;

/// Final (or in-flight) state of a claimed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Claimed, not yet finished.
    Processing,
    /// Entitlement was updated.
    Applied,
    /// Acknowledged without changing anything.
    Ignored,
}

impl WebhookOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookOutcome::Processing => "processing",
            WebhookOutcome::Applied => "applied",
            WebhookOutcome::Ignored => "ignored",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(WebhookOutcome::Processing),
            "applied" => Some(WebhookOutcome::Applied),
            "ignored" => Some(WebhookOutcome::Ignored),
            _ => None,
        }
    }
}

impl fmt::Display for WebhookOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of a claimed webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEventRecord {
    pub provider: WebhookProvider,
    pub event_id: String,
    pub event_type: String,
    pub outcome: WebhookOutcome,
    /// Reason an event was ignored.
    pub detail: Option<String>,
    pub received_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl WebhookEventRecord {
    /// A fresh claim in the `processing` state.
    ///
    /// `received_at` is kept at microsecond precision so the token matches what Postgres stores.
    pub fn claim(
        provider: WebhookProvider,
        event_id: impl Into<String>,
        event_type: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            event_id: event_id.into(),
            event_type: event_type.into(),
            outcome: WebhookOutcome::Processing,
            detail: None,
            received_at: Timestamp::now().truncated_to_micros(),
            completed_at: None,
        }
    }

    pub fn token(&self) -> ClaimToken {
        ClaimToken {
            provider: self.provider,
            event_id: self.event_id.clone(),
            claimed_at: self.received_at,
        }
    }
}

/// Identifies one holder of a claim. A reclaim issues a new `claimed_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimToken {
    pub provider: WebhookProvider,
    pub event_id: String,
    pub claimed_at: Timestamp,
}

/// Result of attempting to claim a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Claim inserted; this caller applies the event.
    Inserted,
    /// A stale `processing` claim was taken over; this caller applies the event.
    Reclaimed,
    /// Another delivery already claimed it.
    AlreadyExists,
}

impl SaveResult {
    pub fn is_owned(&self) -> bool {
        matches!(self, SaveResult::Inserted | SaveResult::Reclaimed)
    }
}

/// Port for claiming and completing webhook events.
///
/// Implementations must arbitrate concurrent claims with a uniqueness constraint on
/// `(provider, event_id)`, never with a read-then-write check.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Inserts a claim unless one exists.
    ///
    /// An existing claim still `processing` with `received_at` before `stale_before` is
    /// overwritten by `record` and reported as [`SaveResult::Reclaimed`].
    async fn claim(
        &self,
        record: WebhookEventRecord,
        stale_before: Timestamp,
    ) -> Result<SaveResult, DomainError>;

    /// Records the final outcome of a claim. No-op if `token` no longer holds it.
    async fn mark_completed(
        &self,
        token: &ClaimToken,
        outcome: WebhookOutcome,
        detail: Option<String>,
    ) -> Result<(), DomainError>;

    /// Drops a `processing` claim so a redelivery can try again. No-op if `token` no
    /// longer holds it.
    async fn release(&self, token: &ClaimToken) -> Result<(), DomainError>;

    async fn find(
        &self,
        provider: WebhookProvider,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError>;

    /// Deletes records received before `cutoff`. Returns the number deleted.
    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, DomainError>;
}

/// Result of webhook processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookResult {
    /// Event changed an entitlement.
    Applied,
    /// Event acknowledged without changes.
    Ignored(String),
    /// Event was already claimed by an earlier delivery.
    Duplicate,
}

impl WebhookResult {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, WebhookResult::Duplicate)
    }
}
