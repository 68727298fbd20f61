//! PostgreSQL implementation of WebhookEventRepository.
//!
//! Claims are arbitrated by the `(provider, event_id)` primary key. The conflict arm only
//! overwrites a `processing` row older than the lease, so exactly one delivery gets a row
//! back. Completion and release match on `received_at`, which acts as the claim's fencing
//! token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::domain::webhooks::WebhookProvider;
use crate::ports::{ClaimToken, SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookOutcome};

pub struct PostgresWebhookEventRepository {
    pool: PgPool,
}

impl PostgresWebhookEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WebhookEventRow {
    provider: String,
    event_id: String,
    event_type: String,
    outcome: String,
    detail: Option<String>,
    received_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<WebhookEventRow> for WebhookEventRecord {
    type Error = DomainError;

    fn try_from(row: WebhookEventRow) -> Result<Self, Self::Error> {
        let provider = match row.provider.as_str() {
            "stripe" => WebhookProvider::Stripe,
            "zaxaa" => WebhookProvider::Zaxaa,
            other => {
                return Err(DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Invalid provider value: {}", other),
                ))
            }
        };
        let outcome = WebhookOutcome::parse(&row.outcome).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid outcome value: {}", row.outcome),
            )
        })?;

        Ok(WebhookEventRecord {
            provider,
            event_id: row.event_id,
            event_type: row.event_type,
            outcome,
            detail: row.detail,
            received_at: Timestamp::from_datetime(row.received_at),
            completed_at: row.completed_at.map(Timestamp::from_datetime),
        })
    }
}

fn db_error(action: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Failed to {} webhook event: {}", action, e),
    )
}

/// Marks a still-held `processing` claim as applied. Binds provider, event_id, claimed_at, now.
pub(super) const MARK_APPLIED_SQL: &str = r#"
    UPDATE processed_webhook_events
    SET outcome = 'applied', detail = NULL, completed_at = $4
    WHERE provider = $1 AND event_id = $2 AND received_at = $3 AND outcome = 'processing'
"#;

#[async_trait]
impl WebhookEventRepository for PostgresWebhookEventRepository {
    async fn claim(
        &self,
        record: WebhookEventRecord,
        stale_before: Timestamp,
    ) -> Result<SaveResult, DomainError> {
        // `xmax = 0` only for a freshly inserted tuple; no row when the conflict filter fails.
        let inserted: Option<bool> = sqlx::query_scalar(
            r#"
            INSERT INTO processed_webhook_events (
                provider, event_id, event_type, outcome, detail, received_at, completed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (provider, event_id) DO UPDATE SET
                event_type = EXCLUDED.event_type,
                outcome = EXCLUDED.outcome,
                detail = EXCLUDED.detail,
                received_at = EXCLUDED.received_at,
                completed_at = EXCLUDED.completed_at
            WHERE processed_webhook_events.outcome = 'processing'
              AND processed_webhook_events.received_at < $8
            RETURNING (xmax = 0)
            "#,
        )
        .bind(record.provider.as_str())
        .bind(&record.event_id)
        .bind(&record.event_type)
        .bind(record.outcome.as_str())
        .bind(&record.detail)
        .bind(record.received_at.as_datetime())
        .bind(record.completed_at.map(|t| *t.as_datetime()))
        .bind(stale_before.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("claim", e))?;

        Ok(match inserted {
            Some(true) => SaveResult::Inserted,
            Some(false) => SaveResult::Reclaimed,
            None => SaveResult::AlreadyExists,
        })
    }

    async fn mark_completed(
        &self,
        token: &ClaimToken,
        outcome: WebhookOutcome,
        detail: Option<String>,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE processed_webhook_events
            SET outcome = $4, detail = $5, completed_at = $6
            WHERE provider = $1 AND event_id = $2 AND received_at = $3
            "#,
        )
        .bind(token.provider.as_str())
        .bind(&token.event_id)
        .bind(token.claimed_at.as_datetime())
        .bind(outcome.as_str())
        .bind(detail)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("complete", e))?;

        if result.rows_affected() == 0 {
            tracing::warn!(
                provider = %token.provider,
                event_id = %token.event_id,
                "Webhook claim no longer held; completion skipped"
            );
        }
        Ok(())
    }

    async fn release(&self, token: &ClaimToken) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            DELETE FROM processed_webhook_events
            WHERE provider = $1 AND event_id = $2 AND received_at = $3
              AND outcome = 'processing'
            "#,
        )
        .bind(token.provider.as_str())
        .bind(&token.event_id)
        .bind(token.claimed_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("release", e))?;

        Ok(())
    }

    async fn find(
        &self,
        provider: WebhookProvider,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError> {
        let row: Option<WebhookEventRow> = sqlx::query_as(
            r#"
            SELECT provider, event_id, event_type, outcome, detail, received_at, completed_at
            FROM processed_webhook_events
            WHERE provider = $1 AND event_id = $2
            "#,
        )
        .bind(provider.as_str())
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find", e))?;

        row.map(WebhookEventRecord::try_from).transpose()
    }

    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM processed_webhook_events WHERE received_at < $1")
            .bind(cutoff.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete", e))?;

        Ok(result.rows_affected())
    }
}
