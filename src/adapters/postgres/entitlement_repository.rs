//! PostgreSQL implementation of EntitlementRepository.
//!
//! The upsert is one `INSERT ... ON CONFLICT (user_id) DO UPDATE ... RETURNING` statement.
//! Absent patch fields are bound as NULL and fall back to the stored value with
//! `COALESCE`; `revoke_at` carries a separate "supplied" flag because NULL is a valid
//! value for it; delinquency increments are computed from the stored count.
//!
//! `upsert_claimed` runs the same statement in a transaction that first marks the webhook
//! claim applied, so the entitlement write and the claim completion commit together.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::domain::entitlement::{
    DelinquencyUpdate, Entitlement, EntitlementPatch, EntitlementStatus, ProductType,
    RevokeAtUpdate,
};
use crate::domain::foundation::{DomainError, EntitlementId, ErrorCode, Timestamp, UserId};
use crate::ports::{ClaimToken, EntitlementRepository};

use super::webhook_event_repository::MARK_APPLIED_SQL;

pub struct PostgresEntitlementRepository {
    pool: PgPool,
}

impl PostgresEntitlementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an entitlement.
#[derive(Debug, sqlx::FromRow)]
struct EntitlementRow {
    id: Uuid,
    user_id: String,
    status: String,
    product_type: Option<String>,
    revoke_at: Option<DateTime<Utc>>,
    last_invoice_status: Option<String>,
    delinquency_count: i32,
    stripe_subscription_id: Option<String>,
    stripe_customer_id: Option<String>,
    zaxaa_subscription_id: Option<String>,
    plan_name: Option<String>,
    plan_amount: Option<i64>,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EntitlementRow> for Entitlement {
    type Error = DomainError;

    fn try_from(row: EntitlementRow) -> Result<Self, Self::Error> {
        let status: EntitlementStatus = row.status.parse().map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid status value: {}", e))
        })?;
        let product_type = row
            .product_type
            .as_deref()
            .map(str::parse::<ProductType>)
            .transpose()
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Invalid product_type value: {}", e),
                )
            })?;
        let delinquency_count = u32::try_from(row.delinquency_count).map_err(|_| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Negative delinquency_count: {}", row.delinquency_count),
            )
        })?;

        Ok(Entitlement {
            id: EntitlementId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
            })?,
            status,
            product_type,
            revoke_at: row.revoke_at.map(Timestamp::from_datetime),
            last_invoice_status: row.last_invoice_status,
            delinquency_count,
            stripe_subscription_id: row.stripe_subscription_id,
            stripe_customer_id: row.stripe_customer_id,
            zaxaa_subscription_id: row.zaxaa_subscription_id,
            plan_name: row.plan_name,
            plan_amount: row.plan_amount,
            currency: row.currency,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

/// `(supplied, value)` for the revoke_at column.
fn revoke_at_binding(update: Option<RevokeAtUpdate>) -> (bool, Option<DateTime<Utc>>) {
    match update {
        None => (false, None),
        Some(RevokeAtUpdate::Clear) => (true, None),
        Some(RevokeAtUpdate::At(at)) => (true, Some(*at.as_datetime())),
    }
}

/// `(mode, value)` for the delinquency_count column.
fn delinquency_binding(
    update: Option<DelinquencyUpdate>,
) -> Result<(Option<&'static str>, Option<i32>), DomainError> {
    Ok(match update {
        None => (None, None),
        Some(DelinquencyUpdate::Reset) => (Some("reset"), None),
        Some(DelinquencyUpdate::Increment) => (Some("increment"), None),
        Some(DelinquencyUpdate::Set(n)) => {
            let n = i32::try_from(n).map_err(|_| {
                DomainError::validation("delinquency_count", "value exceeds storage range")
            })?;
            (Some("set"), Some(n))
        }
    })
}

const UPSERT_SQL: &str = r#"
    INSERT INTO entitlements (
        id, user_id, status, product_type, revoke_at, last_invoice_status, delinquency_count,
        stripe_subscription_id, stripe_customer_id, zaxaa_subscription_id,
        plan_name, plan_amount, currency, created_at, updated_at
    ) VALUES (
        $1, $2,
        COALESCE($3::text, 'inactive'),
        $4::text,
        CASE WHEN $5::boolean THEN $6::timestamptz ELSE NULL END,
        $7::text,
        CASE $8::text WHEN 'set' THEN $9::integer WHEN 'increment' THEN 1 ELSE 0 END,
        $10, $11, $12, $13, $14,
        COALESCE($15::text, 'USD'),
        $16, $16
    )
    ON CONFLICT (user_id) DO UPDATE SET
        status = COALESCE($3::text, entitlements.status),
        product_type = COALESCE($4::text, entitlements.product_type),
        revoke_at = CASE WHEN $5::boolean THEN $6::timestamptz ELSE entitlements.revoke_at END,
        last_invoice_status = COALESCE($7::text, entitlements.last_invoice_status),
        delinquency_count = CASE $8::text
            WHEN 'reset' THEN 0
            WHEN 'set' THEN $9::integer
            WHEN 'increment' THEN entitlements.delinquency_count + 1
            ELSE entitlements.delinquency_count
        END,
        stripe_subscription_id = COALESCE($10, entitlements.stripe_subscription_id),
        stripe_customer_id = COALESCE($11, entitlements.stripe_customer_id),
        zaxaa_subscription_id = COALESCE($12, entitlements.zaxaa_subscription_id),
        plan_name = COALESCE($13, entitlements.plan_name),
        plan_amount = COALESCE($14, entitlements.plan_amount),
        currency = COALESCE($15::text, entitlements.currency),
        updated_at = $16
    RETURNING id, user_id, status, product_type, revoke_at, last_invoice_status,
              delinquency_count, stripe_subscription_id, stripe_customer_id,
              zaxaa_subscription_id, plan_name, plan_amount, currency, created_at, updated_at
"#;

type UpsertQuery<'q> = QueryAs<'q, Postgres, EntitlementRow, PgArguments>;

fn upsert_query<'q>(
    user_id: &'q UserId,
    patch: &'q EntitlementPatch,
    now: DateTime<Utc>,
) -> Result<UpsertQuery<'q>, DomainError> {
    let (revoke_supplied, revoke_at) = revoke_at_binding(patch.revoke_at);
    let (delinquency_mode, delinquency_value) = delinquency_binding(patch.delinquency)?;

    Ok(sqlx::query_as(UPSERT_SQL)
        .bind(*EntitlementId::new().as_uuid())
        .bind(user_id.as_str())
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.product_type.map(|p| p.as_str()))
        .bind(revoke_supplied)
        .bind(revoke_at)
        .bind(&patch.last_invoice_status)
        .bind(delinquency_mode)
        .bind(delinquency_value)
        .bind(&patch.stripe_subscription_id)
        .bind(&patch.stripe_customer_id)
        .bind(&patch.zaxaa_subscription_id)
        .bind(&patch.plan_name)
        .bind(patch.plan_amount)
        .bind(&patch.currency)
        .bind(now))
}

fn upsert_error(user_id: &UserId, e: sqlx::Error) -> DomainError {
    tracing::error!(user_id = %user_id, error = %e, "Entitlement upsert failed");
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Failed to upsert entitlement: {}", e),
    )
}

#[async_trait]
impl EntitlementRepository for PostgresEntitlementRepository {
    async fn upsert(
        &self,
        user_id: &UserId,
        patch: &EntitlementPatch,
    ) -> Result<Entitlement, DomainError> {
        let row = upsert_query(user_id, patch, Utc::now())?
            .fetch_one(&self.pool)
            .await
            .map_err(|e| upsert_error(user_id, e))?;

        Entitlement::try_from(row)
    }

    async fn upsert_claimed(
        &self,
        user_id: &UserId,
        patch: &EntitlementPatch,
        claim: &ClaimToken,
    ) -> Result<Entitlement, DomainError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(|e| upsert_error(user_id, e))?;

        // Row lock on the claim serializes against a concurrent reclaim.
        let marked = sqlx::query(MARK_APPLIED_SQL)
            .bind(claim.provider.as_str())
            .bind(&claim.event_id)
            .bind(claim.claimed_at.as_datetime())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| upsert_error(user_id, e))?;

        if marked.rows_affected() == 0 {
            tx.rollback().await.map_err(|e| upsert_error(user_id, e))?;
            return Err(DomainError::conflict(format!(
                "Webhook claim {} {} is no longer held",
                claim.provider, claim.event_id
            )));
        }

        let row = upsert_query(user_id, patch, now)?
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| upsert_error(user_id, e))?;
        tx.commit().await.map_err(|e| upsert_error(user_id, e))?;

        Entitlement::try_from(row)
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<Entitlement>, DomainError> {
        let row: Option<EntitlementRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, status, product_type, revoke_at, last_invoice_status,
                   delinquency_count, stripe_subscription_id, stripe_customer_id,
                   zaxaa_subscription_id, plan_name, plan_amount, currency, created_at, updated_at
            FROM entitlements
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find entitlement: {}", e),
            )
        })?;

        row.map(Entitlement::try_from).transpose()
    }
}
