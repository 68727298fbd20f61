//! Entitlement aggregate and its merge-patch.
//!
//! One entitlement exists per user. Rows are created on the first billing event and
//! mutated by every later one; nothing here deletes them.
//!
//! # Design Decisions
//!
//! - **Merge-patch writes**: an upsert only touches fields present in the patch
//! - **Money in minor units**: `plan_amount` is an integer, never a float
//! - **Fail-secure**: no entitlement means no access

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EntitlementId, Timestamp, UserId};

use super::{EntitlementStatus, ProductType};

/// Currency assigned when a row is created without one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// A user's paid-access record.
///
/// # Invariants
///
/// - `user_id` is unique
/// - `revoke_at == None` means access is never revoked by the calendar
/// - `delinquency_count` only grows through payment-plan failures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    pub id: EntitlementId,
    pub user_id: UserId,
    pub status: EntitlementStatus,
    pub product_type: Option<ProductType>,
    pub revoke_at: Option<Timestamp>,
    pub last_invoice_status: Option<String>,
    pub delinquency_count: u32,
    pub stripe_subscription_id: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub zaxaa_subscription_id: Option<String>,
    pub plan_name: Option<String>,
    /// Plan price in minor currency units.
    pub plan_amount: Option<i64>,
    pub currency: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Entitlement {
    /// Builds the row an upsert inserts when none exists yet.
    ///
    /// Fields the patch leaves out take their defaults: `inactive`, zero delinquency,
    /// `USD`, everything else empty.
    pub fn from_patch(user_id: UserId, patch: &EntitlementPatch, now: Timestamp) -> Self {
        let mut entitlement = Self {
            id: EntitlementId::new(),
            user_id,
            status: EntitlementStatus::default(),
            product_type: None,
            revoke_at: None,
            last_invoice_status: None,
            delinquency_count: 0,
            stripe_subscription_id: None,
            stripe_customer_id: None,
            zaxaa_subscription_id: None,
            plan_name: None,
            plan_amount: None,
            currency: DEFAULT_CURRENCY.to_string(),
            created_at: now,
            updated_at: now,
        };
        entitlement.apply(patch, now);
        entitlement
    }

    /// Merges a patch into this row. Absent fields keep their value; `updated_at` always moves.
    pub fn apply(&mut self, patch: &EntitlementPatch, now: Timestamp) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(product_type) = patch.product_type {
            self.product_type = Some(product_type);
        }
        match patch.revoke_at {
            Some(RevokeAtUpdate::Clear) => self.revoke_at = None,
            Some(RevokeAtUpdate::At(at)) => self.revoke_at = Some(at),
            None => {}
        }
        if let Some(ref value) = patch.last_invoice_status {
            self.last_invoice_status = Some(value.clone());
        }
        if let Some(update) = patch.delinquency {
            self.delinquency_count = update.apply_to(self.delinquency_count);
        }
        merge_string(&mut self.stripe_subscription_id, &patch.stripe_subscription_id);
        merge_string(&mut self.stripe_customer_id, &patch.stripe_customer_id);
        merge_string(&mut self.zaxaa_subscription_id, &patch.zaxaa_subscription_id);
        merge_string(&mut self.plan_name, &patch.plan_name);
        if let Some(amount) = patch.plan_amount {
            self.plan_amount = Some(amount);
        }
        if let Some(ref currency) = patch.currency {
            self.currency = currency.clone();
        }
        self.updated_at = now;
    }

    /// See [`is_active`].
    pub fn is_active_at(&self, now: &Timestamp) -> bool {
        self.status == EntitlementStatus::Active
            && self.revoke_at.map_or(true, |at| at.is_after(now))
    }
}

fn merge_string(target: &mut Option<String>, value: &Option<String>) {
    if let Some(v) = value {
        *target = Some(v.clone());
    }
}

/// Access check over an optional entitlement.
///
/// True only for an `active` row whose revoke date is absent or strictly after `now`.
pub fn is_active(entitlement: Option<&Entitlement>, now: &Timestamp) -> bool {
    entitlement.map_or(false, |e| e.is_active_at(now))
}

/// Explicit change to `revoke_at`. Leaving the patch field `None` means "unchanged".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeAtUpdate {
    /// Never revoke.
    Clear,
    At(Timestamp),
}

impl From<Option<Timestamp>> for RevokeAtUpdate {
    fn from(value: Option<Timestamp>) -> Self {
        match value {
            Some(at) => RevokeAtUpdate::At(at),
            None => RevokeAtUpdate::Clear,
        }
    }
}

/// Change to `delinquency_count`.
///
/// `Increment` is applied against the stored value by the persistence layer in the
/// same statement as the rest of the patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelinquencyUpdate {
    Reset,
    Set(u32),
    Increment,
}

impl DelinquencyUpdate {
    pub fn apply_to(self, current: u32) -> u32 {
        match self {
            DelinquencyUpdate::Reset => 0,
            DelinquencyUpdate::Set(n) => n,
            DelinquencyUpdate::Increment => current.saturating_add(1),
        }
    }
}

/// Fields to write in an entitlement upsert. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitlementPatch {
    pub status: Option<EntitlementStatus>,
    pub product_type: Option<ProductType>,
    pub revoke_at: Option<RevokeAtUpdate>,
    pub last_invoice_status: Option<String>,
    pub delinquency: Option<DelinquencyUpdate>,
    pub stripe_subscription_id: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub zaxaa_subscription_id: Option<String>,
    pub plan_name: Option<String>,
    pub plan_amount: Option<i64>,
    pub currency: Option<String>,
}

impl EntitlementPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: EntitlementStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn product_type(mut self, product_type: ProductType) -> Self {
        self.product_type = Some(product_type);
        self
    }

    pub fn revoke_at(mut self, update: RevokeAtUpdate) -> Self {
        self.revoke_at = Some(update);
        self
    }

    pub fn last_invoice_status(mut self, value: impl Into<String>) -> Self {
        self.last_invoice_status = Some(value.into());
        self
    }

    pub fn delinquency(mut self, update: DelinquencyUpdate) -> Self {
        self.delinquency = Some(update);
        self
    }

    /// Copies every external reference and plan field that `refs` carries.
    pub fn with_references(mut self, refs: &BillingReferences) -> Self {
        self.stripe_subscription_id = refs.stripe_subscription_id.clone();
        self.stripe_customer_id = refs.stripe_customer_id.clone();
        self.zaxaa_subscription_id = refs.zaxaa_subscription_id.clone();
        self.plan_name = refs.plan_name.clone();
        self.plan_amount = refs.plan_amount;
        self.currency = refs.currency.clone();
        self
    }

    /// True when the patch would change nothing but `updated_at`.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// External references and plan details carried by a billing event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingReferences {
    pub stripe_subscription_id: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub zaxaa_subscription_id: Option<String>,
    pub plan_name: Option<String>,
    pub plan_amount: Option<i64>,
    pub currency: Option<String>,
}
