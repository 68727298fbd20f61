//! Billing-event transitions over the entitlement record.
//!
//! Each event kind and product type maps to a merge-patch. Nothing here touches storage;
//! the application layer hands the patch to the repository's atomic upsert.
//!
//! ```text
//! event               | status    | revoke_at          | delinquency | last invoice
//! --------------------+-----------+--------------------+-------------+-------------
//! purchase            | active    | policy(type, now)  | reset       | paid
//! invoice paid (m/y)  | active    | next boundary      | reset       | paid
//! invoice paid (pp/l) | active    | never              | reset       | paid
//! failed (pp)         | past_due  | now                | +1          | failed
//! failed (m/y/l)      | past_due  | unchanged          | unchanged   | failed
//! cancel (pp)         | canceled  | now                | unchanged   | unchanged
//! cancel (m/y/l)      | canceled  | unchanged          | unchanged   | unchanged
//! refund (lifetime)   | no-op
//! refund (other)      | refunded  | now                | unchanged   | unchanged
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::Timestamp;

use super::aggregate::{BillingReferences, DelinquencyUpdate, EntitlementPatch, RevokeAtUpdate};
use super::revocation::RevocationPolicy;
use super::{EntitlementStatus, ProductType};

pub const INVOICE_PAID: &str = "paid";
pub const INVOICE_FAILED: &str = "failed";

/// Provider-neutral billing event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingEventKind {
    PurchaseSucceeded,
    InvoicePaid,
    PaymentFailed,
    Cancellation,
    Refund,
}

impl BillingEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingEventKind::PurchaseSucceeded => "purchase_succeeded",
            BillingEventKind::InvoicePaid => "invoice_paid",
            BillingEventKind::PaymentFailed => "payment_failed",
            BillingEventKind::Cancellation => "cancellation",
            BillingEventKind::Refund => "refund",
        }
    }
}

impl fmt::Display for BillingEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computes entitlement patches for billing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntitlementLifecycle {
    policy: RevocationPolicy,
}

impl EntitlementLifecycle {
    pub fn new(policy: RevocationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RevocationPolicy {
        &self.policy
    }

    /// Patch for `kind` on a `product_type` subscriber at `now`.
    ///
    /// Returns `None` when the event must leave the row untouched (lifetime refunds).
    pub fn patch_for(
        &self,
        kind: BillingEventKind,
        product_type: ProductType,
        references: &BillingReferences,
        now: Timestamp,
    ) -> Option<EntitlementPatch> {
        let base = EntitlementPatch::new()
            .product_type(product_type)
            .with_references(references);

        let patch = match kind {
            BillingEventKind::PurchaseSucceeded => base
                .status(EntitlementStatus::Active)
                .revoke_at(self.policy.revoke_at(product_type, &now).into())
                .delinquency(DelinquencyUpdate::Reset)
                .last_invoice_status(INVOICE_PAID),

            BillingEventKind::InvoicePaid => {
                let revoke_at = if product_type.is_calendar_subscription() {
                    self.policy.revoke_at(product_type, &now).into()
                } else {
                    RevokeAtUpdate::Clear
                };
                base.status(EntitlementStatus::Active)
                    .revoke_at(revoke_at)
                    .delinquency(DelinquencyUpdate::Reset)
                    .last_invoice_status(INVOICE_PAID)
            }

            BillingEventKind::PaymentFailed => {
                let patch = base
                    .status(EntitlementStatus::PastDue)
                    .last_invoice_status(INVOICE_FAILED);
                if product_type == ProductType::PaymentPlan {
                    patch
                        .revoke_at(RevokeAtUpdate::At(now))
                        .delinquency(DelinquencyUpdate::Increment)
                } else {
                    patch
                }
            }

            BillingEventKind::Cancellation => {
                let patch = base.status(EntitlementStatus::Canceled);
                if product_type == ProductType::PaymentPlan {
                    patch.revoke_at(RevokeAtUpdate::At(now))
                } else {
                    patch
                }
            }

            BillingEventKind::Refund => {
                if product_type == ProductType::Lifetime {
                    return None;
                }
                base.status(EntitlementStatus::Refunded)
                    .revoke_at(RevokeAtUpdate::At(now))
            }
        };

        Some(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entitlement::{is_active, Entitlement};
    use crate::domain::foundation::UserId;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn lifecycle() -> EntitlementLifecycle {
        EntitlementLifecycle::default()
    }

    fn apply(
        existing: Option<Entitlement>,
        kind: BillingEventKind,
        product_type: ProductType,
        now: Timestamp,
    ) -> Option<Entitlement> {
        let patch = lifecycle().patch_for(kind, product_type, &BillingReferences::default(), now);
        match (existing, patch) {
            (existing, None) => existing,
            (Some(mut e), Some(p)) => {
                e.apply(&p, now);
                Some(e)
            }
            (None, Some(p)) => Some(Entitlement::from_patch(
                UserId::new("user-1").unwrap(),
                &p,
                now,
            )),
        }
    }

    #[test]
    fn monthly_purchase_scenario() {
        let now = ts("2025-01-15T10:00:00Z");
        let e = apply(None, BillingEventKind::PurchaseSucceeded, ProductType::Monthly, now).unwrap();

        assert_eq!(e.status, EntitlementStatus::Active);
        assert_eq!(e.revoke_at, Some(ts("2025-02-01T05:00:00Z")));
        assert_eq!(e.last_invoice_status.as_deref(), Some("paid"));
        assert_eq!(e.delinquency_count, 0);
        assert!(is_active(Some(&e), &now));
    }

    #[test]
    fn payment_plan_first_installment_failure_scenario() {
        let now = ts("2025-03-03T14:22:05Z");
        let e = apply(None, BillingEventKind::PaymentFailed, ProductType::PaymentPlan, now).unwrap();

        assert_eq!(e.status, EntitlementStatus::PastDue);
        assert_eq!(e.revoke_at, Some(now));
        assert_eq!(e.delinquency_count, 1);
        assert_eq!(e.last_invoice_status.as_deref(), Some("failed"));
        assert!(!is_active(Some(&e), &now));
    }

    #[test]
    fn payment_plan_failures_accumulate() {
        let first = ts("2025-03-03T14:00:00Z");
        let second = ts("2025-04-03T14:00:00Z");
        let e = apply(None, BillingEventKind::PaymentFailed, ProductType::PaymentPlan, first);
        let e = apply(e, BillingEventKind::PaymentFailed, ProductType::PaymentPlan, second).unwrap();
        assert_eq!(e.delinquency_count, 2);
        assert_eq!(e.revoke_at, Some(second));
    }

    #[test]
    fn yearly_mid_year_cancellation_scenario() {
        let purchased = ts("2025-01-15T10:00:00Z");
        let e = apply(None, BillingEventKind::PurchaseSucceeded, ProductType::Yearly, purchased);
        let prior = e.as_ref().unwrap().revoke_at;
        assert_eq!(prior, Some(ts("2026-01-01T05:00:00Z")));

        let canceled_at = ts("2025-06-15T12:00:00Z");
        let e = apply(e, BillingEventKind::Cancellation, ProductType::Yearly, canceled_at).unwrap();

        assert_eq!(e.status, EntitlementStatus::Canceled);
        assert_eq!(e.revoke_at, prior);
    }

    #[test]
    fn lifetime_refund_scenario_leaves_row_untouched() {
        let purchased = ts("2025-01-15T10:00:00Z");
        let before = apply(None, BillingEventKind::PurchaseSucceeded, ProductType::Lifetime, purchased)
            .unwrap();

        let after = apply(
            Some(before.clone()),
            BillingEventKind::Refund,
            ProductType::Lifetime,
            ts("2025-02-01T00:00:00Z"),
        )
        .unwrap();

        assert_eq!(after, before);
        assert!(lifecycle()
            .patch_for(
                BillingEventKind::Refund,
                ProductType::Lifetime,
                &BillingReferences::default(),
                purchased
            )
            .is_none());
    }

    #[test]
    fn monthly_invoice_paid_scenario() {
        let e = apply(
            None,
            BillingEventKind::PaymentFailed,
            ProductType::PaymentPlan,
            ts("2025-01-10T00:00:00Z"),
        );
        let paid_at = ts("2025-02-14T18:30:00Z");
        let e = apply(e, BillingEventKind::InvoicePaid, ProductType::Monthly, paid_at).unwrap();

        assert_eq!(e.status, EntitlementStatus::Active);
        assert_eq!(e.revoke_at, Some(ts("2025-03-01T05:00:00Z")));
        assert_eq!(e.delinquency_count, 0);
        assert_eq!(e.last_invoice_status.as_deref(), Some("paid"));
    }

    #[test]
    fn payment_plan_invoice_paid_clears_revoke_at() {
        let e = apply(
            None,
            BillingEventKind::PaymentFailed,
            ProductType::PaymentPlan,
            ts("2025-01-10T00:00:00Z"),
        );
        let e = apply(
            e,
            BillingEventKind::InvoicePaid,
            ProductType::PaymentPlan,
            ts("2025-01-12T00:00:00Z"),
        )
        .unwrap();

        assert_eq!(e.revoke_at, None);
        assert_eq!(e.delinquency_count, 0);
        assert_eq!(e.status, EntitlementStatus::Active);
    }

    #[test]
    fn monthly_failure_keeps_grace_period() {
        let purchased = ts("2025-01-15T10:00:00Z");
        let e = apply(None, BillingEventKind::PurchaseSucceeded, ProductType::Monthly, purchased);
        let failed_at = ts("2025-01-20T10:00:00Z");
        let e = apply(e, BillingEventKind::PaymentFailed, ProductType::Monthly, failed_at).unwrap();

        assert_eq!(e.status, EntitlementStatus::PastDue);
        assert_eq!(e.revoke_at, Some(ts("2025-02-01T05:00:00Z")));
        assert_eq!(e.delinquency_count, 0);
        assert_eq!(e.last_invoice_status.as_deref(), Some("failed"));
    }

    #[test]
    fn payment_plan_cancellation_revokes_immediately() {
        let now = ts("2025-05-05T05:05:05Z");
        let e = apply(None, BillingEventKind::PurchaseSucceeded, ProductType::PaymentPlan, now);
        let e = apply(e, BillingEventKind::Cancellation, ProductType::PaymentPlan, now).unwrap();
        assert_eq!(e.status, EntitlementStatus::Canceled);
        assert_eq!(e.revoke_at, Some(now));
        assert_eq!(e.last_invoice_status.as_deref(), Some("paid"));
    }

    #[test]
    fn monthly_refund_revokes_now() {
        let now = ts("2025-01-20T10:00:00Z");
        let e = apply(
            None,
            BillingEventKind::PurchaseSucceeded,
            ProductType::Monthly,
            ts("2025-01-15T10:00:00Z"),
        );
        let e = apply(e, BillingEventKind::Refund, ProductType::Monthly, now).unwrap();
        assert_eq!(e.status, EntitlementStatus::Refunded);
        assert_eq!(e.revoke_at, Some(now));
    }

    #[test]
    fn every_patch_carries_product_type_and_references() {
        let refs = BillingReferences {
            stripe_subscription_id: Some("sub_9".into()),
            plan_name: Some("Starter".into()),
            ..BillingReferences::default()
        };
        let patch = lifecycle()
            .patch_for(
                BillingEventKind::Cancellation,
                ProductType::Monthly,
                &refs,
                Timestamp::now(),
            )
            .unwrap();
        assert_eq!(patch.product_type, Some(ProductType::Monthly));
        assert_eq!(patch.stripe_subscription_id.as_deref(), Some("sub_9"));
        assert_eq!(patch.plan_name.as_deref(), Some("Starter"));
        assert_eq!(patch.delinquency, None);
        assert_eq!(patch.last_invoice_status, None);
    }
}
