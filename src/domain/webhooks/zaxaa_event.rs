//! Zaxaa notification payloads.
//!
//! Zaxaa posts a flat JSON object per transaction. The CRM's `userId` and `productType`
//! travel either as top-level fields or inside a `custom` object set up in the
//! product's pass-through parameters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::entitlement::{BillingEventKind, BillingReferences};

use super::billing_event::BillingMetadata;

/// Zaxaa transaction notification (simplified).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ZaxaaEvent {
    /// Transaction type, e.g. `SALE` or `REBILL`.
    pub trans_type: String,

    /// Receipt number, unique per transaction.
    #[serde(alias = "transaction_id")]
    pub trans_receipt: String,

    #[serde(default)]
    pub trans_amount: Option<Value>,

    #[serde(default)]
    pub trans_currency: Option<String>,

    #[serde(default)]
    pub subscription_id: Option<String>,

    #[serde(default)]
    pub product_name: Option<String>,

    #[serde(default)]
    pub custom: Option<Value>,

    /// Remaining fields, searched for top-level metadata keys.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Zaxaa transaction types that drive entitlements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZaxaaTransactionType {
    Sale,
    FirstBill,
    Rebill,
    RebillFailed,
    PaymentFailed,
    Canceled,
    Refund,
    Chargeback,
    Unknown,
}

impl ZaxaaTransactionType {
    /// Parses a `trans_type` value, case-insensitively.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "SALE" => Self::Sale,
            "FIRST_BILL" => Self::FirstBill,
            "REBILL" => Self::Rebill,
            "REBILL_FAILED" => Self::RebillFailed,
            "PAYMENT_FAILED" => Self::PaymentFailed,
            "CANCELED" | "CANCELLED" | "CANCEL" => Self::Canceled,
            "REFUND" => Self::Refund,
            "CHARGEBACK" => Self::Chargeback,
            _ => Self::Unknown,
        }
    }

    pub fn billing_kind(&self) -> Option<BillingEventKind> {
        match self {
            Self::Sale | Self::FirstBill => Some(BillingEventKind::PurchaseSucceeded),
            Self::Rebill => Some(BillingEventKind::InvoicePaid),
            Self::RebillFailed | Self::PaymentFailed => Some(BillingEventKind::PaymentFailed),
            Self::Canceled => Some(BillingEventKind::Cancellation),
            Self::Refund | Self::Chargeback => Some(BillingEventKind::Refund),
            Self::Unknown => None,
        }
    }
}

impl ZaxaaEvent {
    pub fn parsed_type(&self) -> ZaxaaTransactionType {
        ZaxaaTransactionType::from_str(&self.trans_type)
    }

    /// Metadata from the `custom` object, falling back to top-level fields.
    pub fn metadata(&self) -> BillingMetadata {
        let custom = self
            .custom
            .as_ref()
            .map(BillingMetadata::from_value)
            .unwrap_or_default();
        let top_level = BillingMetadata::from_value(&Value::Object(self.extra.clone()));
        custom.or(top_level)
    }

    pub fn references(&self) -> BillingReferences {
        BillingReferences {
            stripe_subscription_id: None,
            stripe_customer_id: None,
            zaxaa_subscription_id: self.subscription_id.clone().filter(|s| !s.is_empty()),
            plan_name: self.product_name.clone().filter(|s| !s.is_empty()),
            plan_amount: self.trans_amount.as_ref().and_then(minor_units),
            currency: self
                .trans_currency
                .as_deref()
                .filter(|c| !c.trim().is_empty())
                .map(|c| c.trim().to_uppercase()),
        }
    }
}

/// Converts a major-unit amount (`"49.00"` or `49.5`) to minor units.
fn minor_units(value: &Value) -> Option<i64> {
    let major = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !major.is_finite() {
        return None;
    }
    Some((major * 100.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(body: Value) -> ZaxaaEvent {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn maps_transaction_types_to_billing_kinds() {
        let cases = [
            ("SALE", Some(BillingEventKind::PurchaseSucceeded)),
            ("FIRST_BILL", Some(BillingEventKind::PurchaseSucceeded)),
            ("REBILL", Some(BillingEventKind::InvoicePaid)),
            ("REBILL_FAILED", Some(BillingEventKind::PaymentFailed)),
            ("PAYMENT_FAILED", Some(BillingEventKind::PaymentFailed)),
            ("CANCELED", Some(BillingEventKind::Cancellation)),
            ("CANCELLED", Some(BillingEventKind::Cancellation)),
            ("cancel", Some(BillingEventKind::Cancellation)),
            ("REFUND", Some(BillingEventKind::Refund)),
            ("CHARGEBACK", Some(BillingEventKind::Refund)),
            ("AFFILIATE_PAYOUT", None),
        ];
        for (raw, expected) in cases {
            assert_eq!(ZaxaaTransactionType::from_str(raw).billing_kind(), expected, "{raw}");
        }
    }

    #[test]
    fn custom_metadata_wins_over_top_level() {
        let e = event(json!({
            "trans_type": "SALE",
            "trans_receipt": "R-1",
            "custom": {"userId": "u-custom"},
            "user_id": "u-top",
            "product_type": "lifetime"
        }));
        let meta = e.metadata();
        assert_eq!(meta.user_id.as_deref(), Some("u-custom"));
        assert_eq!(meta.product_type.as_deref(), Some("lifetime"));
    }

    #[test]
    fn accepts_transaction_id_alias() {
        let e = event(json!({"trans_type": "REBILL", "transaction_id": "T-9"}));
        assert_eq!(e.trans_receipt, "T-9");
    }

    #[test]
    fn references_convert_amount_to_minor_units() {
        let e = event(json!({
            "trans_type": "SALE",
            "trans_receipt": "R-2",
            "trans_amount": "49.99",
            "trans_currency": "usd",
            "subscription_id": "ZX-77",
            "product_name": "CRM Lifetime"
        }));
        let refs = e.references();
        assert_eq!(refs.plan_amount, Some(4999));
        assert_eq!(refs.currency.as_deref(), Some("USD"));
        assert_eq!(refs.zaxaa_subscription_id.as_deref(), Some("ZX-77"));
        assert_eq!(refs.plan_name.as_deref(), Some("CRM Lifetime"));
        assert_eq!(refs.stripe_subscription_id, None);
    }

    #[test]
    fn numeric_and_garbage_amounts() {
        assert_eq!(minor_units(&json!(12.5)), Some(1250));
        assert_eq!(minor_units(&json!("n/a")), None);
        assert_eq!(minor_units(&json!(null)), None);
    }
}
