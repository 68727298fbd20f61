//! Stripe webhook event types.
//!
//! Only fields relevant to entitlement processing are captured; the rest of Stripe's
//! event schema is ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::entitlement::{BillingEventKind, BillingReferences};

use super::billing_event::BillingMetadata;

/// Stripe webhook event (simplified).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    #[serde(default)]
    pub created: i64,

    pub data: StripeEventData,

    #[serde(default)]
    pub livemode: bool,

    #[serde(default)]
    pub api_version: Option<String>,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_attributes: Option<Value>,
}

/// Stripe event types that drive entitlements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeEventType {
    CheckoutSessionCompleted,
    CustomerSubscriptionCreated,
    InvoicePaid,
    InvoicePaymentSucceeded,
    InvoicePaymentFailed,
    CustomerSubscriptionDeleted,
    ChargeRefunded,
    ChargeDisputeCreated,
    /// Unknown or unhandled event type.
    Unknown,
}

impl StripeEventType {
    /// Parse event type from string.
    pub fn from_str(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "customer.subscription.created" => Self::CustomerSubscriptionCreated,
            "invoice.paid" => Self::InvoicePaid,
            "invoice.payment_succeeded" => Self::InvoicePaymentSucceeded,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            "customer.subscription.deleted" => Self::CustomerSubscriptionDeleted,
            "charge.refunded" => Self::ChargeRefunded,
            "charge.dispute.created" => Self::ChargeDisputeCreated,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::CustomerSubscriptionCreated => "customer.subscription.created",
            Self::InvoicePaid => "invoice.paid",
            Self::InvoicePaymentSucceeded => "invoice.payment_succeeded",
            Self::InvoicePaymentFailed => "invoice.payment_failed",
            Self::CustomerSubscriptionDeleted => "customer.subscription.deleted",
            Self::ChargeRefunded => "charge.refunded",
            Self::ChargeDisputeCreated => "charge.dispute.created",
            Self::Unknown => "unknown",
        }
    }

    /// Lifecycle event this Stripe type triggers, if any.
    pub fn billing_kind(&self) -> Option<BillingEventKind> {
        match self {
            Self::CheckoutSessionCompleted | Self::CustomerSubscriptionCreated => {
                Some(BillingEventKind::PurchaseSucceeded)
            }
            Self::InvoicePaid | Self::InvoicePaymentSucceeded => Some(BillingEventKind::InvoicePaid),
            Self::InvoicePaymentFailed => Some(BillingEventKind::PaymentFailed),
            Self::CustomerSubscriptionDeleted => Some(BillingEventKind::Cancellation),
            Self::ChargeRefunded | Self::ChargeDisputeCreated => Some(BillingEventKind::Refund),
            Self::Unknown => None,
        }
    }
}

impl StripeEvent {
    pub fn is_live(&self) -> bool {
        self.livemode
    }

    /// Parse the event type into a known enum variant.
    pub fn parsed_type(&self) -> StripeEventType {
        StripeEventType::from_str(&self.event_type)
    }

    fn object(&self) -> &Value {
        &self.data.object
    }

    /// Metadata carried inline by the event, in lookup order:
    /// the object's own `metadata`, then `subscription_details.metadata` (invoices).
    pub fn inline_metadata(&self) -> BillingMetadata {
        let object = self.object();
        let own = object
            .get("metadata")
            .map(BillingMetadata::from_value)
            .unwrap_or_default();
        let subscription_details = object
            .pointer("/subscription_details/metadata")
            .map(BillingMetadata::from_value)
            .unwrap_or_default();
        own.or(subscription_details)
    }

    /// Subscription this event belongs to.
    ///
    /// Subscription objects carry their own id; checkout sessions and invoices reference one
    /// by id or as an expanded object.
    pub fn subscription_id(&self) -> Option<String> {
        let object = self.object();
        if object.get("object").and_then(Value::as_str) == Some("subscription") {
            return str_field(object, "id");
        }
        match object.get("subscription") {
            Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
            Some(expanded @ Value::Object(_)) => str_field(expanded, "id"),
            _ => None,
        }
    }

    pub fn customer_id(&self) -> Option<String> {
        match self.object().get("customer") {
            Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
            Some(expanded @ Value::Object(_)) => str_field(expanded, "id"),
            _ => None,
        }
    }

    /// External references and plan details the object carries.
    pub fn references(&self) -> BillingReferences {
        let object = self.object();

        let plan_name = [
            "/plan/nickname",
            "/items/data/0/price/nickname",
            "/lines/data/0/price/nickname",
            "/lines/data/0/description",
        ]
        .iter()
        .find_map(|path| object.pointer(path).and_then(non_empty_str));

        let plan_amount = [
            "/amount_total",
            "/amount_paid",
            "/amount",
            "/plan/amount",
            "/items/data/0/price/unit_amount",
        ]
        .iter()
        .find_map(|path| object.pointer(path).and_then(Value::as_i64));

        let currency = object
            .get("currency")
            .or_else(|| object.pointer("/plan/currency"))
            .and_then(non_empty_str)
            .map(|c| c.to_uppercase());

        BillingReferences {
            stripe_subscription_id: self.subscription_id(),
            stripe_customer_id: self.customer_id(),
            zaxaa_subscription_id: None,
            plan_name,
            plan_amount,
            currency,
        }
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(non_empty_str)
}

fn non_empty_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Builder for creating test StripeEvent instances.
#[cfg(test)]
pub struct StripeEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: Value,
    livemode: bool,
}

#[cfg(test)]
impl Default for StripeEventBuilder {
    fn default() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: "checkout.session.completed".to_string(),
            created: chrono::Utc::now().timestamp(),
            object: serde_json::json!({}),
            livemode: false,
        }
    }
}

#[cfg(test)]
impl StripeEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn object(mut self, object: Value) -> Self {
        self.object = object;
        self
    }

    pub fn build(self) -> StripeEvent {
        StripeEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: StripeEventData {
                object: self.object,
                previous_attributes: None,
            },
            livemode: self.livemode,
            api_version: Some("2023-10-16".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_event_types_to_billing_kinds() {
        let cases = [
            ("checkout.session.completed", Some(BillingEventKind::PurchaseSucceeded)),
            ("customer.subscription.created", Some(BillingEventKind::PurchaseSucceeded)),
            ("invoice.paid", Some(BillingEventKind::InvoicePaid)),
            ("invoice.payment_succeeded", Some(BillingEventKind::InvoicePaid)),
            ("invoice.payment_failed", Some(BillingEventKind::PaymentFailed)),
            ("customer.subscription.deleted", Some(BillingEventKind::Cancellation)),
            ("charge.refunded", Some(BillingEventKind::Refund)),
            ("charge.dispute.created", Some(BillingEventKind::Refund)),
            ("customer.subscription.updated", None),
            ("payment_intent.created", None),
        ];
        for (raw, expected) in cases {
            assert_eq!(StripeEventType::from_str(raw).billing_kind(), expected, "{raw}");
        }
    }

    #[test]
    fn event_type_round_trips_through_as_str() {
        let t = StripeEventType::from_str("charge.dispute.created");
        assert_eq!(StripeEventType::from_str(t.as_str()), t);
    }

    #[test]
    fn deserializes_minimal_event() {
        let event: StripeEvent = serde_json::from_value(json!({
            "id": "evt_1",
            "type": "invoice.paid",
            "data": {"object": {"id": "in_1"}},
            "api_version": null
        }))
        .unwrap();
        assert_eq!(event.parsed_type(), StripeEventType::InvoicePaid);
        assert!(!event.is_live());
        assert_eq!(event.api_version, None);
    }

    #[test]
    fn object_metadata_takes_precedence_over_subscription_details() {
        let event = StripeEventBuilder::new()
            .event_type("invoice.paid")
            .object(json!({
                "metadata": {"userId": "from-object"},
                "subscription_details": {
                    "metadata": {"user_id": "from-details", "product_type": "monthly"}
                }
            }))
            .build();

        let meta = event.inline_metadata();
        assert_eq!(meta.user_id.as_deref(), Some("from-object"));
        assert_eq!(meta.product_type.as_deref(), Some("monthly"));
    }

    #[test]
    fn subscription_object_uses_its_own_id() {
        let event = StripeEventBuilder::new()
            .event_type("customer.subscription.deleted")
            .object(json!({"id": "sub_123", "object": "subscription", "customer": "cus_1"}))
            .build();
        assert_eq!(event.subscription_id().as_deref(), Some("sub_123"));
        assert_eq!(event.customer_id().as_deref(), Some("cus_1"));
    }

    #[test]
    fn invoice_references_subscription_by_id_or_expanded_object() {
        let by_id = StripeEventBuilder::new()
            .object(json!({"object": "invoice", "subscription": "sub_a"}))
            .build();
        assert_eq!(by_id.subscription_id().as_deref(), Some("sub_a"));

        let expanded = StripeEventBuilder::new()
            .object(json!({"object": "invoice", "subscription": {"id": "sub_b"}}))
            .build();
        assert_eq!(expanded.subscription_id().as_deref(), Some("sub_b"));

        let none = StripeEventBuilder::new()
            .object(json!({"object": "charge", "subscription": null}))
            .build();
        assert_eq!(none.subscription_id(), None);
    }

    #[test]
    fn references_pick_up_plan_details() {
        let event = StripeEventBuilder::new()
            .event_type("checkout.session.completed")
            .object(json!({
                "object": "checkout.session",
                "subscription": "sub_9",
                "customer": "cus_9",
                "amount_total": 4900,
                "currency": "usd",
                "lines": {"data": [{"description": "Pro Monthly"}]}
            }))
            .build();

        let refs = event.references();
        assert_eq!(refs.stripe_subscription_id.as_deref(), Some("sub_9"));
        assert_eq!(refs.stripe_customer_id.as_deref(), Some("cus_9"));
        assert_eq!(refs.plan_amount, Some(4900));
        assert_eq!(refs.currency.as_deref(), Some("USD"));
        assert_eq!(refs.plan_name.as_deref(), Some("Pro Monthly"));
        assert_eq!(refs.zaxaa_subscription_id, None);
    }
}
