//! Provider-neutral billing events.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::domain::entitlement::{BillingEventKind, BillingReferences, ProductType};
use crate::domain::foundation::UserId;

use super::errors::WebhookError;

/// Payment providers that deliver webhooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookProvider {
    Stripe,
    Zaxaa,
}

impl WebhookProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookProvider::Stripe => "stripe",
            WebhookProvider::Zaxaa => "zaxaa",
        }
    }
}

impl fmt::Display for WebhookProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `userId` / `productType` pulled from event metadata.
///
/// Keys are accepted in camelCase or snake_case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillingMetadata {
    pub user_id: Option<String>,
    pub product_type: Option<String>,
}

impl BillingMetadata {
    /// Reads metadata keys from a JSON object. Non-objects yield empty metadata.
    pub fn from_value(value: &Value) -> Self {
        Self {
            user_id: string_key(value, &["userId", "user_id"]),
            product_type: string_key(value, &["productType", "product_type"]),
        }
    }

    /// Fills fields still missing here from `other`.
    pub fn or(self, other: BillingMetadata) -> Self {
        Self {
            user_id: self.user_id.or(other.user_id),
            product_type: self.product_type.or(other.product_type),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.user_id.is_some() && self.product_type.is_some()
    }

    /// Validates both fields.
    ///
    /// # Errors
    ///
    /// - `MissingMetadata` when either field is absent or the user id is blank
    /// - `UnknownProductType` when the product type does not parse
    pub fn resolve(&self) -> Result<(UserId, ProductType), WebhookError> {
        let user_id = self
            .user_id
            .as_deref()
            .ok_or(WebhookError::MissingMetadata("userId"))?;
        let user_id = UserId::new(user_id).map_err(|_| WebhookError::MissingMetadata("userId"))?;

        let product_type = self
            .product_type
            .as_deref()
            .ok_or(WebhookError::MissingMetadata("productType"))?;
        let product_type = product_type
            .parse::<ProductType>()
            .map_err(|_| WebhookError::UnknownProductType(product_type.to_string()))?;

        Ok((user_id, product_type))
    }
}

fn string_key(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .filter_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .next()
}

/// A billing event ready to apply to an entitlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingEvent {
    pub kind: BillingEventKind,
    pub user_id: UserId,
    pub product_type: ProductType,
    pub references: BillingReferences,
}

/// Identity of a delivered webhook, used for deduplication and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEnvelope {
    pub provider: WebhookProvider,
    pub event_id: String,
    pub event_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_camel_and_snake_case_keys() {
        let camel = BillingMetadata::from_value(&json!({"userId": "u1", "productType": "monthly"}));
        let snake = BillingMetadata::from_value(&json!({"user_id": "u1", "product_type": "monthly"}));
        assert_eq!(camel, snake);
        assert!(camel.is_complete());
    }

    #[test]
    fn blank_values_count_as_missing() {
        let meta = BillingMetadata::from_value(&json!({"userId": "  ", "productType": "yearly"}));
        assert_eq!(meta.user_id, None);
        assert!(!meta.is_complete());
    }

    #[test]
    fn numeric_user_ids_are_accepted() {
        let meta = BillingMetadata::from_value(&json!({"userId": 42}));
        assert_eq!(meta.user_id.as_deref(), Some("42"));
    }

    #[test]
    fn or_fills_only_missing_fields() {
        let first = BillingMetadata {
            user_id: Some("u1".into()),
            product_type: None,
        };
        let second = BillingMetadata {
            user_id: Some("u2".into()),
            product_type: Some("yearly".into()),
        };
        let merged = first.or(second);
        assert_eq!(merged.user_id.as_deref(), Some("u1"));
        assert_eq!(merged.product_type.as_deref(), Some("yearly"));
    }

    #[test]
    fn resolve_reports_missing_fields() {
        let meta = BillingMetadata::default();
        assert!(matches!(meta.resolve(), Err(WebhookError::MissingMetadata("userId"))));

        let meta = BillingMetadata {
            user_id: Some("u1".into()),
            product_type: None,
        };
        assert!(matches!(meta.resolve(), Err(WebhookError::MissingMetadata("productType"))));
    }

    #[test]
    fn resolve_rejects_unknown_product_type() {
        let meta = BillingMetadata {
            user_id: Some("u1".into()),
            product_type: Some("weekly".into()),
        };
        assert!(matches!(meta.resolve(), Err(WebhookError::UnknownProductType(_))));
    }

    #[test]
    fn resolve_parses_valid_metadata() {
        let meta = BillingMetadata {
            user_id: Some("u1".into()),
            product_type: Some("payment_plan".into()),
        };
        let (user_id, product_type) = meta.resolve().unwrap();
        assert_eq!(user_id.as_str(), "u1");
        assert_eq!(product_type, ProductType::PaymentPlan);
    }

    #[test]
    fn non_object_metadata_is_empty() {
        assert_eq!(BillingMetadata::from_value(&Value::Null), BillingMetadata::default());
        assert_eq!(BillingMetadata::from_value(&json!("text")), BillingMetadata::default());
    }
}
