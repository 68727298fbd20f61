//! Product billing types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::EntitlementError;

/// How a product is billed, which decides when access is revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    /// One-time purchase. Access never expires through billing events.
    Lifetime,

    /// Recurring monthly subscription.
    Monthly,

    /// Recurring yearly subscription.
    Yearly,

    /// Installment plan. A missed installment locks access immediately.
    PaymentPlan,
}

impl ProductType {
    /// All product types, in declaration order.
    pub const ALL: [ProductType; 4] = [
        ProductType::Lifetime,
        ProductType::Monthly,
        ProductType::Yearly,
        ProductType::PaymentPlan,
    ];

    /// Returns the persisted / wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Lifetime => "lifetime",
            ProductType::Monthly => "monthly",
            ProductType::Yearly => "yearly",
            ProductType::PaymentPlan => "payment_plan",
        }
    }

    /// Returns true for recurring subscriptions that keep access until a calendar boundary.
    pub fn is_calendar_subscription(&self) -> bool {
        matches!(self, ProductType::Monthly | ProductType::Yearly)
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = EntitlementError;

    /// Parses a product type. Accepts the snake_case form and the
    /// hyphen/camelCase spellings used by checkout metadata (`payment-plan`, `paymentPlan`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "lifetime" => Ok(ProductType::Lifetime),
            "monthly" => Ok(ProductType::Monthly),
            "yearly" | "annual" => Ok(ProductType::Yearly),
            "paymentplan" => Ok(ProductType::PaymentPlan),
            _ => Err(EntitlementError::InvalidProductType(s.to_string())),
        }
    }
}
