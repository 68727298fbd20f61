//! Entitlement access status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::EntitlementError;

/// Access status of a subscriber's entitlement.
///
/// Only `Active` can grant access, and only while the revoke date is in the future.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementStatus {
    /// Paid and in good standing.
    Active,

    /// A payment failed. Calendar subscriptions keep access until the scheduled revoke date.
    PastDue,

    /// Subscription cancelled. Access runs to the scheduled revoke date, if any.
    Canceled,

    /// Purchase refunded or charged back.
    Refunded,

    /// Created without a qualifying event.
    Inactive,
}

impl EntitlementStatus {
    /// Returns the persisted / wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntitlementStatus::Active => "active",
            EntitlementStatus::PastDue => "past_due",
            EntitlementStatus::Canceled => "canceled",
            EntitlementStatus::Refunded => "refunded",
            EntitlementStatus::Inactive => "inactive",
        }
    }
}

impl Default for EntitlementStatus {
    fn default() -> Self {
        EntitlementStatus::Inactive
    }
}

impl fmt::Display for EntitlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntitlementStatus {
    type Err = EntitlementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(EntitlementStatus::Active),
            "past_due" => Ok(EntitlementStatus::PastDue),
            "canceled" | "cancelled" => Ok(EntitlementStatus::Canceled),
            "refunded" => Ok(EntitlementStatus::Refunded),
            "inactive" => Ok(EntitlementStatus::Inactive),
            _ => Err(EntitlementError::InvalidStatus(s.to_string())),
        }
    }
}
