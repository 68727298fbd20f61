//! Billing configuration: reference zone and persistence bound.

use serde::Deserialize;
use std::time::Duration;

use crate::domain::entitlement::{CalendarBoundaries, DEFAULT_REFERENCE_ZONE};

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// IANA zone whose calendar defines month and year boundaries
    #[serde(default = "default_reference_time_zone")]
    pub reference_time_zone: String,

    /// Upper bound for one entitlement write, in seconds
    #[serde(default = "default_persistence_timeout")]
    pub persistence_timeout_secs: u64,
}

impl BillingConfig {
    /// Calendar resolver for the configured zone.
    pub fn calendar(&self) -> Result<CalendarBoundaries, ValidationError> {
        CalendarBoundaries::from_zone_name(&self.reference_time_zone)
            .map_err(|_| ValidationError::UnknownTimeZone(self.reference_time_zone.clone()))
    }

    pub fn persistence_timeout(&self) -> Duration {
        Duration::from_secs(self.persistence_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.calendar()?;
        if self.persistence_timeout_secs == 0 || self.persistence_timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout(
                "billing.persistence_timeout_secs",
            ));
        }
        Ok(())
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            reference_time_zone: default_reference_time_zone(),
            persistence_timeout_secs: default_persistence_timeout(),
        }
    }
}

fn default_reference_time_zone() -> String {
    DEFAULT_REFERENCE_ZONE.to_string()
}

fn default_persistence_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_new_york_and_ten_seconds() {
        let config = BillingConfig::default();
        assert_eq!(config.reference_time_zone, "America/New_York");
        assert_eq!(config.persistence_timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn resolves_configured_zone() {
        let config = BillingConfig {
            reference_time_zone: "Europe/Berlin".to_string(),
            ..Default::default()
        };
        assert_eq!(config.calendar().unwrap().zone(), chrono_tz::Europe::Berlin);
    }

    #[test]
    fn unknown_zone_fails_validation() {
        let config = BillingConfig {
            reference_time_zone: "Atlantis/Central".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::UnknownTimeZone("Atlantis/Central".to_string()))
        );
    }

    #[test]
    fn zero_persistence_timeout_is_rejected() {
        let config = BillingConfig {
            persistence_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
