//! Payment provider configuration (Stripe and Zaxaa)

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Payment provider secrets and limits.
///
/// Every secret is optional: a webhook endpoint whose secret is absent answers
/// 400 instead of processing, and without a Stripe API key the subscription
/// metadata fallback is disabled.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe secret API key, used to fetch subscription metadata
    pub stripe_api_key: Option<SecretString>,

    /// Stripe webhook signing secret (`whsec_...`)
    pub stripe_webhook_secret: Option<SecretString>,

    /// Shared secret for Zaxaa webhook signatures
    pub zaxaa_webhook_secret: Option<SecretString>,

    /// Upper bound for the Stripe subscription lookup, in seconds
    #[serde(default = "default_metadata_fetch_timeout")]
    pub metadata_fetch_timeout_secs: u64,

    /// Processed-webhook claims older than this are deleted at startup
    #[serde(default = "default_webhook_retention_days")]
    pub webhook_retention_days: u32,
}

impl PaymentConfig {
    pub fn metadata_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_fetch_timeout_secs)
    }

    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key
            .as_ref()
            .is_some_and(|k| k.expose_secret().starts_with("sk_test_"))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(key) = &self.stripe_api_key {
            let key = key.expose_secret();
            if !key.starts_with("sk_") && !key.starts_with("rk_") {
                return Err(ValidationError::InvalidStripeKey);
            }
        }
        if let Some(secret) = &self.stripe_webhook_secret {
            if !secret.expose_secret().starts_with("whsec_") {
                return Err(ValidationError::InvalidStripeWebhookSecret);
            }
        }
        if self.metadata_fetch_timeout_secs == 0 || self.metadata_fetch_timeout_secs > 60 {
            return Err(ValidationError::InvalidTimeout(
                "payment.metadata_fetch_timeout_secs",
            ));
        }
        // Stripe retries for up to three days; claims must outlive that.
        if self.webhook_retention_days < 7 {
            return Err(ValidationError::RetentionTooShort(self.webhook_retention_days));
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_api_key: None,
            stripe_webhook_secret: None,
            zaxaa_webhook_secret: None,
            metadata_fetch_timeout_secs: default_metadata_fetch_timeout(),
            webhook_retention_days: default_webhook_retention_days(),
        }
    }
}

fn default_metadata_fetch_timeout() -> u64 {
    5
}

fn default_webhook_retention_days() -> u32 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> Option<SecretString> {
        Some(SecretString::new(s.to_string()))
    }

    #[test]
    fn empty_config_is_valid() {
        assert!(PaymentConfig::default().validate().is_ok());
    }

    #[test]
    fn detects_test_mode_key() {
        let config = PaymentConfig {
            stripe_api_key: secret("sk_test_abc"),
            ..Default::default()
        };
        assert!(config.is_test_mode());

        let live = PaymentConfig {
            stripe_api_key: secret("sk_live_abc"),
            ..Default::default()
        };
        assert!(!live.is_test_mode());
    }

    #[test]
    fn publishable_key_is_rejected() {
        let config = PaymentConfig {
            stripe_api_key: secret("pk_test_abc"),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidStripeKey));
    }

    #[test]
    fn webhook_secret_needs_whsec_prefix() {
        let config = PaymentConfig {
            stripe_webhook_secret: secret("secret_abc"),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidStripeWebhookSecret)
        );
    }

    #[test]
    fn zaxaa_secret_has_no_format_rule() {
        let config = PaymentConfig {
            zaxaa_webhook_secret: secret("anything"),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn retention_must_cover_provider_retries() {
        let config = PaymentConfig {
            webhook_retention_days: 2,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::RetentionTooShort(2)));
    }

    #[test]
    fn metadata_timeout_must_be_bounded() {
        let config = PaymentConfig {
            metadata_fetch_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
