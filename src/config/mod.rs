//! Application configuration module
//!
//! Typed configuration loaded from environment variables using the `config`
//! and `dotenvy` crates. Variables carry the `CRM_ENTITLEMENTS` prefix and
//! nested values are separated by a double underscore.
//!
//! # Example
//!
//! ```no_run
//! use crm_entitlements::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod billing;
mod database;
mod error;
mod payment;
mod server;

pub use ai::{AiConfig, AiProvider};
pub use billing::BillingConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub database: DatabaseConfig,

    /// Webhook secrets and the Stripe API key
    #[serde(default)]
    pub payment: PaymentConfig,

    /// Reference zone and persistence bound for entitlement writes
    #[serde(default)]
    pub billing: BillingConfig,

    #[serde(default)]
    pub ai: AiConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Loads `.env` when present, then reads `CRM_ENTITLEMENTS__*` variables:
    ///
    /// - `CRM_ENTITLEMENTS__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `CRM_ENTITLEMENTS__DATABASE__URL=...` -> `database.url = ...`
    /// - `CRM_ENTITLEMENTS__PAYMENT__STRIPE_WEBHOOK_SECRET=whsec_...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when required variables are missing or a value
    /// cannot be parsed into its field type.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CRM_ENTITLEMENTS")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Semantic validation of every section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.payment.validate()?;
        self.billing.validate()?;
        self.ai.validate()?;

        // A webhook handler cut off by the request timeout leaves its claim behind.
        let budget_secs =
            self.payment.metadata_fetch_timeout_secs + self.billing.persistence_timeout_secs;
        if self.server.request_timeout_secs < budget_secs {
            return Err(ValidationError::TimeoutBudget {
                request_secs: self.server.request_timeout_secs,
                budget_secs,
            });
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;

    // env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "CRM_ENTITLEMENTS__DATABASE__URL",
        "CRM_ENTITLEMENTS__SERVER__PORT",
        "CRM_ENTITLEMENTS__SERVER__ENVIRONMENT",
        "CRM_ENTITLEMENTS__PAYMENT__STRIPE_WEBHOOK_SECRET",
        "CRM_ENTITLEMENTS__BILLING__REFERENCE_TIME_ZONE",
        "CRM_ENTITLEMENTS__AI__PROVIDER_ORDER",
    ];

    fn set_minimal_env() {
        env::set_var(
            "CRM_ENTITLEMENTS__DATABASE__URL",
            "postgresql://test@localhost/test",
        );
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn loads_minimal_environment_with_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.expect("config should load");
        assert_eq!(config.database.url, "postgresql://test@localhost/test");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.billing.reference_time_zone, "America/New_York");
        assert!(config.payment.stripe_webhook_secret.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reads_nested_sections() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("CRM_ENTITLEMENTS__SERVER__PORT", "3000");
        env::set_var("CRM_ENTITLEMENTS__SERVER__ENVIRONMENT", "production");
        env::set_var("CRM_ENTITLEMENTS__PAYMENT__STRIPE_WEBHOOK_SECRET", "whsec_abc");
        env::set_var("CRM_ENTITLEMENTS__BILLING__REFERENCE_TIME_ZONE", "Europe/Berlin");
        env::set_var("CRM_ENTITLEMENTS__AI__PROVIDER_ORDER", "gemini,template");
        let result = AppConfig::load();
        clear_env();

        let config = result.expect("config should load");
        assert_eq!(config.server.port, 3000);
        assert!(config.is_production());
        assert_eq!(
            config
                .payment
                .stripe_webhook_secret
                .as_ref()
                .map(|s| s.expose_secret().as_str()),
            Some("whsec_abc")
        );
        assert_eq!(config.billing.reference_time_zone, "Europe/Berlin");
        assert_eq!(
            config.ai.provider_order().unwrap(),
            vec![AiProvider::Gemini, AiProvider::Template]
        );
    }

    #[test]
    fn missing_database_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        assert!(AppConfig::load().is_err());
    }

    #[test]
    fn invalid_zone_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("CRM_ENTITLEMENTS__BILLING__REFERENCE_TIME_ZONE", "Nowhere/Land");
        let result = AppConfig::load();
        clear_env();

        let config = result.expect("config should load");
        assert!(matches!(
            config.validate(),
            Err(ValidationError::UnknownTimeZone(_))
        ));
    }

    #[test]
    fn request_timeout_must_cover_webhook_budget() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let mut config = result.expect("config should load");
        config.server.request_timeout_secs = 12;
        config.payment.metadata_fetch_timeout_secs = 5;
        config.billing.persistence_timeout_secs = 10;

        assert_eq!(
            config.validate(),
            Err(ValidationError::TimeoutBudget {
                request_secs: 12,
                budget_secs: 15
            })
        );

        config.server.request_timeout_secs = 15;
        assert!(config.validate().is_ok());
    }
}
