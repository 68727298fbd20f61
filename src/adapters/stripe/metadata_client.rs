//! Stripe subscription metadata client.
//!
//! Implements `SubscriptionMetadataSource` with `GET /v1/subscriptions/{id}`.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeApiConfig::new(api_key).with_timeout(Duration::from_secs(5));
//! let source = StripeMetadataClient::new(config)?;
//! ```

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::webhooks::BillingMetadata;
use crate::ports::SubscriptionMetadataSource;

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// Stripe API access settings.
#[derive(Clone)]
pub struct StripeApiConfig {
    /// Secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,
    api_base_url: String,
    timeout: Duration,
}

impl StripeApiConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Fetches subscription metadata from the Stripe API.
pub struct StripeMetadataClient {
    config: StripeApiConfig,
    http_client: reqwest::Client,
}

impl StripeMetadataClient {
    /// # Errors
    ///
    /// `InternalError` if the HTTP client cannot be built.
    pub fn new(config: StripeApiConfig) -> Result<Self, DomainError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::InternalError,
                    format!("Failed to build HTTP client: {}", e),
                )
            })?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn subscription_url(&self, subscription_id: &str) -> String {
        format!(
            "{}/v1/subscriptions/{}",
            self.config.api_base_url.trim_end_matches('/'),
            subscription_id
        )
    }
}

/// Reads `metadata` from a Stripe subscription object.
fn metadata_from_subscription(subscription: &Value) -> BillingMetadata {
    subscription
        .get("metadata")
        .map(BillingMetadata::from_value)
        .unwrap_or_default()
}

fn map_request_error(err: reqwest::Error, timeout: Duration) -> DomainError {
    if err.is_timeout() {
        DomainError::new(
            ErrorCode::Timeout,
            format!("Stripe request timed out after {}s", timeout.as_secs()),
        )
    } else {
        DomainError::new(ErrorCode::ProviderError, format!("Stripe request failed: {}", err))
    }
}

#[async_trait]
impl SubscriptionMetadataSource for StripeMetadataClient {
    async fn subscription_metadata(
        &self,
        subscription_id: &str,
    ) -> Result<Option<BillingMetadata>, DomainError> {
        let response = self
            .http_client
            .get(self.subscription_url(subscription_id))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| map_request_error(e, self.config.timeout))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(
                subscription_id,
                status = %status,
                "Stripe subscription lookup failed"
            );
            return Err(DomainError::new(
                ErrorCode::ProviderError,
                format!("Stripe API error ({}): {}", status, error_text),
            ));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| map_request_error(e, self.config.timeout))?;

        Ok(Some(metadata_from_subscription(&body)))
    }
}
