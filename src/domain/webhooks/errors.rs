//! Webhook error types.
//!
//! Every error maps to an HTTP status, which decides whether the payment provider
//! redelivers:
//! - 2xx: acknowledged, never redelivered
//! - 4xx: rejected, the provider gives up or alerts
//! - 5xx: failed, the provider retries

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::entitlement::EntitlementError;
use crate::domain::foundation::DomainError;

#[derive(Debug, Error)]
pub enum WebhookError {
    /// No signing secret configured for this provider.
    #[error("Webhook secret not configured for {0}")]
    MissingSecret(&'static str),

    /// Signature header absent from the request.
    #[error("Missing signature header: {0}")]
    MissingSignature(&'static str),

    #[error("Invalid signature")]
    InvalidSignature,

    /// Signed timestamp is older than the replay window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Signed timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Payload or signature header could not be parsed.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Event carries no `userId` / `productType` metadata.
    #[error("Missing metadata: {0}")]
    MissingMetadata(&'static str),

    /// Event metadata names a product type we do not sell.
    #[error("Unknown product type: {0}")]
    UnknownProductType(String),

    /// Storage failure while applying or recording the event.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Applying the event did not finish in time.
    #[error("Timed out after {0}s")]
    Timeout(u64),
}

impl WebhookError {
    /// Returns true if a redelivery of the same event could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Persistence(_) | WebhookError::Timeout(_))
    }

    /// Returns true for events that are logged and acknowledged without being applied.
    ///
    /// Redelivery carries the same payload, so retrying cannot help.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            WebhookError::MissingMetadata(_) | WebhookError::UnknownProductType(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::MissingSecret(_)
            | WebhookError::MissingSignature(_)
            | WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp
            | WebhookError::ParseError(_) => StatusCode::BAD_REQUEST,

            WebhookError::MissingMetadata(_) | WebhookError::UnknownProductType(_) => {
                StatusCode::OK
            }

            WebhookError::Persistence(_) | WebhookError::Timeout(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Persistence(err.to_string())
    }
}

impl From<EntitlementError> for WebhookError {
    fn from(err: EntitlementError) -> Self {
        match err {
            EntitlementError::InvalidProductType(value) => WebhookError::UnknownProductType(value),
            EntitlementError::Timeout(secs) => WebhookError::Timeout(secs),
            EntitlementError::ValidationFailed { field, .. } if field == "user_id" => {
                WebhookError::MissingMetadata("userId")
            }
            other => WebhookError::Persistence(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_secret_displays_provider() {
        let err = WebhookError::MissingSecret("stripe");
        assert_eq!(err.to_string(), "Webhook secret not configured for stripe");
    }

    #[test]
    fn verification_failures_are_bad_requests() {
        for err in [
            WebhookError::MissingSecret("zaxaa"),
            WebhookError::MissingSignature("Stripe-Signature"),
            WebhookError::InvalidSignature,
            WebhookError::TimestampOutOfRange,
            WebhookError::InvalidTimestamp,
            WebhookError::ParseError("bad json".into()),
        ] {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST, "{err}");
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn skipped_events_are_acknowledged() {
        let err = WebhookError::MissingMetadata("userId");
        assert_eq!(err.status_code(), StatusCode::OK);
        assert!(err.is_skippable());

        let err = WebhookError::UnknownProductType("weekly".into());
        assert_eq!(err.status_code(), StatusCode::OK);
        assert!(err.is_skippable());
    }

    #[test]
    fn persistence_failures_are_retried() {
        let err = WebhookError::Persistence("connection reset".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_retryable());

        let err = WebhookError::Timeout(10);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_retryable());
    }

    #[test]
    fn entitlement_errors_convert() {
        let err: WebhookError = EntitlementError::InvalidProductType("weekly".into()).into();
        assert!(matches!(err, WebhookError::UnknownProductType(ref s) if s == "weekly"));

        let err: WebhookError = EntitlementError::Timeout(5).into();
        assert!(matches!(err, WebhookError::Timeout(5)));

        let err: WebhookError = EntitlementError::persistence("boom").into();
        assert!(matches!(err, WebhookError::Persistence(_)));
    }
}
