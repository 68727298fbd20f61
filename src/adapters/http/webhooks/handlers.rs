//! HTTP handlers for webhook endpoints.
//!
//! The raw body is verified before anything is parsed; the parsed event then goes
//! through the idempotent processor.

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};

use crate::domain::webhooks::{WebhookEnvelope, WebhookError, WebhookProvider};

use super::super::error::ErrorResponse;
use super::super::state::AppState;
use super::dto::WebhookAck;

pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";
pub const ZAXAA_SIGNATURE_HEADER: &str = "X-Zaxaa-Signature";

/// Handle a Stripe webhook.
///
/// POST /api/webhooks/stripe
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, WebhookApiError> {
    let verifier = state
        .stripe_verifier
        .as_ref()
        .ok_or(WebhookError::MissingSecret("stripe"))?;
    let signature = header_str(&headers, STRIPE_SIGNATURE_HEADER)
        .ok_or(WebhookError::MissingSignature(STRIPE_SIGNATURE_HEADER))?;

    let event = verifier.verify_and_parse(&body, signature)?;
    if !event.is_live() {
        tracing::debug!(event_id = %event.id, "Processing Stripe test-mode event");
    }

    let envelope = WebhookEnvelope {
        provider: WebhookProvider::Stripe,
        event_id: event.id.clone(),
        event_type: event.event_type.clone(),
    };
    let result = state
        .processor
        .process(&envelope, &event, state.stripe_handler.as_ref())
        .await?;

    Ok(Json(WebhookAck::from(&result)))
}

/// Handle a Zaxaa notification.
///
/// POST /api/webhooks/zaxaa
pub async fn handle_zaxaa_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, WebhookApiError> {
    let verifier = state
        .zaxaa_verifier
        .as_ref()
        .ok_or(WebhookError::MissingSecret("zaxaa"))?;
    let signature = header_str(&headers, ZAXAA_SIGNATURE_HEADER)
        .ok_or(WebhookError::MissingSignature(ZAXAA_SIGNATURE_HEADER))?;

    let event = verifier.verify_and_parse(&body, signature)?;
    if event.trans_receipt.trim().is_empty() {
        return Err(WebhookError::ParseError("trans_receipt is empty".to_string()).into());
    }

    let envelope = WebhookEnvelope {
        provider: WebhookProvider::Zaxaa,
        event_id: event.trans_receipt.trim().to_string(),
        event_type: event.trans_type.clone(),
    };
    let result = state
        .processor
        .process(&envelope, &event, state.zaxaa_handler.as_ref())
        .await?;

    Ok(Json(WebhookAck::from(&result)))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts webhook errors to HTTP responses.
#[derive(Debug)]
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let code = match &self.0 {
            WebhookError::MissingSecret(_) => "WEBHOOK_NOT_CONFIGURED",
            WebhookError::MissingSignature(_) => "MISSING_SIGNATURE",
            WebhookError::InvalidSignature => "INVALID_SIGNATURE",
            WebhookError::TimestampOutOfRange | WebhookError::InvalidTimestamp => {
                "INVALID_TIMESTAMP"
            }
            WebhookError::ParseError(_) => "INVALID_PAYLOAD",
            WebhookError::MissingMetadata(_) => "MISSING_METADATA",
            WebhookError::UnknownProductType(_) => "UNKNOWN_PRODUCT_TYPE",
            WebhookError::Persistence(_) => "PERSISTENCE_ERROR",
            WebhookError::Timeout(_) => "TIMEOUT",
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Webhook failed");
        } else {
            tracing::warn!(error = %self.0, "Webhook rejected");
        }

        ErrorResponse::new(code, self.0.to_string()).into_response_with(status)
    }
}
