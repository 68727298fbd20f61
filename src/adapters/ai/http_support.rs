//! Shared HTTP plumbing for LLM vendor generators.

use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::ports::GenerationError;

/// Builds a client with a per-request timeout.
pub(super) fn build_client(timeout: Duration) -> Result<Client, GenerationError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GenerationError::Network(format!("Failed to build HTTP client: {}", e)))
}

pub(super) fn map_transport_error(err: reqwest::Error, timeout: Duration) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Timeout {
            timeout_secs: timeout.as_secs(),
        }
    } else if err.is_connect() {
        GenerationError::Network(format!("Connection failed: {}", err))
    } else {
        GenerationError::Network(err.to_string())
    }
}

pub(super) fn map_status(provider: &'static str, status: StatusCode, body: &str) -> GenerationError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GenerationError::AuthenticationFailed { provider }
        }
        StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimited { provider },
        StatusCode::BAD_REQUEST => GenerationError::InvalidRequest(truncate(body)),
        _ => GenerationError::Unavailable {
            provider,
            message: format!("HTTP {}: {}", status.as_u16(), truncate(body)),
        },
    }
}

fn truncate(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_common_statuses() {
        assert!(matches!(
            map_status("openai", StatusCode::UNAUTHORIZED, ""),
            GenerationError::AuthenticationFailed { provider: "openai" }
        ));
        assert!(matches!(
            map_status("gemini", StatusCode::TOO_MANY_REQUESTS, ""),
            GenerationError::RateLimited { provider: "gemini" }
        ));
        assert!(matches!(
            map_status("openai", StatusCode::BAD_GATEWAY, "upstream"),
            GenerationError::Unavailable { .. }
        ));
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(500);
        let GenerationError::Unavailable { message, .. } =
            map_status("openai", StatusCode::INTERNAL_SERVER_ERROR, &body)
        else {
            panic!("expected Unavailable");
        };
        assert!(message.len() < 250);
        assert!(message.ends_with("..."));
    }
}
