//! Webhook signature verification.
//!
//! Both providers sign with HMAC-SHA256. Stripe signs `"{t}.{payload}"` and bounds the
//! timestamp to block replays; Zaxaa signs the raw body.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::errors::WebhookError;
use super::stripe_event::StripeEvent;
use super::zaxaa_event::ZaxaaEvent;

type HmacSha256 = Hmac<Sha256>;

/// Maximum allowed age for webhook events (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for future events (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components from the Stripe-Signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// Every v1 signature present. Stripe sends several while a secret is being rolled.
    pub v1_signatures: Vec<Vec<u8>>,
    /// Optional v0 legacy signature.
    pub v0_signature: Option<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses a Stripe-Signature header string.
    ///
    /// Format: `t=<timestamp>,v1=<signature>[,v1=<signature>][,v0=<legacy>]`
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::ParseError` if the header format is invalid.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();
        let mut v0_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or_else(|| WebhookError::ParseError("invalid header format".to_string()))?;

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        WebhookError::ParseError("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    v1_signatures.push(hex::decode(value).map_err(|_| {
                        WebhookError::ParseError("invalid v1 signature hex".to_string())
                    })?);
                }
                "v0" => {
                    v0_signature = Some(hex::decode(value).map_err(|_| {
                        WebhookError::ParseError("invalid v0 signature hex".to_string())
                    })?);
                }
                // Unknown schemes are ignored for forward compatibility.
                _ => {}
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| WebhookError::ParseError("missing timestamp".to_string()))?;
        if v1_signatures.is_empty() {
            return Err(WebhookError::ParseError("missing v1 signature".to_string()));
        }

        Ok(SignatureHeader {
            timestamp,
            v1_signatures,
            v0_signature,
        })
    }
}

/// Verifier for Stripe webhook signatures.
pub struct StripeWebhookVerifier {
    /// Signing secret from the Stripe dashboard (`whsec_...`).
    secret: String,
}

impl StripeWebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verifies the signature against the current clock and parses the event.
    ///
    /// # Errors
    ///
    /// - `ParseError` - malformed header or payload
    /// - `TimestampOutOfRange` - signed more than 5 minutes ago
    /// - `InvalidTimestamp` - signed more than 1 minute in the future
    /// - `InvalidSignature` - no v1 signature matches
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, WebhookError> {
        self.verify_and_parse_at(payload, signature_header, chrono::Utc::now().timestamp())
    }

    /// Same as [`verify_and_parse`](Self::verify_and_parse) with an explicit clock.
    pub fn verify_and_parse_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<StripeEvent, WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;
        validate_timestamp(header.timestamp, now)?;

        let expected = self.compute_signature(header.timestamp, payload);
        let matched = header
            .v1_signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate));
        if !matched {
            return Err(WebhookError::InvalidSignature);
        }

        serde_json::from_slice(payload).map_err(|e| WebhookError::ParseError(e.to_string()))
    }

    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(self.secret.as_bytes()).expect("HMAC accepts any key");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Verifier for Zaxaa notification signatures (`X-Zaxaa-Signature: <hex>`).
pub struct ZaxaaWebhookVerifier {
    secret: String,
}

impl ZaxaaWebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verifies the body HMAC and parses the notification.
    ///
    /// # Errors
    ///
    /// - `InvalidSignature` - header is not hex or does not match
    /// - `ParseError` - body is not a valid notification
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<ZaxaaEvent, WebhookError> {
        let provided =
            hex::decode(signature_header.trim()).map_err(|_| WebhookError::InvalidSignature)?;

        let mut mac =
            HmacSha256::new_from_slice(self.secret.as_bytes()).expect("HMAC accepts any key");
        mac.update(payload);
        let expected = mac.finalize().into_bytes();

        if !constant_time_compare(&expected, &provided) {
            return Err(WebhookError::InvalidSignature);
        }

        serde_json::from_slice(payload).map_err(|e| WebhookError::ParseError(e.to_string()))
    }
}

fn validate_timestamp(timestamp: i64, now: i64) -> Result<(), WebhookError> {
    let age = now - timestamp;

    if age > MAX_EVENT_AGE_SECS {
        return Err(WebhookError::TimestampOutOfRange);
    }
    if age < -MAX_CLOCK_SKEW_SECS {
        return Err(WebhookError::InvalidTimestamp);
    }
    Ok(())
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Builds a valid `Stripe-Signature` header value for test fixtures.
#[cfg(test)]
pub(crate) fn sign_stripe_payload(secret: &str, timestamp: i64, payload: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key");
    mac.update(format!("{}.{}", timestamp, payload).as_bytes());
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

/// Builds a valid `X-Zaxaa-Signature` header value for test fixtures.
#[cfg(test)]
pub(crate) fn sign_zaxaa_payload(secret: &str, payload: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "whsec_test_secret_12345";
    const PAYLOAD: &str = r#"{"id":"evt_test123","type":"checkout.session.completed","created":1704067200,"data":{"object":{}},"livemode":false,"api_version":"2023-10-16"}"#;

    // ══════════════════════════════════════════════════════════════
    // SignatureHeader Parsing Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn parse_header_with_v1_only() {
        let header = SignatureHeader::parse(&format!("t=1234567890,v1={}", "a".repeat(64))).unwrap();

        assert_eq!(header.timestamp, 1234567890);
        assert_eq!(header.v1_signatures.len(), 1);
        assert_eq!(header.v1_signatures[0].len(), 32);
        assert!(header.v0_signature.is_none());
    }

    #[test]
    fn parse_header_collects_every_v1() {
        let header_str = format!(
            "t=1234567890,v1={},v1={},v0={}",
            "a".repeat(64),
            "c".repeat(64),
            "b".repeat(64)
        );
        let header = SignatureHeader::parse(&header_str).unwrap();

        assert_eq!(header.v1_signatures.len(), 2);
        assert!(header.v0_signature.is_some());
    }

    #[test]
    fn parse_header_ignores_unknown_fields() {
        let header_str = format!("t=1234567890,v1={},v2=future,scheme=hmac", "a".repeat(64));
        assert!(SignatureHeader::parse(&header_str).is_ok());
    }

    #[test]
    fn parse_header_rejects_malformed_input() {
        for header in [
            format!("v1={}", "a".repeat(64)),
            "t=1234567890".to_string(),
            format!("t=not_a_number,v1={}", "a".repeat(64)),
            "t=1234567890,v1=not_valid_hex".to_string(),
            "t1234567890".to_string(),
        ] {
            assert!(
                matches!(SignatureHeader::parse(&header), Err(WebhookError::ParseError(_))),
                "{header}"
            );
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Stripe Verification Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verify_valid_signature() {
        let verifier = StripeWebhookVerifier::new(TEST_SECRET);
        let now = chrono::Utc::now().timestamp();
        let header = sign_stripe_payload(TEST_SECRET, now, PAYLOAD);

        let event = verifier.verify_and_parse(PAYLOAD.as_bytes(), &header).unwrap();

        assert_eq!(event.id, "evt_test123");
    }

    #[test]
    fn any_matching_v1_is_accepted() {
        let verifier = StripeWebhookVerifier::new(TEST_SECRET);
        let now = 1_704_067_200;
        let valid = sign_stripe_payload(TEST_SECRET, now, PAYLOAD);
        let valid_sig = valid.split("v1=").nth(1).unwrap();
        let header = format!("t={},v1={},v1={}", now, "a".repeat(64), valid_sig);

        assert!(verifier.verify_and_parse_at(PAYLOAD.as_bytes(), &header, now).is_ok());
    }

    #[test]
    fn verify_wrong_secret_fails() {
        let verifier = StripeWebhookVerifier::new("wrong_secret");
        let now = 1_704_067_200;
        let header = sign_stripe_payload(TEST_SECRET, now, PAYLOAD);

        let result = verifier.verify_and_parse_at(PAYLOAD.as_bytes(), &header, now);

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn verify_tampered_payload_fails() {
        let verifier = StripeWebhookVerifier::new(TEST_SECRET);
        let now = 1_704_067_200;
        let header = sign_stripe_payload(TEST_SECRET, now, r#"{"id":"evt_test"}"#);

        let result = verifier.verify_and_parse_at(br#"{"id":"evt_hacked"}"#, &header, now);

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn verify_invalid_json_fails_after_signature_check() {
        let verifier = StripeWebhookVerifier::new(TEST_SECRET);
        let now = 1_704_067_200;
        let header = sign_stripe_payload(TEST_SECRET, now, "not valid json");

        let result = verifier.verify_and_parse_at(b"not valid json", &header, now);

        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    // ══════════════════════════════════════════════════════════════
    // Timestamp Window Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn timestamp_window() {
        let now = 1_704_067_200;
        assert!(validate_timestamp(now - 120, now).is_ok());
        assert!(validate_timestamp(now - 300, now).is_ok());
        assert!(matches!(
            validate_timestamp(now - 301, now),
            Err(WebhookError::TimestampOutOfRange)
        ));
        assert!(validate_timestamp(now + 60, now).is_ok());
        assert!(matches!(
            validate_timestamp(now + 61, now),
            Err(WebhookError::InvalidTimestamp)
        ));
    }

    #[test]
    fn stale_signed_event_is_rejected() {
        let verifier = StripeWebhookVerifier::new(TEST_SECRET);
        let now = 1_704_067_200;
        let header = sign_stripe_payload(TEST_SECRET, now - 600, PAYLOAD);

        let result = verifier.verify_and_parse_at(PAYLOAD.as_bytes(), &header, now);

        assert!(matches!(result, Err(WebhookError::TimestampOutOfRange)));
    }

    // ══════════════════════════════════════════════════════════════
    // Zaxaa Verification Tests
    // ══════════════════════════════════════════════════════════════

    const ZAXAA_SECRET: &str = "zx_secret";
    const ZAXAA_BODY: &str = r#"{"trans_type":"SALE","trans_receipt":"R-100"}"#;

    #[test]
    fn zaxaa_valid_signature() {
        let verifier = ZaxaaWebhookVerifier::new(ZAXAA_SECRET);
        let signature = sign_zaxaa_payload(ZAXAA_SECRET, ZAXAA_BODY);

        let event = verifier.verify_and_parse(ZAXAA_BODY.as_bytes(), &signature).unwrap();

        assert_eq!(event.trans_receipt, "R-100");
    }

    #[test]
    fn zaxaa_wrong_signature_fails() {
        let verifier = ZaxaaWebhookVerifier::new(ZAXAA_SECRET);
        let signature = sign_zaxaa_payload("other", ZAXAA_BODY);

        let result = verifier.verify_and_parse(ZAXAA_BODY.as_bytes(), &signature);

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn zaxaa_non_hex_signature_fails() {
        let verifier = ZaxaaWebhookVerifier::new(ZAXAA_SECRET);
        let result = verifier.verify_and_parse(ZAXAA_BODY.as_bytes(), "zz-not-hex");
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn zaxaa_signed_garbage_is_a_parse_error() {
        let verifier = ZaxaaWebhookVerifier::new(ZAXAA_SECRET);
        let signature = sign_zaxaa_payload(ZAXAA_SECRET, "[]");
        let result = verifier.verify_and_parse(b"[]", &signature);
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    // ══════════════════════════════════════════════════════════════
    // Constant Time Comparison Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn constant_time_compare_cases() {
        assert!(constant_time_compare(&[1, 2, 3], &[1, 2, 3]));
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 4]));
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 3, 4]));
        assert!(constant_time_compare(&[], &[]));
    }
}
