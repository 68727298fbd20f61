//! Webhook response bodies.

use serde::{Deserialize, Serialize};

use crate::ports::WebhookResult;

/// Acknowledgement returned for every accepted delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookAck {
    pub received: bool,
    /// Present only for deliveries of an already-claimed event.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub duplicate: bool,
}

impl From<&WebhookResult> for WebhookAck {
    fn from(result: &WebhookResult) -> Self {
        Self {
            received: true,
            duplicate: result.is_duplicate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn applied_ack_omits_duplicate_flag() {
        let ack = WebhookAck::from(&WebhookResult::Applied);
        assert_eq!(serde_json::to_value(ack).unwrap(), json!({"received": true}));
    }

    #[test]
    fn duplicate_ack_carries_flag() {
        let ack = WebhookAck::from(&WebhookResult::Duplicate);
        assert_eq!(
            serde_json::to_value(ack).unwrap(),
            json!({"received": true, "duplicate": true})
        );
    }
}
