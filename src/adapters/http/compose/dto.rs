//! Compose request and response bodies.

use serde::{Deserialize, Serialize};

use crate::ports::GeneratedText;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ComposeRequest {
    /// Missing prompts deserialize as empty and are rejected by the handler.
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ComposeResponse {
    pub text: String,
    /// Provider that produced the text, e.g. `openai` or `template`.
    pub provider: String,
}

impl From<GeneratedText> for ComposeResponse {
    fn from(generated: GeneratedText) -> Self {
        Self {
            text: generated.text,
            provider: generated.provider.to_string(),
        }
    }
}
