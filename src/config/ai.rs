//! AI provider configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::error::ValidationError;

/// Text provider settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub openai_api_key: Option<SecretString>,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    pub gemini_api_key: Option<SecretString>,

    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Per-request timeout for remote providers, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Comma-separated priority order, e.g. `gemini,openai,template`
    #[serde(default = "default_provider_order")]
    pub provider_order: String,
}

/// Text provider kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    OpenAi,
    Gemini,
    Template,
}

impl AiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "openai",
            AiProvider::Gemini => "gemini",
            AiProvider::Template => "template",
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiProvider {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(AiProvider::OpenAi),
            "gemini" => Ok(AiProvider::Gemini),
            "template" => Ok(AiProvider::Template),
            other => Err(ValidationError::UnknownAiProvider(other.to_string())),
        }
    }
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn has_openai(&self) -> bool {
        has_key(&self.openai_api_key)
    }

    pub fn has_gemini(&self) -> bool {
        has_key(&self.gemini_api_key)
    }

    /// Parsed priority order, duplicates removed, first occurrence wins.
    pub fn provider_order(&self) -> Result<Vec<AiProvider>, ValidationError> {
        let mut order = Vec::new();
        for entry in self.provider_order.split(',').filter(|s| !s.trim().is_empty()) {
            let provider: AiProvider = entry.parse()?;
            if !order.contains(&provider) {
                order.push(provider);
            }
        }
        Ok(order)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.provider_order()?;
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout("ai.timeout_secs"));
        }
        Ok(())
    }
}

fn has_key(key: &Option<SecretString>) -> bool {
    key.as_ref().is_some_and(|k| !k.expose_secret().trim().is_empty())
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: default_openai_model(),
            gemini_api_key: None,
            gemini_model: default_gemini_model(),
            timeout_secs: default_timeout(),
            provider_order: default_provider_order(),
        }
    }
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_provider_order() -> String {
    "openai,gemini,template".to_string()
}
