//! Text generation port.
//!
//! One capability, `generate(prompt) -> text`, implemented once per LLM vendor plus a
//! deterministic template fallback. Which provider runs is decided by an explicit
//! priority list, not by which API keys happen to be set.

use async_trait::async_trait;
use thiserror::Error;

/// Port for prompt-to-text generation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Stable provider name, e.g. `openai`.
    fn name(&self) -> &'static str;

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Text produced by a generation chain and the provider that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedText {
    pub text: String,
    pub provider: &'static str,
}

/// Port for an ordered set of generators that answers with the first success.
#[async_trait]
pub trait GenerationChain: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedText, GenerationError>;
}

/// Errors from text generation providers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("rate limited by {provider}")]
    RateLimited { provider: &'static str },

    #[error("authentication failed for {provider}")]
    AuthenticationFailed { provider: &'static str },

    #[error("{provider} unavailable: {message}")]
    Unavailable {
        provider: &'static str,
        message: String,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Every provider in the chain failed.
    #[error("all providers failed: {0}")]
    Exhausted(String),
}

impl GenerationError {
    /// Returns true if the next provider in a chain should be tried.
    pub fn should_fall_through(&self) -> bool {
        !matches!(self, GenerationError::InvalidRequest(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_generator_is_object_safe() {
        fn _accepts_dyn(_generator: &dyn TextGenerator) {}
    }

    #[test]
    fn generation_chain_is_object_safe() {
        fn _accepts_dyn(_chain: &dyn GenerationChain) {}
    }

    #[test]
    fn invalid_requests_stop_the_chain() {
        assert!(!GenerationError::InvalidRequest("empty".into()).should_fall_through());
        assert!(GenerationError::RateLimited { provider: "openai" }.should_fall_through());
        assert!(GenerationError::Timeout { timeout_secs: 30 }.should_fall_through());
    }
}
