//! Provider Chain - ordered TextGenerator fallback.
//!
//! Generators are tried in configured priority order. Retryable failures fall
//! through to the next provider; an invalid request stops the chain since every
//! provider would reject it. The template generator always closes the chain.
//!
//! # Example
//!
//! ```ignore
//! let chain = ProviderChain::from_config(&config.ai)?;
//! let generated = chain.generate("Draft a renewal reminder").await?;
//! println!("{} answered", generated.provider);
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{AiConfig, AiProvider};
use crate::ports::{GeneratedText, GenerationChain, GenerationError, TextGenerator};

use super::gemini_generator::{GeminiConfig, GeminiGenerator};
use super::openai_generator::{OpenAiConfig, OpenAiGenerator};
use super::template_generator::TemplateGenerator;

const TEMPLATE: &str = "template";

pub struct ProviderChain {
    generators: Vec<Arc<dyn TextGenerator>>,
}

impl ProviderChain {
    /// Builds a chain from generators in priority order.
    ///
    /// Any template entries are moved to a single trailing template generator.
    pub fn new(mut generators: Vec<Arc<dyn TextGenerator>>) -> Self {
        generators.retain(|g| g.name() != TEMPLATE);
        generators.push(Arc::new(TemplateGenerator::new()));
        Self { generators }
    }

    /// Builds the chain described by `ai.provider_order`.
    ///
    /// Providers whose API key is absent are left out.
    pub fn from_config(config: &AiConfig) -> Result<Self, GenerationError> {
        let order = config
            .provider_order()
            .map_err(|e| GenerationError::InvalidRequest(e.to_string()))?;

        let mut generators: Vec<Arc<dyn TextGenerator>> = Vec::new();
        for provider in order {
            match provider {
                AiProvider::OpenAi => {
                    if let Some(key) = config.openai_api_key.clone().filter(|_| config.has_openai()) {
                        let openai = OpenAiConfig::new(key)
                            .with_model(config.openai_model.clone())
                            .with_timeout(config.timeout());
                        generators.push(Arc::new(OpenAiGenerator::new(openai)?));
                    }
                }
                AiProvider::Gemini => {
                    if let Some(key) = config.gemini_api_key.clone().filter(|_| config.has_gemini()) {
                        let gemini = GeminiConfig::new(key)
                            .with_model(config.gemini_model.clone())
                            .with_timeout(config.timeout());
                        generators.push(Arc::new(GeminiGenerator::new(gemini)?));
                    }
                }
                AiProvider::Template => {}
            }
        }

        Ok(Self::new(generators))
    }

    /// Provider names in the order they are tried.
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.generators.iter().map(|g| g.name()).collect()
    }
}

#[async_trait]
impl GenerationChain for ProviderChain {
    /// Returns the first successful generation.
    async fn generate(&self, prompt: &str) -> Result<GeneratedText, GenerationError> {
        let mut failures = Vec::new();

        for generator in &self.generators {
            match generator.generate(prompt).await {
                Ok(text) => {
                    if !failures.is_empty() {
                        tracing::info!(
                            provider = generator.name(),
                            skipped = failures.len(),
                            "text generated by fallback provider"
                        );
                    }
                    return Ok(GeneratedText {
                        text,
                        provider: generator.name(),
                    });
                }
                Err(err) if err.should_fall_through() => {
                    tracing::warn!(
                        provider = generator.name(),
                        error = %err,
                        "text provider failed, trying next"
                    );
                    failures.push(format!("{}: {}", generator.name(), err));
                }
                Err(err) => return Err(err),
            }
        }

        Err(GenerationError::Exhausted(failures.join("; ")))
    }
}
