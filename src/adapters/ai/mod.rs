//! Text generation adapters.
//!
//! - `OpenAiGenerator` - OpenAI Chat Completions
//! - `GeminiGenerator` - Google Gemini `generateContent`
//! - `TemplateGenerator` - deterministic fallback, never fails
//! - `ProviderChain` - tries generators in configured priority order

mod gemini_generator;
mod http_support;
mod openai_generator;
mod provider_chain;
mod template_generator;

pub use gemini_generator::{GeminiConfig, GeminiGenerator};
pub use openai_generator::{OpenAiConfig, OpenAiGenerator};
pub use provider_chain::ProviderChain;
pub use template_generator::TemplateGenerator;
