//! Template Generator - deterministic last-resort TextGenerator.
//!
//! Never calls out and never fails, so a provider chain ending in it always answers.

use async_trait::async_trait;

use crate::ports::{GenerationError, TextGenerator};

const PROVIDER: &str = "template";
const MAX_ECHO_CHARS: usize = 280;

#[derive(Debug, Clone, Default)]
pub struct TemplateGenerator;

impl TemplateGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Renders the fallback text for a prompt.
    pub fn render(prompt: &str) -> String {
        let request = collapse_whitespace(prompt);
        let request = match request.char_indices().nth(MAX_ECHO_CHARS) {
            Some((idx, _)) => format!("{}...", &request[..idx]),
            None => request,
        };

        format!(
            "AI assistance is unavailable right now, so here is a starting draft.\n\n\
             Request: {}\n\n\
             Next steps:\n\
             1. Review the details of the contact or deal this concerns.\n\
             2. Write a short, specific message that addresses the request above.\n\
             3. End with one clear call to action.",
            request
        )
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl TextGenerator for TemplateGenerator {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        Ok(Self::render(prompt))
    }
}
