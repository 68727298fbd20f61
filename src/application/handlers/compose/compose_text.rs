//! ComposeTextHandler - runs a prompt through the generation chain.

use std::sync::Arc;

use crate::ports::{GeneratedText, GenerationChain, GenerationError};

const MAX_PROMPT_CHARS: usize = 8_000;

#[derive(Debug, Clone)]
pub struct ComposeTextCommand {
    pub prompt: String,
}

pub struct ComposeTextHandler {
    chain: Arc<dyn GenerationChain>,
}

impl ComposeTextHandler {
    pub fn new(chain: Arc<dyn GenerationChain>) -> Self {
        Self { chain }
    }

    pub async fn handle(&self, cmd: ComposeTextCommand) -> Result<GeneratedText, GenerationError> {
        let prompt = cmd.prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationError::InvalidRequest(
                "prompt must not be empty".to_string(),
            ));
        }
        if prompt.chars().count() > MAX_PROMPT_CHARS {
            return Err(GenerationError::InvalidRequest(format!(
                "prompt exceeds {} characters",
                MAX_PROMPT_CHARS
            )));
        }

        let generated = self.chain.generate(prompt).await?;
        tracing::debug!(provider = generated.provider, "Composed text");
        Ok(generated)
    }
}
