use async_trait::async_trait;
use rig::completion::Prompt;
use rig::prelude::*;
use rig::providers::gemini;
use tracing::debug;

use crate::error::{AgentError, Result};

/// Model used for every mood-inference and trivia prompt.
pub const GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Single-turn text completion, the only capability the agents need from a
/// generative model. Object-safe so handlers can hold `Arc<dyn TextModel>` and
/// tests can substitute stubs.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

pub struct GeminiModel {
    agent: rig::agent::Agent<gemini::completion::CompletionModel>,
}

impl GeminiModel {
    pub fn new(api_key: &str) -> Self {
        let client = gemini::Client::new(api_key);
        let agent = client.agent(GEMINI_MODEL).build();
        Self { agent }
    }
}

#[async_trait]
impl TextModel for GeminiModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(model = GEMINI_MODEL, "sending prompt");
        let response = self
            .agent
            .prompt(prompt)
            .await
            .map_err(|e| AgentError::Model(e.to_string()))?;
        Ok(response.trim().to_string())
    }
}

/// Split a comma-separated model reply into trimmed, non-empty terms.
pub fn split_terms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_string)
        .collect()
}
