use crate::error::LlmError;
use async_trait::async_trait;
use rig::completion::Prompt;
use rig::prelude::*;
use rig::providers::openai;
use tracing::{debug, instrument};

type LLMAgent = rig::agent::Agent<openai::CompletionModel>;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f64 = 0.5;
const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// A single blocking completion: one prompt in, one generated string out.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// OpenAI chat model driven through `rig`.
///
/// The API key is read on every call, so a missing key only fails the action
/// that needs the model.
#[derive(Debug, Clone)]
pub struct OpenAiModel {
    model: String,
    temperature: f64,
}

impl OpenAiModel {
    pub fn new(model: impl Into<String>, temperature: f64) -> Self {
        Self {
            model: model.into(),
            temperature,
        }
    }

    fn agent(&self) -> Result<LLMAgent, LlmError> {
        let api_key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;
        let client = openai::Client::new(&api_key);
        Ok(client
            .agent(&self.model)
            .temperature(self.temperature)
            .build())
    }
}

impl Default for OpenAiModel {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL, DEFAULT_TEMPERATURE)
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_chars = prompt.chars().count()))]
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let agent = self.agent()?;
        let response = agent
            .prompt(prompt)
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let response = response.trim().to_string();
        if response.is_empty() {
            return Err(LlmError::EmptyCompletion);
        }
        debug!("Model returned {} characters", response.len());
        Ok(response)
    }
}
