use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::openai;
use tracing::instrument;

use crate::domain::{ports::LlmService, DomainError, QualityLevel};
use crate::infrastructure::config::LlmConfig;

const API_KEY_VAR: &str = "OPENAI_API_KEY";

pub struct OpenAiLlm {
    high_model: String,
    low_model: String,
    max_tokens: u64,
}

impl OpenAiLlm {
    pub fn new(high_model: impl Into<String>, low_model: impl Into<String>) -> Self {
        Self {
            high_model: high_model.into(),
            low_model: low_model.into(),
            max_tokens: 2048,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(&config.high_model, &config.low_model).with_max_tokens(config.max_tokens)
    }

    pub fn with_max_tokens(mut self, max_tokens: u64) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn model(&self, level: QualityLevel) -> &str {
        match level {
            QualityLevel::High => &self.high_model,
            QualityLevel::Low => &self.low_model,
        }
    }
}

#[async_trait]
impl LlmService for OpenAiLlm {
    #[instrument(skip(self, system, prompt), fields(level = level.as_str(), model = self.model(level)))]
    async fn complete(
        &self,
        level: QualityLevel,
        system: &str,
        prompt: &str,
    ) -> Result<String, DomainError> {
        if std::env::var(API_KEY_VAR).map_or(true, |k| k.is_empty()) {
            return Err(DomainError::external(format!("{API_KEY_VAR} is not set")));
        }

        let client = openai::Client::from_env();
        let agent = client
            .agent(self.model(level))
            .preamble(system)
            .max_tokens(self.max_tokens)
            .build();
        agent
            .prompt(prompt)
            .await
            .map_err(|e| DomainError::external(e.to_string()))
    }
}
