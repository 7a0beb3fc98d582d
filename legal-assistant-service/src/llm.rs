//! Completion endpoint adapter.
//!
//! Handlers talk to a [`LanguageModel`] and always get plain text back; the
//! provider-specific response handling stays inside the implementation.

use async_trait::async_trait;
use rig::{client::CompletionClient, completion::Prompt, providers::openrouter};
use tracing::debug;

/// One completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f64,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: 0.0,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Run the request and return the response text unmodified
    async fn complete(&self, request: CompletionRequest) -> anyhow::Result<String>;
}

/// OpenRouter-backed model, built on rig's agent API
pub struct OpenRouterModel {
    client: openrouter::Client,
    model: String,
}

impl OpenRouterModel {
    pub fn new(api_key: &str, model: impl Into<String>) -> Self {
        Self {
            client: openrouter::Client::new(api_key),
            model: model.into(),
        }
    }
}

#[async_trait]
impl LanguageModel for OpenRouterModel {
    async fn complete(&self, request: CompletionRequest) -> anyhow::Result<String> {
        let agent = self
            .client
            .agent(&self.model)
            .temperature(request.temperature)
            .build();

        debug!(
            model = %self.model,
            prompt_chars = request.prompt.chars().count(),
            "sending completion request"
        );
        let response = agent.prompt(request.prompt.as_str()).await?;
        debug!(model = %self.model, response_chars = response.chars().count(), "completion received");

        Ok(response)
    }
}
