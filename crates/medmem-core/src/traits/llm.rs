//! Completion service trait and related types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, MedMemError, MedMemResult};
use crate::types::Message;

/// Response from a completion request.
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    /// Generated text content.
    pub content: Option<String>,
    /// Token usage statistics.
    pub usage: Option<TokenUsage>,
}

impl LlmResponse {
    /// Create a response carrying only text.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            usage: None,
        }
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Per-request generation options. Unset fields fall back to the provider config.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    /// Sampling temperature (0.0 - 2.0).
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
}

/// The text-completion service used for classification and response generation.
///
/// Any error returned here is treated by the core as a collaborator outage:
/// extraction falls back to heuristics and response generation degrades to an
/// apology. Transport errors never reach the end user.
#[async_trait]
pub trait Llm: Send + Sync {
    /// Generate a response for the given messages.
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> MedMemResult<LlmResponse>;

    /// Get the model name.
    fn model_name(&self) -> &str;

    /// Complete a single prompt, sent as one user message.
    ///
    /// Fails when the provider returns no text.
    async fn complete(
        &self,
        prompt: &str,
        options: Option<GenerationOptions>,
    ) -> MedMemResult<String> {
        let response = self.generate(&[Message::user(prompt)], options).await?;
        match response.content {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(MedMemError::CompletionFailure {
                message: format!("{} returned an empty completion", self.model_name()),
                code: ErrorCode::LlmEmptyResponse,
                source: None,
            }),
        }
    }
}

/// Completion provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model name/identifier. Empty selects the provider default.
    #[serde(default)]
    pub model: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// API key (if not using environment variable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL for API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            api_key: None,
            base_url: None,
        }
    }
}
