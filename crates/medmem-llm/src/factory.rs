//! Factory for creating completion providers.

use std::sync::Arc;

use tracing::info;

use medmem_core::config::{LlmProvider, LlmProviderConfig};
use medmem_core::error::MedMemResult;
use medmem_core::traits::{Llm, LlmConfig};

use crate::anthropic::AnthropicLlm;
use crate::openai_compat::{Endpoint, OpenAiCompatibleLlm};

/// Factory for creating completion providers.
pub struct LlmFactory;

impl LlmFactory {
    /// Create a provider from the given configuration.
    ///
    /// Fails with a configuration error when the provider needs an API key
    /// and none is available.
    pub fn create(provider: LlmProvider, config: LlmConfig) -> MedMemResult<Arc<dyn Llm>> {
        let llm: Arc<dyn Llm> = match provider {
            LlmProvider::Groq => Arc::new(OpenAiCompatibleLlm::new(Endpoint::GROQ, config)?),
            LlmProvider::OpenAI => Arc::new(OpenAiCompatibleLlm::new(Endpoint::OPENAI, config)?),
            LlmProvider::Ollama => Arc::new(OpenAiCompatibleLlm::new(Endpoint::OLLAMA, config)?),
            LlmProvider::Anthropic => Arc::new(AnthropicLlm::new(config)?),
        };
        info!(?provider, model = llm.model_name(), "Completion provider ready");
        Ok(llm)
    }

    /// Create a provider from a provider config section.
    pub fn from_config(config: &LlmProviderConfig) -> MedMemResult<Arc<dyn Llm>> {
        Self::create(config.provider, config.config.clone())
    }

    /// Groq with the default model.
    pub fn groq() -> MedMemResult<Arc<dyn Llm>> {
        Self::create(LlmProvider::Groq, LlmConfig::default())
    }

    /// Groq with a specific model.
    pub fn groq_with_model(model: impl Into<String>) -> MedMemResult<Arc<dyn Llm>> {
        let config = LlmConfig {
            model: model.into(),
            ..Default::default()
        };
        Self::create(LlmProvider::Groq, config)
    }

    /// Local Ollama with a specific model.
    pub fn ollama_with_model(model: impl Into<String>) -> MedMemResult<Arc<dyn Llm>> {
        let config = LlmConfig {
            model: model.into(),
            ..Default::default()
        };
        Self::create(LlmProvider::Ollama, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_each_provider() {
        let keyed = LlmConfig {
            api_key: Some("key".to_string()),
            ..Default::default()
        };
        for provider in [LlmProvider::Groq, LlmProvider::OpenAI, LlmProvider::Anthropic] {
            let llm = LlmFactory::create(provider, keyed.clone()).unwrap();
            assert_eq!(llm.model_name(), provider.default_model());
        }

        let llm = LlmFactory::ollama_with_model("mistral").unwrap();
        assert_eq!(llm.model_name(), "mistral");
    }

    #[test]
    fn test_from_config_keeps_model() {
        let config = LlmProviderConfig {
            provider: LlmProvider::OpenAI,
            config: LlmConfig {
                model: "gpt-4o".to_string(),
                api_key: Some("key".to_string()),
                ..Default::default()
            },
        };
        assert_eq!(LlmFactory::from_config(&config).unwrap().model_name(), "gpt-4o");
    }
}
