//! Chat-completions provider for OpenAI-compatible APIs (Groq, OpenAI, Ollama).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use medmem_core::error::{MedMemError, MedMemResult};
use medmem_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse, TokenUsage};
use medmem_core::types::Message;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Where an OpenAI-compatible API lives and how it authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Provider name used in log and error messages.
    pub name: &'static str,
    pub base_url: &'static str,
    /// Environment variable holding the API key. `None` for keyless local servers.
    pub api_key_var: Option<&'static str>,
    pub default_model: &'static str,
}

impl Endpoint {
    pub const GROQ: Endpoint = Endpoint {
        name: "Groq",
        base_url: "https://api.groq.com/openai/v1",
        api_key_var: Some("GROQ_API_KEY"),
        default_model: "llama-3.1-8b-instant",
    };

    pub const OPENAI: Endpoint = Endpoint {
        name: "OpenAI",
        base_url: "https://api.openai.com/v1",
        api_key_var: Some("OPENAI_API_KEY"),
        default_model: "gpt-4o-mini",
    };

    pub const OLLAMA: Endpoint = Endpoint {
        name: "Ollama",
        base_url: "http://localhost:11434/v1",
        api_key_var: None,
        default_model: "llama3.1:8b",
    };
}

/// Provider speaking the `/chat/completions` protocol.
pub struct OpenAiCompatibleLlm {
    client: Client,
    config: LlmConfig,
    endpoint: Endpoint,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatError {
    error: ChatErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ChatErrorDetail {
    message: String,
}

impl OpenAiCompatibleLlm {
    /// Create a provider for the given endpoint.
    ///
    /// The API key comes from the config, then the endpoint's environment
    /// variable. A missing key for an endpoint that needs one is a
    /// configuration error.
    pub fn new(endpoint: Endpoint, config: LlmConfig) -> MedMemResult<Self> {
        let api_key = match endpoint.api_key_var {
            Some(var) => Some(
                config
                    .api_key
                    .clone()
                    .or_else(|| std::env::var(var).ok())
                    .filter(|k| !k.trim().is_empty())
                    .ok_or_else(|| MedMemError::missing_credentials(var, endpoint.name))?,
            ),
            None => config.api_key.clone(),
        };

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                MedMemError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| endpoint.base_url.to_string())
            .trim_end_matches('/')
            .to_string();

        let mut config = config;
        if config.model.is_empty() {
            config.model = endpoint.default_model.to_string();
        }

        Ok(Self {
            client,
            config,
            endpoint,
            base_url,
            api_key,
        })
    }

    /// Groq endpoint.
    pub fn groq(config: LlmConfig) -> MedMemResult<Self> {
        Self::new(Endpoint::GROQ, config)
    }

    /// OpenAI endpoint.
    pub fn openai(config: LlmConfig) -> MedMemResult<Self> {
        Self::new(Endpoint::OPENAI, config)
    }

    /// Local Ollama endpoint.
    pub fn ollama(config: LlmConfig) -> MedMemResult<Self> {
        Self::new(Endpoint::OLLAMA, config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request<'a>(
        &'a self,
        messages: &'a [Message],
        options: &GenerationOptions,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: options.temperature.unwrap_or(self.config.temperature),
            max_tokens: options.max_tokens.unwrap_or(self.config.max_tokens),
        }
    }
}

fn parse_response(body: &str) -> MedMemResult<LlmResponse> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| MedMemError::completion(format!("Failed to parse response: {}", e)))?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content);

    let usage = response.usage.map(|u| TokenUsage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });

    Ok(LlmResponse { content, usage })
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ChatError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[async_trait]
impl Llm for OpenAiCompatibleLlm {
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> MedMemResult<LlmResponse> {
        let options = options.unwrap_or_default();
        let request = self.build_request(messages, &options);
        debug!(
            provider = self.endpoint.name,
            model = %self.config.model,
            "Sending chat completion"
        );

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            MedMemError::completion_transport(
                format!("{} API request failed", self.endpoint.name),
                e,
            )
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            MedMemError::completion_transport("Failed to read response body", e)
        })?;

        if !status.is_success() {
            return Err(MedMemError::completion(format!(
                "{} API error ({}): {}",
                self.endpoint.name,
                status,
                error_message(&body)
            )));
        }

        parse_response(&body)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medmem_core::error::ErrorCode;

    fn keyed() -> LlmConfig {
        LlmConfig {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_presets_fill_model_and_url() {
        let llm = OpenAiCompatibleLlm::groq(keyed()).unwrap();
        assert_eq!(llm.model_name(), "llama-3.1-8b-instant");
        assert_eq!(llm.base_url(), "https://api.groq.com/openai/v1");

        let llm = OpenAiCompatibleLlm::ollama(LlmConfig::default()).unwrap();
        assert_eq!(llm.base_url(), "http://localhost:11434/v1");
        assert!(llm.api_key.is_none());
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let endpoint = Endpoint {
            name: "Test",
            base_url: "http://localhost:1",
            api_key_var: Some("MEDMEM_TEST_KEY_THAT_IS_NEVER_SET"),
            default_model: "m",
        };
        let err = OpenAiCompatibleLlm::new(endpoint, LlmConfig::default())
            .err()
            .unwrap();
        assert_eq!(err.code(), ErrorCode::CfgInvalid);
        assert!(err.to_string().contains("MEDMEM_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_request_uses_option_overrides() {
        let llm = OpenAiCompatibleLlm::openai(LlmConfig {
            base_url: Some("http://proxy.local/v1/".to_string()),
            ..keyed()
        })
        .unwrap();
        assert_eq!(llm.base_url(), "http://proxy.local/v1");

        let messages = [Message::system("be brief"), Message::user("hi")];
        let options = GenerationOptions {
            temperature: Some(0.1),
            max_tokens: Some(400),
        };
        let json = serde_json::to_value(llm.build_request(&messages, &options)).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 400);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");

        let request = llm.build_request(&messages, &GenerationOptions::default());
        let json = serde_json::to_value(request).unwrap();
        assert_eq!(json["max_tokens"], 1024);
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hello Jane"}}],
            "usage":{"prompt_tokens":10,"completion_tokens":3,"total_tokens":13}}"#;
        let response = parse_response(body).unwrap();
        assert_eq!(response.content.as_deref(), Some("Hello Jane"));
        assert_eq!(response.usage.unwrap().total_tokens, 13);

        assert!(parse_response("not json").is_err());
        assert_eq!(
            error_message(r#"{"error":{"message":"rate limited"}}"#),
            "rate limited"
        );
    }
}
