//! Configuration system for medmem.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{MedMemError, MedMemResult};
use crate::traits::LlmConfig;

/// Completion provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Groq,
    OpenAI,
    Anthropic,
    Ollama,
}

impl LlmProvider {
    /// Parse a provider name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "groq" => Some(Self::Groq),
            "openai" => Some(Self::OpenAI),
            "anthropic" | "claude" => Some(Self::Anthropic),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    /// Environment variable holding this provider's API key, if it needs one.
    pub fn api_key_var(&self) -> Option<&'static str> {
        match self {
            Self::Groq => Some("GROQ_API_KEY"),
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Ollama => None,
        }
    }

    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Groq => "llama-3.1-8b-instant",
            Self::OpenAI => "gpt-4o-mini",
            Self::Anthropic => "claude-3-5-haiku-20241022",
            Self::Ollama => "llama3.1:8b",
        }
    }
}

/// Provider configuration with type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    /// Provider type.
    pub provider: LlmProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub config: LlmConfig,
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Groq,
            config: LlmConfig {
                model: LlmProvider::Groq.default_model().to_string(),
                ..Default::default()
            },
        }
    }
}

/// Main medmem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MedMemConfig {
    /// Completion provider configuration.
    pub llm: LlmProviderConfig,
    /// Directory holding the store databases.
    pub data_dir: PathBuf,
    /// Path to the visit (episodic) database.
    pub visits_db_path: PathBuf,
    /// Path to the behavioral profile database.
    pub profiles_db_path: PathBuf,
    /// Path to the medical fact (semantic) database.
    pub facts_db_path: PathBuf,
    /// Number of recent visits included in the patient context.
    pub recent_visit_limit: usize,
}

impl Default for MedMemConfig {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .map(|h| h.join(".medmem"))
            .unwrap_or_else(|| PathBuf::from(".medmem"));
        Self::with_data_dir(data_dir)
    }
}

impl MedMemConfig {
    /// Default configuration with every database placed under `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            llm: LlmProviderConfig::default(),
            visits_db_path: data_dir.join("medical_memory.db"),
            profiles_db_path: data_dir.join("behavioral_memory.db"),
            facts_db_path: data_dir.join("medical_facts.db"),
            data_dir,
            recent_visit_limit: 5,
        }
    }

    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> MedMemResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| MedMemError::Configuration(e.to_string()))
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| MedMemError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| MedMemError::Configuration(e.to_string())),
            _ => Err(MedMemError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = match std::env::var("MEDMEM_DATA_DIR") {
            Ok(dir) => Self::with_data_dir(dir),
            Err(_) => Self::default(),
        };

        if let Ok(provider) = std::env::var("MEDMEM_LLM_PROVIDER") {
            match LlmProvider::parse(&provider) {
                Some(p) => {
                    config.llm.provider = p;
                    config.llm.config.model = p.default_model().to_string();
                }
                None => {
                    tracing::warn!(provider = %provider, "Unknown LLM provider, keeping default")
                }
            }
        }
        if let Ok(model) = std::env::var("MEDMEM_LLM_MODEL") {
            config.llm.config.model = model;
        }
        if let Some(var) = config.llm.provider.api_key_var() {
            if let Ok(api_key) = std::env::var(var) {
                config.llm.config.api_key = Some(api_key);
            }
        }
        if let Ok(url) = std::env::var("MEDMEM_LLM_BASE_URL") {
            config.llm.config.base_url = Some(url);
        }

        config
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> MedMemConfigBuilder {
        MedMemConfigBuilder::default()
    }
}

/// Builder for MedMemConfig.
#[derive(Default)]
pub struct MedMemConfigBuilder {
    config: MedMemConfig,
}

impl MedMemConfigBuilder {
    /// Set the completion provider configuration.
    pub fn llm(mut self, config: LlmProviderConfig) -> Self {
        self.config.llm = config;
        self
    }

    /// Move every database under `data_dir`.
    pub fn data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        let llm = self.config.llm;
        let limit = self.config.recent_visit_limit;
        self.config = MedMemConfig::with_data_dir(data_dir);
        self.config.llm = llm;
        self.config.recent_visit_limit = limit;
        self
    }

    /// Set the visit database path.
    pub fn visits_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.visits_db_path = path.into();
        self
    }

    /// Set the profile database path.
    pub fn profiles_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.profiles_db_path = path.into();
        self
    }

    /// Set the fact database path.
    pub fn facts_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.facts_db_path = path.into();
        self
    }

    /// Set how many recent visits the context includes.
    pub fn recent_visit_limit(mut self, limit: usize) -> Self {
        self.config.recent_visit_limit = limit;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> MedMemConfig {
        self.config
    }
}
