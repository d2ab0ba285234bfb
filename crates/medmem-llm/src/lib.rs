//! medmem-llm - Completion provider implementations for medmem.
//!
//! # Supported Providers
//!
//! - **Groq** - hosted open models over the OpenAI-compatible API (default)
//! - **OpenAI** - GPT-4o and friends
//! - **Ollama** - local models via Ollama's OpenAI-compatible endpoint
//! - **Anthropic** - Claude via the Messages API
//!
//! # Example
//!
//! ```ignore
//! use medmem_llm::LlmFactory;
//!
//! // Groq with the default model, key from GROQ_API_KEY
//! let llm = LlmFactory::groq()?;
//!
//! // Or a local Ollama model
//! let llm = LlmFactory::ollama_with_model("llama3.1:8b")?;
//! ```

mod anthropic;
mod factory;
mod openai_compat;

pub use anthropic::AnthropicLlm;
pub use factory::LlmFactory;
pub use openai_compat::{Endpoint, OpenAiCompatibleLlm};

// Re-export core types for convenience
pub use medmem_core::config::LlmProvider;
pub use medmem_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse};
