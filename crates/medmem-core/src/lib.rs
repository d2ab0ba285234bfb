//! medmem-core - Core library for medmem.
//!
//! This crate provides the conversational memory orchestrator behind the
//! medical assistant: identity resolution, fact extraction, routing of facts
//! to the episodic, semantic and behavioral stores, and patient context
//! assembly.
//!
//! # Example
//!
//! ```ignore
//! use medmem_core::{ConversationSession, MemoryStores, MedMemConfig};
//!
//! let config = MedMemConfig::from_env();
//! let stores = MemoryStores::sqlite(&config)?;
//! let mut session = ConversationSession::new(llm, stores);
//!
//! let reply = session.process_message("I'm John, I have diabetes").await;
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod extraction;
pub mod identity;
pub mod prompts;
pub mod routing;
pub mod session;
pub mod stores;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{LlmProvider, LlmProviderConfig, MedMemConfig};
pub use context::ContextAssembler;
pub use error::{ErrorCode, MedMemError, MedMemResult, StoreKind};
pub use extraction::InformationExtractor;
pub use identity::{IdentityMatch, IdentityResolver, NameRejection};
pub use routing::{MemoryRouter, WriteOp, WriteOutcome};
pub use session::{ConversationSession, SessionConfig, SessionState, SessionSummary, Turn};
pub use stores::MemoryStores;
pub use traits::{
    FactSearch, FactStore, GenerationOptions, Llm, LlmConfig, LlmResponse, ProfileStore,
    UpsertStatus, VisitStore,
};
pub use types::{
    BehavioralProfile, EpisodicVisit, ExtractedInfo, FactType, Message, MessageRole,
    PatientContext, ScoredFact, SemanticFact, SessionIdentity, TeleconsultPreference,
};
