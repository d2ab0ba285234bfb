//! Conversation sessions: one patient, one append-only history.

mod turn;

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::{ContextAssembler, DEFAULT_VISIT_LIMIT};
use crate::extraction::InformationExtractor;
use crate::identity::{IdentityMatch, IdentityResolver};
use crate::prompts::{greeting_prompt, response_prompt, APOLOGY_RESPONSE};
use crate::routing::MemoryRouter;
use crate::stores::MemoryStores;
use crate::traits::Llm;
use crate::types::{ExtractedInfo, SessionIdentity};

pub use turn::{SessionSummary, Turn, MEMORY_SYSTEMS};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SessionState {
    /// No patient name yet; every turn asks for one.
    Unidentified,
    /// Bound to a patient for the rest of the session.
    Identified,
}

/// Tunables for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Visits included in each assembled context.
    pub recent_visit_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            recent_visit_limit: DEFAULT_VISIT_LIMIT,
        }
    }
}

/// Drives the per-message pipeline for one conversation.
///
/// `process_message` takes `&mut self`, so a session handles one message at
/// a time. Stores are shared and may back several sessions.
pub struct ConversationSession {
    session_id: Uuid,
    identity: SessionIdentity,
    resolver: IdentityResolver,
    extractor: InformationExtractor,
    router: MemoryRouter,
    assembler: ContextAssembler,
    llm: Arc<dyn Llm>,
    history: Vec<Turn>,
}

impl ConversationSession {
    pub fn new(llm: Arc<dyn Llm>, stores: MemoryStores) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            identity: SessionIdentity::unresolved(),
            resolver: IdentityResolver::new(),
            extractor: InformationExtractor::new(Arc::clone(&llm)),
            router: MemoryRouter::new(stores.clone()),
            assembler: ContextAssembler::new(stores),
            llm,
            history: Vec::new(),
        }
    }

    /// Apply session tunables.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.assembler = self.assembler.with_visit_limit(config.recent_visit_limit);
        self
    }

    /// Process one patient message and return the assistant's reply.
    ///
    /// Never fails: extraction falls back to keywords, store failures are
    /// dropped or rendered into the context, and a failed completion yields
    /// [`APOLOGY_RESPONSE`].
    pub async fn process_message(&mut self, utterance: &str) -> String {
        if !self.identity.is_resolved() {
            match self.resolver.resolve(utterance) {
                IdentityMatch::Resolved(name) => {
                    info!(session_id = %self.session_id, patient_id = %name, "Patient identified");
                    self.identity.bind(name);
                }
                IdentityMatch::Rejected(reason) => {
                    debug!(session_id = %self.session_id, ?reason, "No patient name in message");
                    let response = self.complete_or_apologize(&greeting_prompt()).await;
                    self.history.push(Turn::new(
                        utterance,
                        response.clone(),
                        ExtractedInfo::default(),
                        Vec::new(),
                    ));
                    return response;
                }
            }
        }

        let extracted = self.extractor.extract(utterance, &self.identity).await;
        let ops = self.router.route(&self.identity, &extracted);
        let writes = self.router.commit(ops);

        let patient_id = self.identity.patient_id().unwrap_or_default().to_string();
        let context = self.assembler.assemble(&patient_id);
        let prompt = response_prompt(&patient_id, &context.render(), utterance);
        let response = self.complete_or_apologize(&prompt).await;

        self.history
            .push(Turn::new(utterance, response.clone(), extracted, writes));
        response
    }

    async fn complete_or_apologize(&self, prompt: &str) -> String {
        match self.llm.complete(prompt, None).await {
            Ok(text) => text,
            Err(err) => {
                warn!(session_id = %self.session_id, error = %err, "Response generation failed");
                APOLOGY_RESPONSE.to_string()
            }
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn state(&self) -> SessionState {
        if self.identity.is_resolved() {
            SessionState::Identified
        } else {
            SessionState::Unidentified
        }
    }

    /// All turns so far, oldest first.
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.history.last()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            patient_name: self.identity.patient_id().map(str::to_string),
            has_name: self.identity.is_resolved(),
            total_exchanges: self.history.len(),
            memory_systems_used: MEMORY_SYSTEMS.iter().map(|s| s.to_string()).collect(),
        }
    }
}
