//! Information extraction: utterance to typed fact buckets.
//!
//! The primary path asks the completion service for a six-label
//! classification. If that call fails or its reply cannot be parsed, the
//! extractor falls back to a keyword heuristic. Extraction never fails.

mod heuristic;
mod parser;

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{MedMemError, MedMemResult};
use crate::prompts::classification_prompt;
use crate::traits::{GenerationOptions, Llm};
use crate::types::{ExtractedInfo, SessionIdentity};

pub use heuristic::extract_heuristic;
pub use parser::parse_classification;

/// Classifies patient utterances into [`ExtractedInfo`].
pub struct InformationExtractor {
    llm: Arc<dyn Llm>,
    options: GenerationOptions,
}

impl InformationExtractor {
    /// Create an extractor backed by the given completion service.
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self {
            llm,
            options: GenerationOptions {
                temperature: Some(0.1),
                max_tokens: Some(400),
            },
        }
    }

    /// Extract facts from an utterance.
    ///
    /// Returns an empty result without contacting the completion service
    /// when the identity is not resolved yet.
    pub async fn extract(&self, utterance: &str, identity: &SessionIdentity) -> ExtractedInfo {
        if !identity.is_resolved() {
            debug!("Skipping extraction: patient identity unresolved");
            return ExtractedInfo::default();
        }

        let info = match self.extract_with_llm(utterance).await {
            Ok(info) => info,
            Err(err) => {
                warn!(error = %err, "LLM extraction unavailable, using keyword fallback");
                extract_heuristic(utterance)
            }
        };

        if let Some(summary) = info.summary() {
            debug!(patient_id = identity.patient_id(), "Extracted: {}", summary);
        }
        info
    }

    /// Primary path: classify via the completion service.
    ///
    /// Every failure, transport or parse, is reported as
    /// [`MedMemError::ExtractionUnavailable`].
    pub async fn extract_with_llm(&self, utterance: &str) -> MedMemResult<ExtractedInfo> {
        let reply = self
            .llm
            .complete(&classification_prompt(utterance), Some(self.options.clone()))
            .await
            .map_err(|e| MedMemError::extraction_unavailable(e.to_string()))?;
        parse_classification(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::traits::LlmResponse;
    use crate::types::Message;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replies with a fixed text, or fails when `reply` is `None`.
    struct FixedLlm {
        reply: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl FixedLlm {
        fn new(reply: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Llm for FixedLlm {
        async fn generate(
            &self,
            _messages: &[Message],
            _options: Option<GenerationOptions>,
        ) -> MedMemResult<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Some(text) => Ok(LlmResponse::text(text)),
                None => Err(MedMemError::completion("connection refused")),
            }
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_unresolved_identity_is_noop() {
        let llm = FixedLlm::new(Some("ALLERGIES: dust"));
        let extractor = InformationExtractor::new(llm.clone());

        let info = extractor
            .extract("I have dust allergy", &SessionIdentity::unresolved())
            .await;
        assert!(info.is_empty());
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_llm_path() {
        let llm = FixedLlm::new(Some("ALLERGIES: dust; pollen\nPAIN LEVEL: 7/10"));
        let extractor = InformationExtractor::new(llm);

        let info = extractor
            .extract("anything", &SessionIdentity::resolved("P1"))
            .await;
        assert_eq!(info.allergies, vec!["dust", "pollen"]);
        assert_eq!(info.pain_level.as_deref(), Some("7/10"));
        assert!(info.medical_conditions.is_empty());
        assert!(info.medications.is_empty());
        assert!(info.current_symptoms.is_empty());
        assert!(info.preferences.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_when_llm_fails() {
        let extractor = InformationExtractor::new(FixedLlm::new(None));

        let err = extractor.extract_with_llm("I have dust allergy").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ExtCompletionFailed);

        let info = extractor
            .extract("I have dust allergy", &SessionIdentity::resolved("P1"))
            .await;
        assert_eq!(info.allergies, vec!["dust"]);
    }

    #[test]
    fn test_fallback_when_reply_unparseable() {
        let extractor = InformationExtractor::new(FixedLlm::new(Some("Sure! Happy to help.")));

        let info = tokio_test::block_on(
            extractor.extract("pain is 4 out of 10", &SessionIdentity::resolved("P1")),
        );
        assert_eq!(info.pain_level.as_deref(), Some("4/10"));
    }
}
