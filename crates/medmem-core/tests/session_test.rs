//! Integration tests for the conversation pipeline.
//!
//! Sessions run against in-memory stores and a scripted completion service
//! that answers classification prompts from a queue and records every
//! response prompt it is given.

use async_trait::async_trait;
use chrono::Local;
use medmem_core::error::{ErrorCode, MedMemError, MedMemResult, StoreKind};
use medmem_core::extraction::InformationExtractor;
use medmem_core::prompts::APOLOGY_RESPONSE;
use medmem_core::routing::{plan_writes, ASSESSMENT_ONGOING};
use medmem_core::stores::{
    InMemoryFactStore, InMemoryProfileStore, InMemoryVisitStore, MemoryStores,
};
use medmem_core::traits::{
    FactSearch, FactStore, GenerationOptions, Llm, LlmResponse, ProfileStore, UpsertStatus,
    VisitStore,
};
use medmem_core::{
    BehavioralProfile, ConversationSession, EpisodicVisit, ExtractedInfo, FactType, Message,
    ScoredFact, SemanticFact, SessionIdentity, SessionState, WriteOp, WriteOutcome,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

const REPLY: &str = "Thanks, I'll keep that in mind.";

/// Completion double: classification prompts pop a scripted reply (or fail
/// when the queue is empty); every other prompt gets [`REPLY`].
#[derive(Default)]
struct ScriptedLlm {
    classifications: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    fail_responses: bool,
}

impl ScriptedLlm {
    fn with_classifications(replies: &[&str]) -> Self {
        Self {
            classifications: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            ..Default::default()
        }
    }

    fn response_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Llm for ScriptedLlm {
    async fn generate(
        &self,
        messages: &[Message],
        _options: Option<GenerationOptions>,
    ) -> MedMemResult<LlmResponse> {
        let prompt = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        if prompt.starts_with("Analyze this patient statement") {
            return match self.classifications.lock().unwrap().pop_front() {
                Some(reply) => Ok(LlmResponse::text(reply)),
                None => Err(MedMemError::completion("classifier offline")),
            };
        }

        self.prompts.lock().unwrap().push(prompt);
        if self.fail_responses {
            return Err(MedMemError::completion("responder offline"));
        }
        Ok(LlmResponse::text(REPLY))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Visit store that rejects every call.
struct BrokenVisitStore;

impl VisitStore for BrokenVisitStore {
    fn insert(&self, _visit: &EpisodicVisit) -> MedMemResult<i64> {
        Err(MedMemError::store_write(StoreKind::Visit, "disk full"))
    }

    fn most_recent(&self, _patient_id: &str, _limit: usize) -> MedMemResult<Vec<EpisodicVisit>> {
        Err(MedMemError::store_read(StoreKind::Visit, "disk unreadable"))
    }
}

/// Fact store that rejects every call.
struct BrokenFactStore;

impl FactStore for BrokenFactStore {
    fn append(&self, _fact: &SemanticFact) -> MedMemResult<()> {
        Err(MedMemError::store_write(StoreKind::Fact, "database is locked"))
    }

    fn all_for(&self, _patient_id: &str) -> MedMemResult<Vec<SemanticFact>> {
        Err(MedMemError::store_read(StoreKind::Fact, "database is locked"))
    }
}

impl FactSearch for BrokenFactStore {
    fn search(&self, _patient_id: &str, _query: &str, _k: usize) -> MedMemResult<Vec<ScoredFact>> {
        Err(MedMemError::store_read(StoreKind::Fact, "database is locked"))
    }
}

/// Profile store that rejects every call.
struct BrokenProfileStore;

impl ProfileStore for BrokenProfileStore {
    fn upsert(&self, _profile: &BehavioralProfile) -> MedMemResult<UpsertStatus> {
        Err(MedMemError::store_write(StoreKind::Profile, "read-only file"))
    }

    fn get(&self, _patient_id: &str) -> MedMemResult<Option<BehavioralProfile>> {
        Err(MedMemError::store_read(StoreKind::Profile, "read-only file"))
    }
}

#[tokio::test]
async fn test_end_to_end_first_message() {
    let llm = Arc::new(ScriptedLlm::with_classifications(&[
        "MEDICAL CONDITIONS: diabetes\nALLERGIES: none\nMEDICATIONS: none\n\
         CURRENT SYMPTOMS: back pain\nPAIN LEVEL: 6/10\nPREFERENCES: none",
    ]));
    let stores = MemoryStores::in_memory();
    let mut session = ConversationSession::new(llm.clone(), stores.clone());

    let reply = session
        .process_message("I'm John, I have diabetes and my back hurts 6/10")
        .await;
    assert_eq!(reply, REPLY);
    assert_eq!(session.identity().patient_id(), Some("John"));
    assert_eq!(session.state(), SessionState::Identified);

    let turn = session.last_turn().unwrap();
    assert_eq!(turn.extracted_info.medical_conditions, vec!["diabetes"]);
    assert_eq!(turn.extracted_info.current_symptoms, vec!["back pain"]);
    assert_eq!(turn.extracted_info.pain_level.as_deref(), Some("6/10"));

    let targets: Vec<StoreKind> = turn
        .writes
        .iter()
        .map(|w| match w {
            WriteOutcome::Stored { target, .. } => *target,
            other => panic!("unexpected outcome {:?}", other),
        })
        .collect();
    assert_eq!(targets, vec![StoreKind::Visit, StoreKind::Fact]);

    let facts = stores.facts.all_for("John").unwrap();
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].fact_type, FactType::Condition);
    assert_eq!(facts[0].fact_value, "diabetes");

    let visits = stores.visits.most_recent("John", 5).unwrap();
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0].symptoms, "back pain");
    assert_eq!(visits[0].diagnosis, "Pain level: 6/10");
    assert_eq!(visits[0].date, Local::now().date_naive());

    assert!(stores.profiles.get("John").unwrap().is_none());

    // The response prompt already sees this turn's writes.
    let prompts = llm.response_prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Medical History: condition: diabetes"));
    assert!(prompts[0].contains("back pain → Pain level: 6/10 → Treatment plan pending"));
}

#[tokio::test]
async fn test_unidentified_messages_keep_asking_for_name() {
    let llm = Arc::new(ScriptedLlm::default());
    let stores = MemoryStores::in_memory();
    let mut session = ConversationSession::new(llm.clone(), stores.clone());

    for utterance in ["hello", "hi!", "Hey", "ok"] {
        session.process_message(utterance).await;
        assert_eq!(session.state(), SessionState::Unidentified, "after {:?}", utterance);
    }

    assert_eq!(session.history().len(), 4);
    assert!(session.history().iter().all(|t| t.writes.is_empty()));
    assert!(llm
        .response_prompts()
        .iter()
        .all(|p| p.contains("ask for their name")));
    assert!(!session.summary().has_name);
}

#[tokio::test]
async fn test_identity_is_fixed_for_the_session() {
    let llm = Arc::new(ScriptedLlm::default());
    let mut session = ConversationSession::new(llm, MemoryStores::in_memory());

    session.process_message("My name is Jane Doe").await;
    assert_eq!(session.identity().patient_id(), Some("Jane Doe"));

    session.process_message("Actually, my name is Mary").await;
    session.process_message("Call me Bob").await;
    assert_eq!(session.identity().patient_id(), Some("Jane Doe"));

    let summary = session.summary();
    assert_eq!(summary.patient_name.as_deref(), Some("Jane Doe"));
    assert!(summary.has_name);
    assert_eq!(summary.total_exchanges, 3);
}

#[tokio::test]
async fn test_extraction_parses_partial_reply() {
    let llm = Arc::new(ScriptedLlm::with_classifications(&[
        "ALLERGIES: dust; pollen\nPAIN LEVEL: 7/10",
    ]));
    let extractor = InformationExtractor::new(llm);

    let info = extractor
        .extract("dust and pollen get me, pain is 7", &SessionIdentity::resolved("P1"))
        .await;
    assert_eq!(info.allergies, vec!["dust", "pollen"]);
    assert_eq!(info.pain_level.as_deref(), Some("7/10"));
    assert!(info.medical_conditions.is_empty());
    assert!(info.medications.is_empty());
    assert!(info.current_symptoms.is_empty());
    assert!(info.preferences.is_empty());
}

#[tokio::test]
async fn test_extraction_falls_back_to_keywords() {
    let extractor = InformationExtractor::new(Arc::new(ScriptedLlm::default()));

    let info = extractor
        .extract("I have dust allergy", &SessionIdentity::resolved("P1"))
        .await;
    assert_eq!(info.allergies, vec!["dust"]);
}

#[test]
fn test_routing_symptom_only_and_empty() {
    let identity = SessionIdentity::resolved("P1");
    let today = Local::now().date_naive();

    let info = ExtractedInfo {
        current_symptoms: vec!["back pain".to_string()],
        ..Default::default()
    };
    let ops = plan_writes(&identity, &info, today);
    assert_eq!(ops.len(), 1);
    match &ops[0] {
        WriteOp::RecordVisit(visit) => {
            assert_eq!(visit.patient_id, "P1");
            assert_eq!(visit.diagnosis, ASSESSMENT_ONGOING);
            assert_eq!(visit.date, today);
        }
        other => panic!("unexpected op {:?}", other),
    }

    assert!(plan_writes(&identity, &ExtractedInfo::default(), today).is_empty());
}

#[test]
fn test_profile_upsert_keeps_one_row() {
    let profiles = InMemoryProfileStore::new();

    profiles
        .upsert(&BehavioralProfile::with_notes("P1", "morning appointments"))
        .unwrap();
    profiles
        .upsert(&BehavioralProfile::with_notes("P1", "prefers evenings"))
        .unwrap();

    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles.get("P1").unwrap().unwrap().habit_notes, "prefers evenings");
}

#[tokio::test]
async fn test_empty_context_placeholders_in_order() {
    let llm = Arc::new(ScriptedLlm::with_classifications(&["MEDICAL CONDITIONS: none"]));
    let mut session = ConversationSession::new(llm.clone(), MemoryStores::in_memory());

    session.process_message("I'm Alice").await;

    let prompt = &llm.response_prompts()[0];
    let facts = prompt.find("No medical facts found").unwrap();
    let visits = prompt.find("No previous visits found").unwrap();
    let profile = prompt.find("No behavioral patterns found").unwrap();
    assert!(facts < visits && visits < profile);
}

#[tokio::test]
async fn test_store_failure_degrades_turn() {
    let llm = Arc::new(ScriptedLlm::with_classifications(&[
        "CURRENT SYMPTOMS: headache\nMEDICATIONS: ibuprofen",
    ]));
    let stores = MemoryStores::new(
        Arc::new(BrokenVisitStore),
        Arc::new(InMemoryProfileStore::new()),
        Arc::new(InMemoryFactStore::new()),
    );
    let mut session = ConversationSession::new(llm.clone(), stores.clone());

    let reply = session.process_message("I'm Sam, I have a headache").await;
    assert_eq!(reply, REPLY);

    let writes = &session.last_turn().unwrap().writes;
    assert_eq!(writes.len(), 2);
    assert!(matches!(
        &writes[0],
        WriteOutcome::Failed { target: StoreKind::Visit, kind: ErrorCode::StoreWriteFailed, .. }
    ));
    assert!(writes[1].is_success());
    assert_eq!(stores.facts.all_for("Sam").unwrap().len(), 1);

    let prompt = &llm.response_prompts()[0];
    assert!(prompt
        .contains("Error loading visit history: Visit store unavailable: disk unreadable"));
    assert!(prompt.contains("Medical History: medication: ibuprofen"));
}

#[tokio::test]
async fn test_fact_and_profile_failures_degrade_turn() {
    let llm = Arc::new(ScriptedLlm::with_classifications(&[
        "MEDICAL CONDITIONS: asthma\nCURRENT SYMPTOMS: wheezing\nPREFERENCES: evening calls",
    ]));
    let stores = MemoryStores::new(
        Arc::new(InMemoryVisitStore::new()),
        Arc::new(BrokenProfileStore),
        Arc::new(BrokenFactStore),
    );
    let mut session = ConversationSession::new(llm.clone(), stores.clone());

    let reply = session.process_message("I'm Lena, my asthma is acting up").await;
    assert_eq!(reply, REPLY);

    let writes = &session.last_turn().unwrap().writes;
    assert_eq!(writes.len(), 3);
    assert!(writes[0].is_success());
    assert!(matches!(
        &writes[1],
        WriteOutcome::Failed { target: StoreKind::Fact, kind: ErrorCode::StoreWriteFailed, .. }
    ));
    assert!(matches!(
        &writes[2],
        WriteOutcome::Failed { target: StoreKind::Profile, kind: ErrorCode::StoreWriteFailed, .. }
    ));
    assert_eq!(stores.visits.most_recent("Lena", 5).unwrap().len(), 1);

    let prompt = &llm.response_prompts()[0];
    assert!(prompt.contains(
        "Medical History: Error loading medical facts: Fact store unavailable: database is locked"
    ));
    assert!(prompt.contains(
        "Patient Preferences: Error loading behavioral data: \
         Profile store unavailable: read-only file"
    ));
    assert!(prompt.contains("wheezing → Assessment ongoing → Treatment plan pending"));
}

#[tokio::test]
async fn test_completion_failure_returns_apology() {
    let llm = Arc::new(ScriptedLlm {
        fail_responses: true,
        ..ScriptedLlm::with_classifications(&["PREFERENCES: teleconsult on Fridays"])
    });
    let stores = MemoryStores::in_memory();
    let mut session = ConversationSession::new(llm, stores.clone());

    let reply = session.process_message("I'm Priya. Fridays online work best").await;
    assert_eq!(reply, APOLOGY_RESPONSE);

    // Writes still landed before the response failed.
    let profile = stores.profiles.get("Priya").unwrap().unwrap();
    assert_eq!(profile.habit_notes, "teleconsult on Fridays");
    assert_eq!(session.history().len(), 1);
}

#[tokio::test]
async fn test_facts_accumulate_across_sessions() {
    let stores = MemoryStores::in_memory();

    let first = Arc::new(ScriptedLlm::with_classifications(&["ALLERGIES: penicillin"]));
    let mut session = ConversationSession::new(first, stores.clone());
    session.process_message("I'm Omar, allergic to penicillin").await;

    let second = Arc::new(ScriptedLlm::with_classifications(&[
        "MEDICAL CONDITIONS: none",
        "MEDICATIONS: metformin",
    ]));
    let mut session = ConversationSession::new(second.clone(), stores.clone());
    session.process_message("Omar here").await;
    session.process_message("I started metformin").await;

    let prompts = second.response_prompts();
    assert!(prompts[0].contains("allergy: penicillin"));
    assert!(prompts[1].contains("allergy: penicillin; medication: metformin"));
}
