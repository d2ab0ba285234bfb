//! Long-term store traits.
//!
//! Store calls are blocking and synchronous. Implementations must be safe to
//! share between sessions; serialising concurrent writes for the same
//! patient is the store's job, not the caller's.

use crate::error::MedMemResult;
use crate::types::{BehavioralProfile, EpisodicVisit, ScoredFact, SemanticFact};

/// Outcome of a profile upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertStatus {
    /// No profile existed for the patient.
    Created,
    /// An existing profile was replaced.
    Updated,
}

/// Append-only log of patient visits (episodic memory).
pub trait VisitStore: Send + Sync {
    /// Record a visit and return its row id.
    fn insert(&self, visit: &EpisodicVisit) -> MedMemResult<i64>;

    /// Most recent visits for a patient, newest date first. Visits on the
    /// same date come back most recently inserted first.
    fn most_recent(&self, patient_id: &str, limit: usize) -> MedMemResult<Vec<EpisodicVisit>>;
}

/// One replaceable profile per patient (behavioral memory).
pub trait ProfileStore: Send + Sync {
    /// Insert or replace the patient's profile. Never merges fields.
    fn upsert(&self, profile: &BehavioralProfile) -> MedMemResult<UpsertStatus>;

    /// Get the patient's profile.
    fn get(&self, patient_id: &str) -> MedMemResult<Option<BehavioralProfile>>;
}

/// Append-only log of atomic medical facts (semantic memory).
pub trait FactStore: Send + Sync {
    /// Append a fact. Duplicates are stored as-is.
    fn append(&self, fact: &SemanticFact) -> MedMemResult<()>;

    /// Every fact recorded for a patient, in no particular order.
    fn all_for(&self, patient_id: &str) -> MedMemResult<Vec<SemanticFact>>;
}

/// Fact store that can rank a patient's facts against a free-text query.
///
/// Only used by presentation layers; the conversation pipeline reads facts
/// through [`FactStore::all_for`].
pub trait FactSearch: FactStore {
    /// Top `k` facts for the patient by relevance to `query`, best first.
    fn search(&self, patient_id: &str, query: &str, k: usize) -> MedMemResult<Vec<ScoredFact>>;
}
