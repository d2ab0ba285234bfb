//! Routing extracted facts to the long-term stores.

use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use crate::error::{ErrorCode, MedMemError, StoreKind};
use crate::stores::MemoryStores;
use crate::traits::UpsertStatus;
use crate::types::{
    BehavioralProfile, EpisodicVisit, ExtractedInfo, FactType, SemanticFact, SessionIdentity,
};

/// Symptoms recorded when a visit is triggered by a pain level alone.
pub const GENERAL_CONSULTATION: &str = "General consultation";
/// Diagnosis recorded when no pain level was reported.
pub const ASSESSMENT_ONGOING: &str = "Assessment ongoing";

/// One write, addressed to exactly one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    RecordVisit(EpisodicVisit),
    AppendFact(SemanticFact),
    UpsertProfile(BehavioralProfile),
}

impl WriteOp {
    /// The store this write targets.
    pub fn target(&self) -> StoreKind {
        match self {
            WriteOp::RecordVisit(_) => StoreKind::Visit,
            WriteOp::AppendFact(_) => StoreKind::Fact,
            WriteOp::UpsertProfile(_) => StoreKind::Profile,
        }
    }
}

/// What happened to one write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// A new record was written.
    Stored { target: StoreKind, detail: String },
    /// An existing record was replaced.
    Updated { target: StoreKind, detail: String },
    /// The store rejected the write; it was dropped.
    Failed {
        target: StoreKind,
        kind: ErrorCode,
        message: String,
    },
}

impl WriteOutcome {
    /// Whether the write reached the store.
    pub fn is_success(&self) -> bool {
        !matches!(self, WriteOutcome::Failed { .. })
    }

    fn failed(target: StoreKind, err: MedMemError) -> Self {
        WriteOutcome::Failed {
            target,
            kind: err.code(),
            message: err.to_string(),
        }
    }
}

/// Decides which stores receive writes and applies them.
#[derive(Clone)]
pub struct MemoryRouter {
    stores: MemoryStores,
}

impl MemoryRouter {
    pub fn new(stores: MemoryStores) -> Self {
        Self { stores }
    }

    /// Plan the writes for an extraction, dated today.
    pub fn route(&self, identity: &SessionIdentity, info: &ExtractedInfo) -> Vec<WriteOp> {
        self.route_on(identity, info, Local::now().date_naive())
    }

    /// Plan the writes for an extraction on a fixed date.
    pub fn route_on(
        &self,
        identity: &SessionIdentity,
        info: &ExtractedInfo,
        date: NaiveDate,
    ) -> Vec<WriteOp> {
        plan_writes(identity, info, date)
    }

    /// Apply planned writes in order. Failed writes are logged and dropped,
    /// never retried.
    pub fn commit(&self, ops: Vec<WriteOp>) -> Vec<WriteOutcome> {
        ops.into_iter().map(|op| self.apply(op)).collect()
    }

    fn apply(&self, op: WriteOp) -> WriteOutcome {
        let target = op.target();
        let outcome = match op {
            WriteOp::RecordVisit(visit) => match self.stores.visits.insert(&visit) {
                Ok(id) => WriteOutcome::Stored {
                    target,
                    detail: format!("visit #{}: {}", id, visit.symptoms),
                },
                Err(err) => WriteOutcome::failed(target, err),
            },
            WriteOp::AppendFact(fact) => match self.stores.facts.append(&fact) {
                Ok(()) => WriteOutcome::Stored {
                    target,
                    detail: format!("{}: {}", fact.fact_type, fact.fact_value),
                },
                Err(err) => WriteOutcome::failed(target, err),
            },
            WriteOp::UpsertProfile(profile) => match self.stores.profiles.upsert(&profile) {
                Ok(UpsertStatus::Created) => WriteOutcome::Stored {
                    target,
                    detail: profile.habit_notes,
                },
                Ok(UpsertStatus::Updated) => WriteOutcome::Updated {
                    target,
                    detail: profile.habit_notes,
                },
                Err(err) => WriteOutcome::failed(target, err),
            },
        };

        match &outcome {
            WriteOutcome::Stored { target, detail } => {
                info!(store = %target, "Stored {}", detail)
            }
            WriteOutcome::Updated { target, detail } => {
                info!(store = %target, "Updated {}", detail)
            }
            WriteOutcome::Failed {
                target, message, ..
            } => warn!(store = %target, error = %message, "Dropped write"),
        }
        outcome
    }
}

/// Plan the writes for an extraction on a given date.
///
/// Order: the visit (if any), then facts by type (conditions, allergies,
/// medications), then the profile. Nothing is planned for an unresolved
/// identity.
pub fn plan_writes(
    identity: &SessionIdentity,
    info: &ExtractedInfo,
    date: NaiveDate,
) -> Vec<WriteOp> {
    let Some(patient_id) = identity.patient_id() else {
        return Vec::new();
    };
    let mut ops = Vec::new();

    let pain_level = info.pain_level();
    if !info.current_symptoms.is_empty() || pain_level.is_some() {
        let symptoms = if info.current_symptoms.is_empty() {
            GENERAL_CONSULTATION.to_string()
        } else {
            info.current_symptoms.join("; ")
        };
        let diagnosis = match pain_level {
            Some(level) => format!("Pain level: {}", level),
            None => ASSESSMENT_ONGOING.to_string(),
        };
        ops.push(WriteOp::RecordVisit(EpisodicVisit::new(
            patient_id, date, symptoms, diagnosis,
        )));
    }

    let facts = [
        (FactType::Condition, &info.medical_conditions),
        (FactType::Allergy, &info.allergies),
        (FactType::Medication, &info.medications),
    ];
    for (fact_type, values) in facts {
        ops.extend(values.iter().map(|value| {
            WriteOp::AppendFact(SemanticFact::new(patient_id, fact_type, value.as_str()))
        }));
    }

    // Counters are reset to defaults on every preference write; the upsert
    // replaces any values already on file.
    if !info.preferences.is_empty() {
        ops.push(WriteOp::UpsertProfile(BehavioralProfile::with_notes(
            patient_id,
            info.preferences.join("; "),
        )));
    }

    ops
}
