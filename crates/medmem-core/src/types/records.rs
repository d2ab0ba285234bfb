//! Records owned by the three long-term stores.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Prescription recorded for visits created from conversation.
pub const PENDING_PRESCRIPTION: &str = "Treatment plan pending";

/// One discrete patient visit (episodic memory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodicVisit {
    pub patient_id: String,
    pub date: NaiveDate,
    pub symptoms: String,
    pub diagnosis: String,
    pub prescription: String,
}

impl EpisodicVisit {
    /// Create a visit with the pending prescription placeholder.
    pub fn new(
        patient_id: impl Into<String>,
        date: NaiveDate,
        symptoms: impl Into<String>,
        diagnosis: impl Into<String>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            date,
            symptoms: symptoms.into(),
            diagnosis: diagnosis.into(),
            prescription: PENDING_PRESCRIPTION.to_string(),
        }
    }
}

/// Whether a patient prefers teleconsultation.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TeleconsultPreference {
    Yes,
    No,
    #[default]
    Unknown,
}

/// The single mutable habits/preferences profile of a patient (behavioral memory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehavioralProfile {
    pub patient_id: String,
    #[serde(default)]
    pub missed_appointments: u32,
    #[serde(default)]
    pub prefers_teleconsult: TeleconsultPreference,
    #[serde(default)]
    pub habit_notes: String,
}

impl BehavioralProfile {
    /// Create a profile with default counters and the given notes.
    pub fn with_notes(patient_id: impl Into<String>, habit_notes: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            missed_appointments: 0,
            prefers_teleconsult: TeleconsultPreference::Unknown,
            habit_notes: habit_notes.into(),
        }
    }
}

/// Kind of an atomic medical fact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FactType {
    Condition,
    Allergy,
    Medication,
}

impl FactType {
    /// All fact types, in the order they are rendered.
    pub const ALL: [FactType; 3] = [FactType::Condition, FactType::Allergy, FactType::Medication];
}

/// An atomic medical fact (semantic memory). Duplicates are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticFact {
    pub patient_id: String,
    pub fact_type: FactType,
    pub fact_value: String,
    pub created_at: DateTime<Utc>,
}

impl SemanticFact {
    /// Create a fact stamped with the current time.
    pub fn new(
        patient_id: impl Into<String>,
        fact_type: FactType,
        fact_value: impl Into<String>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            fact_type,
            fact_value: fact_value.into(),
            created_at: Utc::now(),
        }
    }

    /// Override the creation timestamp.
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// A semantic fact with a relevance score from a fact search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFact {
    pub fact: SemanticFact,
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_fact_type_round_trip_strings() {
        assert_eq!(FactType::Allergy.as_ref(), "allergy");
        assert_eq!(FactType::from_str("medication").unwrap(), FactType::Medication);
        assert!(FactType::from_str("symptom").is_err());
    }

    #[test]
    fn test_teleconsult_parse_is_case_insensitive() {
        assert_eq!(TeleconsultPreference::from_str("YES").unwrap(), TeleconsultPreference::Yes);
        assert_eq!(TeleconsultPreference::default().to_string(), "unknown");
    }

    #[test]
    fn test_visit_defaults_to_pending_prescription() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let visit = EpisodicVisit::new("P1", date, "cough", "Assessment ongoing");
        assert_eq!(visit.prescription, PENDING_PRESCRIPTION);
    }
}
