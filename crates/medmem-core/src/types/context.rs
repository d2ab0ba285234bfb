//! Aggregated patient context.

use serde::{Deserialize, Serialize};

/// The three memory fragments assembled for one patient.
///
/// Derived on every turn and never persisted. Each fragment is either real
/// data, a fixed placeholder, or an error note for a store that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientContext {
    pub patient_id: String,
    pub medical_facts: String,
    pub recent_visits: String,
    pub behavioral: String,
}

impl PatientContext {
    /// The fragments in their fixed order: semantic, visits, behavioral.
    pub fn fragments(&self) -> [&str; 3] {
        [&self.medical_facts, &self.recent_visits, &self.behavioral]
    }

    /// Render the context block handed to the completion service.
    pub fn render(&self) -> String {
        format!(
            "Patient: {}\n\nMedical History: {}\n\nRecent Visits:\n{}\n\nPatient Preferences: {}",
            self.patient_id, self.medical_facts, self.recent_visits, self.behavioral
        )
    }
}
