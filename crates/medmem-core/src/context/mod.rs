//! Patient context assembly across the three stores.

use tracing::warn;

use crate::stores::MemoryStores;
use crate::types::{BehavioralProfile, EpisodicVisit, FactType, PatientContext, SemanticFact};

pub const NO_FACTS: &str = "No medical facts found";
pub const NO_VISITS: &str = "No previous visits found";
pub const NO_PROFILE: &str = "No behavioral patterns found";

/// Default number of recent visits included in a context.
pub const DEFAULT_VISIT_LIMIT: usize = 5;

/// Reads all three stores and renders one context block per patient.
///
/// Assembly never fails: empty stores produce fixed placeholders and a failing
/// store produces an error note in its own fragment only.
#[derive(Clone)]
pub struct ContextAssembler {
    stores: MemoryStores,
    visit_limit: usize,
}

impl ContextAssembler {
    pub fn new(stores: MemoryStores) -> Self {
        Self {
            stores,
            visit_limit: DEFAULT_VISIT_LIMIT,
        }
    }

    /// Set how many recent visits are included.
    pub fn with_visit_limit(mut self, visit_limit: usize) -> Self {
        self.visit_limit = visit_limit;
        self
    }

    /// Assemble the context for a patient, reading facts, visits and profile in that order.
    pub fn assemble(&self, patient_id: &str) -> PatientContext {
        let medical_facts = match self.stores.facts.all_for(patient_id) {
            Ok(facts) => render_facts(facts),
            Err(err) => {
                warn!(patient_id, error = %err, "Failed to load medical facts");
                format!("Error loading medical facts: {}", err)
            }
        };

        let recent_visits = match self.stores.visits.most_recent(patient_id, self.visit_limit) {
            Ok(visits) => render_visits(&visits),
            Err(err) => {
                warn!(patient_id, error = %err, "Failed to load visit history");
                format!("Error loading visit history: {}", err)
            }
        };

        let behavioral = match self.stores.profiles.get(patient_id) {
            Ok(profile) => render_profile(profile.as_ref()),
            Err(err) => {
                warn!(patient_id, error = %err, "Failed to load behavioral data");
                format!("Error loading behavioral data: {}", err)
            }
        };

        PatientContext {
            patient_id: patient_id.to_string(),
            medical_facts,
            recent_visits,
            behavioral,
        }
    }
}

/// `"condition: a, b; allergy: c"` with groups in fixed type order and
/// values newest first.
pub fn render_facts(mut facts: Vec<SemanticFact>) -> String {
    if facts.is_empty() {
        return NO_FACTS.to_string();
    }
    facts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    FactType::ALL
        .iter()
        .filter_map(|fact_type| {
            let values: Vec<&str> = facts
                .iter()
                .filter(|f| f.fact_type == *fact_type)
                .map(|f| f.fact_value.as_str())
                .collect();
            if values.is_empty() {
                None
            } else {
                Some(format!("{}: {}", fact_type, values.join(", ")))
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// One `"• date: symptoms → diagnosis → prescription"` line per visit.
pub fn render_visits(visits: &[EpisodicVisit]) -> String {
    if visits.is_empty() {
        return NO_VISITS.to_string();
    }
    visits
        .iter()
        .map(|v| {
            format!(
                "• {}: {} → {} → {}",
                v.date.format("%Y-%m-%d"),
                v.symptoms,
                v.diagnosis,
                v.prescription
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_profile(profile: Option<&BehavioralProfile>) -> String {
    match profile {
        Some(p) => format!(
            "Missed appointments: {}; Prefers teleconsult: {}; Notes: {}",
            p.missed_appointments, p.prefers_teleconsult, p.habit_notes
        ),
        None => NO_PROFILE.to_string(),
    }
}
