//! Typed fact buckets produced by extraction.

use serde::{Deserialize, Serialize};

/// Information classified out of a single patient utterance.
///
/// Produced fresh for every turn and never persisted as-is; the router turns
/// it into store-specific records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedInfo {
    #[serde(default)]
    pub medical_conditions: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub current_symptoms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pain_level: Option<String>,
    #[serde(default)]
    pub preferences: Vec<String>,
}

impl ExtractedInfo {
    /// Whether nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.medical_conditions.is_empty()
            && self.allergies.is_empty()
            && self.medications.is_empty()
            && self.current_symptoms.is_empty()
            && self.pain_level().is_none()
            && self.preferences.is_empty()
    }

    /// The reported pain level, ignoring blank values.
    pub fn pain_level(&self) -> Option<&str> {
        self.pain_level
            .as_deref()
            .map(str::trim)
            .filter(|level| !level.is_empty())
    }

    /// Short description of what was extracted, for logging.
    ///
    /// Returns `None` when nothing was extracted.
    pub fn summary(&self) -> Option<String> {
        let mut parts = Vec::new();
        if !self.medical_conditions.is_empty() {
            parts.push(format!("conditions: {}", self.medical_conditions.len()));
        }
        if !self.allergies.is_empty() {
            parts.push(format!("allergies: {}", self.allergies.len()));
        }
        if !self.medications.is_empty() {
            parts.push(format!("medications: {}", self.medications.len()));
        }
        if !self.current_symptoms.is_empty() {
            parts.push(format!("symptoms: {}", self.current_symptoms.len()));
        }
        if self.pain_level().is_some() {
            parts.push("pain level".to_string());
        }
        if !self.preferences.is_empty() {
            parts.push(format!("preferences: {}", self.preferences.len()));
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}
