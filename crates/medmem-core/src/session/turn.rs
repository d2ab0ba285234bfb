use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::routing::WriteOutcome;
use crate::types::ExtractedInfo;

/// Names of the long-term memory systems a session reads and writes.
pub const MEMORY_SYSTEMS: [&str; 3] = ["episodic", "behavioral", "medical_facts"];

/// One exchange in a session's history.
#[derive(Debug, Clone)]
pub struct Turn {
    pub utterance: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
    pub extracted_info: ExtractedInfo,
    pub writes: Vec<WriteOutcome>,
}

impl Turn {
    pub(crate) fn new(
        utterance: impl Into<String>,
        response: impl Into<String>,
        extracted_info: ExtractedInfo,
        writes: Vec<WriteOutcome>,
    ) -> Self {
        Self {
            utterance: utterance.into(),
            response: response.into(),
            timestamp: Utc::now(),
            extracted_info,
            writes,
        }
    }
}

/// End-of-session report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub patient_name: Option<String>,
    pub has_name: bool,
    pub total_exchanges: usize,
    pub memory_systems_used: Vec<String>,
}
