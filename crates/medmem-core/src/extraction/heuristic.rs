//! Keyword fallback used when the completion service is unavailable.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::ExtractedInfo;

const ALLERGY_TRIGGERS: &[&str] = &["allergy", "allergic", "can't eat", "can’t eat", "react to"];
const ALLERGENS: &[&str] = &["dust", "pollen", "shellfish", "nuts", "penicillin", "latex"];
const CONDITION_TRIGGERS: &[&str] = &["diabetes", "asthma", "hypertension", "arthritis"];

// Matches inside longer words too, like the trigger check.
static CONDITIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"diabetes|hypertension|asthma|arthritis|depression|anxiety").unwrap()
});
static PAIN_SCALE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(?:out of|/)\s*10\b").unwrap());

/// Classify an utterance with a small fixed vocabulary.
///
/// Allergens are only collected when an allergy trigger word is present, and
/// the wider condition list only when one of the core conditions appears.
pub fn extract_heuristic(utterance: &str) -> ExtractedInfo {
    let text = utterance.to_lowercase();
    let mut info = ExtractedInfo::default();

    if ALLERGY_TRIGGERS.iter().any(|t| text.contains(*t)) {
        info.allergies = ALLERGENS
            .iter()
            .filter(|a| text.contains(**a))
            .map(|a| a.to_string())
            .collect();
    }

    if CONDITION_TRIGGERS.iter().any(|c| text.contains(*c)) {
        info.medical_conditions = CONDITIONS
            .find_iter(&text)
            .map(|m| m.as_str().to_string())
            .collect();
    }

    if let Some(caps) = PAIN_SCALE.captures(&text) {
        info.pain_level = Some(format!("{}/10", &caps[1]));
    }

    info
}
