//! Parser for the six-label classification reply.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{MedMemError, MedMemResult};
use crate::types::ExtractedInfo;

static THINK_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").unwrap());
static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^```[a-zA-Z0-9]*\s*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    MedicalConditions,
    Allergies,
    Medications,
    CurrentSymptoms,
    PainLevel,
    Preferences,
}

impl Label {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().trim_matches('*').trim().to_uppercase().as_str() {
            "MEDICAL CONDITIONS" => Some(Self::MedicalConditions),
            "ALLERGIES" => Some(Self::Allergies),
            "MEDICATIONS" => Some(Self::Medications),
            "CURRENT SYMPTOMS" => Some(Self::CurrentSymptoms),
            "PAIN LEVEL" => Some(Self::PainLevel),
            "PREFERENCES" => Some(Self::Preferences),
            _ => None,
        }
    }
}

/// Strip reasoning tags and code fences some models wrap replies in.
fn clean_reply(reply: &str) -> String {
    let without_think = THINK_TAGS.replace_all(reply, "");
    CODE_FENCE.replace_all(&without_think, "").trim().to_string()
}

/// Normalise a field value; `None` when the field is empty or `none`.
fn field_value(raw: &str) -> Option<&str> {
    let value = raw
        .trim()
        .trim_matches('*')
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim()
        .trim_matches('"')
        .trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(value)
    }
}

fn split_items(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty() && !item.eq_ignore_ascii_case("none"))
        .map(str::to_string)
}

/// Parse a classification reply into typed buckets.
///
/// Lines are matched by exact label; unknown labels are skipped. A reply
/// without a single recognised label line is treated as unparseable.
pub fn parse_classification(reply: &str) -> MedMemResult<ExtractedInfo> {
    let cleaned = clean_reply(reply);
    let mut info = ExtractedInfo::default();
    let mut recognised = 0usize;

    for line in cleaned.lines() {
        let line = line
            .trim()
            .trim_start_matches(|c: char| matches!(c, '-' | '*' | '#' | '>' | ' '));
        let Some((raw_label, raw_value)) = line.split_once(':') else {
            continue;
        };
        let Some(label) = Label::parse(raw_label) else {
            continue;
        };
        recognised += 1;

        let Some(value) = field_value(raw_value) else {
            continue;
        };
        match label {
            Label::MedicalConditions => info.medical_conditions.extend(split_items(value)),
            Label::Allergies => info.allergies.extend(split_items(value)),
            Label::Medications => info.medications.extend(split_items(value)),
            Label::CurrentSymptoms => info.current_symptoms.extend(split_items(value)),
            Label::PainLevel => info.pain_level = Some(value.to_string()),
            Label::Preferences => info.preferences.extend(split_items(value)),
        }
    }

    if recognised == 0 {
        return Err(MedMemError::unparseable(
            "classification reply contained no recognised labels",
        ));
    }
    Ok(info)
}
