//! Patient identity resolution from free text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum length, in characters, of an accepted name.
const MIN_NAME_LEN: usize = 3;

/// Words that open a conversation but are never names.
const GREETING_STOPLIST: &[&str] = &["hello", "hi", "hey", "good", "there"];

// Ordered: explicit introductions first, then a bare leading name.
static NAME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)(?:my name is|i'm|i’m|i am|call me)\s+([A-Za-z\s]+?)(?:\s*$|,|\.|!)")
            .unwrap(),
        Regex::new(r"(?i)^([A-Za-z\s]+?)(?:\s+here|$|,|\.|!)").unwrap(),
    ]
});

/// Why an utterance did not yield a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameRejection {
    /// No pattern matched the utterance.
    NoMatch,
    /// A candidate matched but is shorter than three characters.
    TooShort { candidate: String },
    /// A candidate matched but is a greeting word.
    Greeting { candidate: String },
}

/// Result of a resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityMatch {
    Resolved(String),
    Rejected(NameRejection),
}

impl IdentityMatch {
    /// The resolved name, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            IdentityMatch::Resolved(name) => Some(name),
            IdentityMatch::Rejected(_) => None,
        }
    }
}

/// Extracts a patient name from an utterance using ordered text patterns.
///
/// Stateless: the "resolve once per session" rule is enforced by the session,
/// which stops calling the resolver after the first success.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver;

impl IdentityResolver {
    pub fn new() -> Self {
        Self
    }

    /// Try each pattern in order and return the first acceptable name.
    ///
    /// When every candidate is rejected, the first rejection is reported.
    pub fn resolve(&self, utterance: &str) -> IdentityMatch {
        let text = utterance.trim();
        let mut first_rejection: Option<NameRejection> = None;

        for pattern in NAME_PATTERNS.iter() {
            let Some(candidate) = pattern.captures(text).and_then(|c| c.get(1)) else {
                continue;
            };
            let name = normalize_name(candidate.as_str());
            match check_candidate(name) {
                Ok(name) => return IdentityMatch::Resolved(name),
                Err(rejection) => {
                    first_rejection.get_or_insert(rejection);
                }
            }
        }

        IdentityMatch::Rejected(first_rejection.unwrap_or(NameRejection::NoMatch))
    }
}

/// A stoplisted greeting is reported as such even when it is also too short.
fn check_candidate(name: String) -> Result<String, NameRejection> {
    if GREETING_STOPLIST.contains(&name.to_lowercase().as_str()) {
        return Err(NameRejection::Greeting { candidate: name });
    }
    if name.chars().count() < MIN_NAME_LEN {
        return Err(NameRejection::TooShort { candidate: name });
    }
    Ok(name)
}

/// Collapse inner whitespace and title-case each word.
fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
