//! Lexical relevance ranking for fact search.

use std::collections::HashSet;

use ordered_float::OrderedFloat;

use crate::types::{ScoredFact, SemanticFact};

const STOPWORDS: &[&str] = &[
    "a", "about", "an", "and", "any", "are", "for", "has", "have", "i", "in", "is", "my", "of",
    "on", "or", "patient", "the", "to", "what", "with",
];

/// Query used when the caller supplies none.
pub(crate) fn default_query(patient_id: &str) -> String {
    format!("health information about patient {}", patient_id)
}

fn normalize_term(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        if stem.len() > 2 {
            return format!("{}y", stem);
        }
    }
    if let Some(stem) = word.strip_suffix('s') {
        if stem.len() > 2 && !stem.ends_with('s') {
            return stem.to_string();
        }
    }
    word.to_string()
}

fn terms(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && !STOPWORDS.contains(w))
        .map(normalize_term)
        .collect()
}

/// Rank facts by the share of query terms found in the fact's type and value.
///
/// Always returns up to `k` facts; ties (including zero scores) are broken
/// newest first, so an unmatched query degrades to "most recent facts".
pub fn rank_facts(facts: Vec<SemanticFact>, query: &str, k: usize) -> Vec<ScoredFact> {
    let query_terms = terms(query);

    let mut scored: Vec<ScoredFact> = facts
        .into_iter()
        .map(|fact| {
            let score = if query_terms.is_empty() {
                0.0
            } else {
                let fact_terms = terms(&format!("{} {}", fact.fact_type, fact.fact_value));
                let hits = query_terms.intersection(&fact_terms).count();
                hits as f32 / query_terms.len() as f32
            };
            ScoredFact { fact, score }
        })
        .collect();

    scored.sort_by(|a, b| {
        OrderedFloat(b.score)
            .cmp(&OrderedFloat(a.score))
            .then_with(|| b.fact.created_at.cmp(&a.fact.created_at))
    });
    scored.truncate(k);
    scored
}
