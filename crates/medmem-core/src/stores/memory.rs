//! Process-local stores.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::lexical::{default_query, rank_facts};
use crate::error::{MedMemError, MedMemResult};
use crate::traits::{FactSearch, FactStore, ProfileStore, UpsertStatus, VisitStore};
use crate::types::{BehavioralProfile, EpisodicVisit, ScoredFact, SemanticFact};

fn lock<T>(mutex: &Mutex<T>) -> MedMemResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| MedMemError::Internal("in-memory store mutex poisoned".to_string()))
}

/// In-memory visit log.
#[derive(Default)]
pub struct InMemoryVisitStore {
    visits: Mutex<Vec<(i64, EpisodicVisit)>>,
}

impl InMemoryVisitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VisitStore for InMemoryVisitStore {
    fn insert(&self, visit: &EpisodicVisit) -> MedMemResult<i64> {
        let mut visits = lock(&self.visits)?;
        let id = visits.len() as i64 + 1;
        visits.push((id, visit.clone()));
        Ok(id)
    }

    fn most_recent(&self, patient_id: &str, limit: usize) -> MedMemResult<Vec<EpisodicVisit>> {
        let visits = lock(&self.visits)?;
        let mut matching: Vec<&(i64, EpisodicVisit)> = visits
            .iter()
            .filter(|(_, v)| v.patient_id == patient_id)
            .collect();
        matching.sort_by(|(a_id, a), (b_id, b)| b.date.cmp(&a.date).then(b_id.cmp(a_id)));
        Ok(matching
            .into_iter()
            .take(limit)
            .map(|(_, v)| v.clone())
            .collect())
    }
}

/// In-memory profile table.
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: Mutex<HashMap<String, BehavioralProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored profiles.
    pub fn len(&self) -> usize {
        self.profiles.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Whether no profile is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn upsert(&self, profile: &BehavioralProfile) -> MedMemResult<UpsertStatus> {
        let mut profiles = lock(&self.profiles)?;
        Ok(
            match profiles.insert(profile.patient_id.clone(), profile.clone()) {
                Some(_) => UpsertStatus::Updated,
                None => UpsertStatus::Created,
            },
        )
    }

    fn get(&self, patient_id: &str) -> MedMemResult<Option<BehavioralProfile>> {
        Ok(lock(&self.profiles)?.get(patient_id).cloned())
    }
}

/// In-memory fact log.
#[derive(Default)]
pub struct InMemoryFactStore {
    facts: Mutex<Vec<SemanticFact>>,
}

impl InMemoryFactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FactStore for InMemoryFactStore {
    fn append(&self, fact: &SemanticFact) -> MedMemResult<()> {
        lock(&self.facts)?.push(fact.clone());
        Ok(())
    }

    fn all_for(&self, patient_id: &str) -> MedMemResult<Vec<SemanticFact>> {
        Ok(lock(&self.facts)?
            .iter()
            .filter(|f| f.patient_id == patient_id)
            .cloned()
            .collect())
    }
}

impl FactSearch for InMemoryFactStore {
    fn search(&self, patient_id: &str, query: &str, k: usize) -> MedMemResult<Vec<ScoredFact>> {
        let query = if query.trim().is_empty() {
            default_query(patient_id)
        } else {
            query.to_string()
        };
        Ok(rank_facts(self.all_for(patient_id)?, &query, k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_profile_upsert_keeps_one_row() {
        let store = InMemoryProfileStore::new();
        assert_eq!(
            store.upsert(&BehavioralProfile::with_notes("P1", "a")).unwrap(),
            UpsertStatus::Created
        );
        assert_eq!(
            store.upsert(&BehavioralProfile::with_notes("P1", "b")).unwrap(),
            UpsertStatus::Updated
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("P1").unwrap().unwrap().habit_notes, "b");
    }

    #[test]
    fn test_visit_ordering_matches_sqlite_contract() {
        let store = InMemoryVisitStore::new();
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        store.insert(&EpisodicVisit::new("P1", d2, "first", "x")).unwrap();
        store.insert(&EpisodicVisit::new("P1", d1, "older", "x")).unwrap();
        store.insert(&EpisodicVisit::new("P1", d2, "second", "x")).unwrap();

        let visits = store.most_recent("P1", 10).unwrap();
        let symptoms: Vec<_> = visits.iter().map(|v| v.symptoms.as_str()).collect();
        assert_eq!(symptoms, vec!["second", "first", "older"]);
    }
}
