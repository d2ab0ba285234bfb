//! Store backends.
//!
//! - [`sqlite`]: one SQLite database per memory kind, the persistent default.
//! - [`memory`]: process-local stores for tests and throwaway sessions.

mod lexical;
pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use crate::config::MedMemConfig;
use crate::error::MedMemResult;
use crate::traits::{FactSearch, ProfileStore, VisitStore};

pub use lexical::rank_facts;
pub use memory::{InMemoryFactStore, InMemoryProfileStore, InMemoryVisitStore};
pub use sqlite::{SqliteFactStore, SqliteProfileStore, SqliteVisitStore};

/// Handles to the three long-term stores a session writes to and reads from.
///
/// The fact store is searchable so presentation layers can query it directly.
#[derive(Clone)]
pub struct MemoryStores {
    pub visits: Arc<dyn VisitStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub facts: Arc<dyn FactSearch>,
}

impl MemoryStores {
    /// Bundle explicit store handles.
    pub fn new(
        visits: Arc<dyn VisitStore>,
        profiles: Arc<dyn ProfileStore>,
        facts: Arc<dyn FactSearch>,
    ) -> Self {
        Self {
            visits,
            profiles,
            facts,
        }
    }

    /// Fresh, empty in-memory stores.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryVisitStore::new()),
            Arc::new(InMemoryProfileStore::new()),
            Arc::new(InMemoryFactStore::new()),
        )
    }

    /// Open the SQLite stores at the paths named in the configuration.
    pub fn sqlite(config: &MedMemConfig) -> MedMemResult<Self> {
        Ok(Self::new(
            Arc::new(SqliteVisitStore::new(&config.visits_db_path)?),
            Arc::new(SqliteProfileStore::new(&config.profiles_db_path)?),
            Arc::new(SqliteFactStore::new(&config.facts_db_path)?),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FactType, SemanticFact};

    #[test]
    fn test_sqlite_stores_open_under_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = MedMemConfig::with_data_dir(dir.path().join("medmem"));

        let stores = MemoryStores::sqlite(&config).unwrap();
        stores
            .facts
            .append(&SemanticFact::new("Jane Doe", FactType::Condition, "asthma"))
            .unwrap();

        assert!(config.visits_db_path.exists());
        assert!(config.profiles_db_path.exists());
        assert!(config.facts_db_path.exists());

        let hits = stores.facts.search("Jane Doe", "asthma", 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].fact.fact_value, "asthma");
    }
}
