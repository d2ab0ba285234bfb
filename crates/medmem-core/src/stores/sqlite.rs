//! SQLite-backed stores, one database file per memory kind.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use super::lexical::{default_query, rank_facts};
use crate::error::{ErrorCode, MedMemError, MedMemResult, StoreKind};
use crate::traits::{FactSearch, FactStore, ProfileStore, UpsertStatus, VisitStore};
use crate::types::{
    BehavioralProfile, EpisodicVisit, FactType, ScoredFact, SemanticFact, TeleconsultPreference,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn open_connection(path: &Path) -> MedMemResult<Connection> {
    if path.to_str() == Some(":memory:") {
        return Ok(Connection::open_in_memory()?);
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(Connection::open(path)?)
}

fn lock(conn: &Mutex<Connection>) -> MedMemResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| MedMemError::Internal("SQLite connection mutex poisoned".to_string()))
}

/// SQLite visit log.
pub struct SqliteVisitStore {
    conn: Mutex<Connection>,
}

impl SqliteVisitStore {
    /// Open (or create) the visit database at `path`. `":memory:"` opens a
    /// private in-memory database.
    pub fn new(path: impl AsRef<Path>) -> MedMemResult<Self> {
        let store = Self {
            conn: Mutex::new(open_connection(path.as_ref())?),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> MedMemResult<Self> {
        Self::new(":memory:")
    }

    fn init_schema(&self) -> MedMemResult<()> {
        let conn = lock(&self.conn)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS visits (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                patient_id TEXT NOT NULL,
                date TEXT NOT NULL,
                symptoms TEXT NOT NULL,
                diagnosis TEXT NOT NULL,
                prescription TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_visits_patient_date ON visits(patient_id, date);
        "#,
        )?;
        Ok(())
    }

    fn insert_row(&self, visit: &EpisodicVisit) -> MedMemResult<i64> {
        let conn = lock(&self.conn)?;
        conn.execute(
            r#"
            INSERT INTO visits (patient_id, date, symptoms, diagnosis, prescription)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                visit.patient_id,
                visit.date.format(DATE_FORMAT).to_string(),
                visit.symptoms,
                visit.diagnosis,
                visit.prescription,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn select_recent(&self, patient_id: &str, limit: usize) -> MedMemResult<Vec<EpisodicVisit>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            r#"
            SELECT date, symptoms, diagnosis, prescription
            FROM visits
            WHERE patient_id = ?1
            ORDER BY date DESC, id DESC
            LIMIT ?2
            "#,
        )?;

        let rows = stmt
            .query_map(params![patient_id, limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(date, symptoms, diagnosis, prescription)| {
                let date = NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|e| {
                    MedMemError::parse(format!("invalid visit date '{}': {}", date, e))
                })?;
                Ok(EpisodicVisit {
                    patient_id: patient_id.to_string(),
                    date,
                    symptoms,
                    diagnosis,
                    prescription,
                })
            })
            .collect()
    }
}

impl VisitStore for SqliteVisitStore {
    fn insert(&self, visit: &EpisodicVisit) -> MedMemResult<i64> {
        self.insert_row(visit)
            .map_err(|e| e.for_store(StoreKind::Visit, ErrorCode::StoreWriteFailed))
    }

    fn most_recent(&self, patient_id: &str, limit: usize) -> MedMemResult<Vec<EpisodicVisit>> {
        self.select_recent(patient_id, limit)
            .map_err(|e| e.for_store(StoreKind::Visit, ErrorCode::StoreReadFailed))
    }
}

/// SQLite behavioral profile table, keyed by patient id.
pub struct SqliteProfileStore {
    conn: Mutex<Connection>,
}

impl SqliteProfileStore {
    /// Open (or create) the profile database at `path`.
    pub fn new(path: impl AsRef<Path>) -> MedMemResult<Self> {
        let store = Self {
            conn: Mutex::new(open_connection(path.as_ref())?),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> MedMemResult<Self> {
        Self::new(":memory:")
    }

    fn init_schema(&self) -> MedMemResult<()> {
        let conn = lock(&self.conn)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS behavior (
                patient_id TEXT PRIMARY KEY,
                missed_appointments INTEGER NOT NULL DEFAULT 0,
                prefers_teleconsult TEXT NOT NULL DEFAULT 'unknown',
                habit_notes TEXT NOT NULL DEFAULT ''
            );
        "#,
        )?;
        Ok(())
    }

    fn upsert_row(&self, profile: &BehavioralProfile) -> MedMemResult<UpsertStatus> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;

        let exists = tx
            .query_row(
                "SELECT 1 FROM behavior WHERE patient_id = ?1",
                [&profile.patient_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        tx.execute(
            r#"
            INSERT INTO behavior (patient_id, missed_appointments, prefers_teleconsult, habit_notes)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(patient_id) DO UPDATE SET
                missed_appointments = excluded.missed_appointments,
                prefers_teleconsult = excluded.prefers_teleconsult,
                habit_notes = excluded.habit_notes
            "#,
            params![
                profile.patient_id,
                profile.missed_appointments,
                profile.prefers_teleconsult.as_ref(),
                profile.habit_notes,
            ],
        )?;
        tx.commit()?;

        Ok(if exists {
            UpsertStatus::Updated
        } else {
            UpsertStatus::Created
        })
    }

    fn select_profile(&self, patient_id: &str) -> MedMemResult<Option<BehavioralProfile>> {
        let conn = lock(&self.conn)?;
        let row = conn
            .query_row(
                r#"
                SELECT missed_appointments, prefers_teleconsult, habit_notes
                FROM behavior
                WHERE patient_id = ?1
                "#,
                [patient_id],
                |row| {
                    Ok((
                        row.get::<_, u32>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.map(|(missed_appointments, prefers, habit_notes)| BehavioralProfile {
            patient_id: patient_id.to_string(),
            missed_appointments,
            // Rows written by other tools may carry free text here.
            prefers_teleconsult: TeleconsultPreference::from_str(&prefers).unwrap_or_default(),
            habit_notes,
        }))
    }
}

impl ProfileStore for SqliteProfileStore {
    fn upsert(&self, profile: &BehavioralProfile) -> MedMemResult<UpsertStatus> {
        self.upsert_row(profile)
            .map_err(|e| e.for_store(StoreKind::Profile, ErrorCode::StoreWriteFailed))
    }

    fn get(&self, patient_id: &str) -> MedMemResult<Option<BehavioralProfile>> {
        self.select_profile(patient_id)
            .map_err(|e| e.for_store(StoreKind::Profile, ErrorCode::StoreReadFailed))
    }
}

/// SQLite medical fact log.
pub struct SqliteFactStore {
    conn: Mutex<Connection>,
}

impl SqliteFactStore {
    /// Open (or create) the fact database at `path`.
    pub fn new(path: impl AsRef<Path>) -> MedMemResult<Self> {
        let store = Self {
            conn: Mutex::new(open_connection(path.as_ref())?),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> MedMemResult<Self> {
        Self::new(":memory:")
    }

    fn init_schema(&self) -> MedMemResult<()> {
        let conn = lock(&self.conn)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS medical_facts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                patient_id TEXT NOT NULL,
                fact_type TEXT NOT NULL,
                fact_value TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_facts_patient ON medical_facts(patient_id);
        "#,
        )?;
        Ok(())
    }

    fn insert_row(&self, fact: &SemanticFact) -> MedMemResult<()> {
        let conn = lock(&self.conn)?;
        conn.execute(
            r#"
            INSERT INTO medical_facts (patient_id, fact_type, fact_value, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                fact.patient_id,
                fact.fact_type.as_ref(),
                fact.fact_value,
                fact.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn select_all(&self, patient_id: &str) -> MedMemResult<Vec<SemanticFact>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            r#"
            SELECT fact_type, fact_value, created_at
            FROM medical_facts
            WHERE patient_id = ?1
            ORDER BY id ASC
            "#,
        )?;

        let rows = stmt
            .query_map([patient_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(fact_type, fact_value, created_at)| {
                Ok(SemanticFact {
                    patient_id: patient_id.to_string(),
                    fact_type: FactType::from_str(&fact_type).map_err(|_| {
                        MedMemError::parse(format!("unknown fact type '{}'", fact_type))
                    })?,
                    fact_value,
                    created_at: DateTime::parse_from_rfc3339(&created_at)
                        .map(|dt| dt.with_timezone(&Utc))
                        .map_err(|e| MedMemError::parse(e.to_string()))?,
                })
            })
            .collect()
    }
}

impl FactStore for SqliteFactStore {
    fn append(&self, fact: &SemanticFact) -> MedMemResult<()> {
        self.insert_row(fact)
            .map_err(|e| e.for_store(StoreKind::Fact, ErrorCode::StoreWriteFailed))
    }

    fn all_for(&self, patient_id: &str) -> MedMemResult<Vec<SemanticFact>> {
        self.select_all(patient_id)
            .map_err(|e| e.for_store(StoreKind::Fact, ErrorCode::StoreReadFailed))
    }
}

impl FactSearch for SqliteFactStore {
    fn search(&self, patient_id: &str, query: &str, k: usize) -> MedMemResult<Vec<ScoredFact>> {
        let facts = self.all_for(patient_id)?;
        let query = if query.trim().is_empty() {
            default_query(patient_id)
        } else {
            query.to_string()
        };
        Ok(rank_facts(facts, &query, k))
    }
}
