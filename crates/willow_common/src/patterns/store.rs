//! Pattern store implementation.
//!
//! SQLite-backed persistence for message patterns and the question bank.
//! Location: /var/lib/willow/patterns.db (system) or
//! ~/.local/share/willow/patterns.db (user).
//!
//! Counters are last-write-wins under concurrent sessions; no strict
//! consistency is required for usage counts.

use super::schema::{normalize_text, MessagePattern, SCHEMA_VERSION};
use crate::categories::ConcernCategory;
use crate::types::{BankQuestion, SkillTier};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;

/// Errors at the pattern-store boundary
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Message pattern store backed by SQLite
pub struct PatternStore {
    conn: Arc<Mutex<Connection>>,
}

impl PatternStore {
    /// Open or create the store at the default location
    pub fn open_default() -> StoreResult<Self> {
        Self::open(&Self::default_path())
    }

    /// Open or create the store at a specific path
    pub fn open(path: &PathBuf) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store for tests and ephemeral sessions
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Get the default database path
    pub fn default_path() -> PathBuf {
        let system_path = PathBuf::from("/var/lib/willow/patterns.db");
        if system_path.parent().map(|p| p.exists()).unwrap_or(false) {
            return system_path;
        }
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("willow")
            .join("patterns.db")
    }

    /// Initialize the database schema
    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS message_patterns (
                id TEXT PRIMARY KEY,
                normalized_text TEXT NOT NULL UNIQUE,
                intent TEXT NOT NULL,
                response_type TEXT NOT NULL,
                confidence REAL NOT NULL,
                times_used INTEGER NOT NULL DEFAULT 1,
                was_correct INTEGER,
                created_at TEXT NOT NULL,
                last_used_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS bank_questions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL,
                category TEXT NOT NULL,
                tier TEXT NOT NULL,
                min_age INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS schema_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "INSERT OR REPLACE INTO schema_meta (key, value) VALUES ('version', ?)",
            params![SCHEMA_VERSION.to_string()],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_patterns_text ON message_patterns(normalized_text)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_patterns_usage ON message_patterns(times_used)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_bank_category ON bank_questions(category, min_age)",
            [],
        )?;

        Ok(())
    }

    /// Exact lookup by normalized text
    pub fn find_exact(&self, normalized: &str) -> StoreResult<Option<MessagePattern>> {
        let conn = self.conn.lock().unwrap();
        let result = conn
            .query_row(
                &format!("SELECT {} FROM message_patterns WHERE normalized_text = ?", COLUMNS),
                params![normalized],
                row_to_pattern,
            )
            .optional()?;
        Ok(result)
    }

    /// Bounded candidate retrieval for fuzzy matching.
    ///
    /// Any stored pattern sharing at least one token with the input is a
    /// candidate; most-used patterns come back first. The caller applies the
    /// real similarity scoring.
    pub fn find_candidates(&self, normalized: &str, limit: usize) -> StoreResult<Vec<MessagePattern>> {
        let tokens: Vec<&str> = normalized
            .split_whitespace()
            .filter(|t| t.len() >= 3)
            .take(8)
            .collect();
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let clauses: Vec<&str> = tokens.iter().map(|_| "normalized_text LIKE ?").collect();
        let sql = format!(
            "SELECT {} FROM message_patterns WHERE {} ORDER BY times_used DESC LIMIT {}",
            COLUMNS,
            clauses.join(" OR "),
            limit
        );

        let like_params: Vec<String> = tokens.iter().map(|t| format!("%{}%", t)).collect();
        let param_refs: Vec<&dyn rusqlite::ToSql> =
            like_params.iter().map(|p| p as &dyn rusqlite::ToSql).collect();

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), row_to_pattern)?;
        let mut candidates = Vec::new();
        for row in rows {
            candidates.push(row?);
        }
        debug!(
            "Pattern candidates: {} for {} tokens",
            candidates.len(),
            tokens.len()
        );
        Ok(candidates)
    }

    /// Insert a newly resolved pattern, or refresh the existing one.
    ///
    /// Normalized text is the uniqueness key; re-inserting an existing text
    /// bumps its usage and updates confidence to the latest resolution.
    pub fn insert(&self, pattern: &MessagePattern) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        let existing: Option<String> = conn
            .query_row(
                "SELECT id FROM message_patterns WHERE normalized_text = ?",
                params![&pattern.normalized_text],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            conn.execute(
                r#"
                UPDATE message_patterns SET
                    intent = ?,
                    response_type = ?,
                    confidence = ?,
                    times_used = times_used + 1,
                    last_used_at = ?
                WHERE id = ?
                "#,
                params![
                    &pattern.intent,
                    &pattern.response_type,
                    pattern.confidence,
                    Utc::now().to_rfc3339(),
                    &id
                ],
            )?;
        } else {
            conn.execute(
                r#"
                INSERT INTO message_patterns
                    (id, normalized_text, intent, response_type, confidence,
                     times_used, was_correct, created_at, last_used_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
                params![
                    &pattern.id,
                    &pattern.normalized_text,
                    &pattern.intent,
                    &pattern.response_type,
                    pattern.confidence,
                    pattern.times_used,
                    pattern.was_correct,
                    pattern.created_at.to_rfc3339(),
                    pattern.last_used_at.to_rfc3339()
                ],
            )?;
        }
        Ok(())
    }

    /// Bump the usage counter after a match
    pub fn record_usage(&self, id: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE message_patterns SET times_used = times_used + 1, last_used_at = ? WHERE id = ?",
            params![Utc::now().to_rfc3339(), id],
        )?;
        Ok(())
    }

    /// Record explicit feedback on a stored resolution.
    ///
    /// Confirmations nudge the stored confidence up; corrections pull it down
    /// hard enough that the fuzzy tier stops preferring the pattern.
    pub fn record_feedback(&self, id: &str, correct: bool) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let delta_sql = if correct {
            "UPDATE message_patterns SET was_correct = 1, confidence = MIN(1.0, confidence + 0.05) WHERE id = ?"
        } else {
            "UPDATE message_patterns SET was_correct = 0, confidence = MAX(0.0, confidence - 0.2) WHERE id = ?"
        };
        conn.execute(delta_sql, params![id])?;
        Ok(())
    }

    /// Number of stored patterns
    pub fn pattern_count(&self) -> StoreResult<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM message_patterns", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Fetch bank questions for a category, age-gated, in insertion order
    pub fn fetch_bank(&self, category: ConcernCategory, age: u8) -> StoreResult<Vec<BankQuestion>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT text, category, tier, min_age FROM bank_questions
             WHERE category = ? AND min_age <= ? ORDER BY id",
        )?;
        let rows = stmt.query_map(params![category.as_str(), age], |row| {
            Ok(BankQuestion {
                text: row.get(0)?,
                category: ConcernCategory::from_label(&row.get::<_, String>(1)?),
                tier: parse_tier(&row.get::<_, String>(2)?),
                min_age: row.get(3)?,
            })
        })?;
        let mut questions = Vec::new();
        for row in rows {
            questions.push(row?);
        }
        Ok(questions)
    }

    /// Seed the bank, used by tests and first-run provisioning
    pub fn seed_bank(&self, questions: &[BankQuestion]) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        for q in questions {
            conn.execute(
                "INSERT INTO bank_questions (text, category, tier, min_age) VALUES (?, ?, ?, ?)",
                params![&q.text, q.category.as_str(), q.tier.to_string(), q.min_age],
            )?;
        }
        Ok(())
    }

    /// Resolve a raw message end-to-end against the exact index.
    ///
    /// Convenience for callers that have not normalized yet.
    pub fn find_exact_raw(&self, message: &str) -> StoreResult<Option<MessagePattern>> {
        self.find_exact(&normalize_text(message))
    }
}

const COLUMNS: &str = "id, normalized_text, intent, response_type, confidence, times_used, was_correct, created_at, last_used_at";

fn row_to_pattern(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessagePattern> {
    Ok(MessagePattern {
        id: row.get(0)?,
        normalized_text: row.get(1)?,
        intent: row.get(2)?,
        response_type: row.get(3)?,
        confidence: row.get(4)?,
        times_used: row.get(5)?,
        was_correct: row.get(6)?,
        created_at: parse_timestamp(&row.get::<_, String>(7)?),
        last_used_at: parse_timestamp(&row.get::<_, String>(8)?),
    })
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_tier(s: &str) -> SkillTier {
    match s {
        "foundation" => SkillTier::Foundation,
        "emerging" => SkillTier::Emerging,
        _ => SkillTier::Current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PatternStore {
        PatternStore::in_memory().unwrap()
    }

    #[test]
    fn test_insert_and_find_exact() {
        let s = store();
        let p = MessagePattern::new("my son won't talk", "report_concern", "assessment", 0.9);
        s.insert(&p).unwrap();

        let found = s.find_exact("my son won't talk").unwrap().unwrap();
        assert_eq!(found.intent, "report_concern");
        assert_eq!(found.times_used, 1);

        assert!(s.find_exact("completely different").unwrap().is_none());
    }

    #[test]
    fn test_reinsert_bumps_usage() {
        let s = store();
        let p = MessagePattern::new("hello", "greeting", "greeting", 0.7);
        s.insert(&p).unwrap();
        s.insert(&p).unwrap();

        let found = s.find_exact("hello").unwrap().unwrap();
        assert_eq!(found.times_used, 2);
        assert_eq!(s.pattern_count().unwrap(), 1);
    }

    #[test]
    fn test_record_usage() {
        let s = store();
        let p = MessagePattern::new("hi there", "greeting", "greeting", 0.7);
        s.insert(&p).unwrap();
        s.record_usage(&p.id).unwrap();

        let found = s.find_exact("hi there").unwrap().unwrap();
        assert_eq!(found.times_used, 2);
    }

    #[test]
    fn test_feedback_adjusts_confidence() {
        let s = store();
        let p = MessagePattern::new("he keeps hitting", "report_concern", "assessment", 0.7);
        s.insert(&p).unwrap();

        s.record_feedback(&p.id, false).unwrap();
        let found = s.find_exact("he keeps hitting").unwrap().unwrap();
        assert_eq!(found.was_correct, Some(false));
        assert!(found.confidence < 0.7);

        s.record_feedback(&p.id, true).unwrap();
        let found = s.find_exact("he keeps hitting").unwrap().unwrap();
        assert_eq!(found.was_correct, Some(true));
    }

    #[test]
    fn test_candidates_by_token_overlap() {
        let s = store();
        s.insert(&MessagePattern::new(
            "my son won't talk",
            "report_concern",
            "assessment",
            0.9,
        ))
        .unwrap();
        s.insert(&MessagePattern::new("how much does it cost", "service_question", "pricing", 0.8))
            .unwrap();

        let candidates = s.find_candidates("my daughter won't talk yet", 10).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].intent, "report_concern");
    }

    #[test]
    fn test_candidates_ordered_by_usage() {
        let s = store();
        let p1 = MessagePattern::new("child will not talk", "report_concern", "assessment", 0.9);
        let p2 = MessagePattern::new("toddler talk delay", "report_concern", "assessment", 0.9);
        s.insert(&p1).unwrap();
        s.insert(&p2).unwrap();
        s.record_usage(&p2.id).unwrap();
        s.record_usage(&p2.id).unwrap();

        let candidates = s.find_candidates("talk problems", 10).unwrap();
        assert_eq!(candidates[0].normalized_text, "toddler talk delay");
    }

    #[test]
    fn test_bank_age_gate() {
        let s = store();
        s.seed_bank(&[
            BankQuestion {
                text: "Does your child point at things?".to_string(),
                category: ConcernCategory::Communication,
                tier: SkillTier::Foundation,
                min_age: 1,
            },
            BankQuestion {
                text: "Can your child retell a short story?".to_string(),
                category: ConcernCategory::Communication,
                tier: SkillTier::Emerging,
                min_age: 5,
            },
        ])
        .unwrap();

        let bank = s.fetch_bank(ConcernCategory::Communication, 3).unwrap();
        assert_eq!(bank.len(), 1);
        assert_eq!(bank[0].tier, SkillTier::Foundation);

        let bank = s.fetch_bank(ConcernCategory::Communication, 6).unwrap();
        assert_eq!(bank.len(), 2);
    }

    #[test]
    fn test_on_disk_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.db");
        {
            let s = PatternStore::open(&path).unwrap();
            s.insert(&MessagePattern::new("persisted text", "greeting", "greeting", 0.7))
                .unwrap();
        }
        let s = PatternStore::open(&path).unwrap();
        assert!(s.find_exact("persisted text").unwrap().is_some());
    }
}
