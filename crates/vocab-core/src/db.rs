//! SQLite-backed progress store.

use crate::error::{StoreError, StoreResult};
use crate::models::{CardState, LearnerSettings, MemoryCard, QuestionType, QuizResult};
use crate::store::ProgressStore;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult};
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init()?;
        debug!(path = %path.display(), "Progress database opened");
        Ok(store)
    }

    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> StoreResult<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS memory_cards (
                item_id TEXT PRIMARY KEY,
                stability REAL NOT NULL,
                difficulty REAL NOT NULL,
                elapsed_days INTEGER NOT NULL DEFAULT 0,
                scheduled_days INTEGER NOT NULL DEFAULT 0,
                repetitions INTEGER NOT NULL DEFAULT 0,
                lapses INTEGER NOT NULL DEFAULT 0,
                last_review TEXT,
                next_review TEXT,
                state TEXT NOT NULL,
                date_added TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS quiz_results (
                id TEXT PRIMARY KEY,
                item_id TEXT NOT NULL,
                quiz_type INTEGER NOT NULL,
                was_correct INTEGER NOT NULL,
                timestamp TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS learner_settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                words_per_batch INTEGER NOT NULL,
                batch_interval_days INTEGER NOT NULL,
                include_review_words INTEGER NOT NULL,
                batch_started_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_cards_next_review ON memory_cards(next_review);
            CREATE INDEX IF NOT EXISTS idx_results_timestamp ON quiz_results(timestamp);
            "#,
        )?;
        Ok(())
    }
}

impl ProgressStore for SqliteStore {
    fn fetch_cards(&self) -> StoreResult<Vec<MemoryCard>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM memory_cards ORDER BY date_added, item_id")?;
        let cards = stmt
            .query_map([], parse_card_row)?
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(cards)
    }

    fn fetch_card(&self, item_id: &str) -> StoreResult<Option<MemoryCard>> {
        let mut stmt = self.conn.prepare("SELECT * FROM memory_cards WHERE item_id = ?1")?;
        Ok(stmt.query_row(params![item_id], parse_card_row).optional()?)
    }

    fn upsert_card(&mut self, card: &MemoryCard) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO memory_cards (item_id, stability, difficulty, elapsed_days, scheduled_days,
                repetitions, lapses, last_review, next_review, state, date_added)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(item_id) DO UPDATE SET
                stability = excluded.stability, difficulty = excluded.difficulty,
                elapsed_days = excluded.elapsed_days, scheduled_days = excluded.scheduled_days,
                repetitions = excluded.repetitions, lapses = excluded.lapses,
                last_review = excluded.last_review, next_review = excluded.next_review,
                state = excluded.state",
            params![
                card.item_id,
                card.stability,
                card.difficulty,
                card.elapsed_days,
                card.scheduled_days,
                card.repetitions,
                card.lapses,
                card.last_review.map(|d| d.to_rfc3339()),
                card.next_review.map(|d| d.to_rfc3339()),
                card.state.as_str(),
                card.date_added.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn delete_card(&mut self, item_id: &str) -> StoreResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM memory_cards WHERE item_id = ?1", params![item_id])?;
        Ok(removed > 0)
    }

    fn fetch_results(&self) -> StoreResult<Vec<QuizResult>> {
        let mut stmt = self.conn.prepare("SELECT * FROM quiz_results ORDER BY timestamp")?;
        let results = stmt
            .query_map([], parse_result_row)?
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(results)
    }

    fn insert_result(&mut self, result: &QuizResult) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO quiz_results (id, item_id, quiz_type, was_correct, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                result.id.to_string(),
                result.item_id,
                result.quiz_type.code(),
                result.was_correct,
                result.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn settings(&mut self, now: DateTime<Utc>) -> StoreResult<LearnerSettings> {
        let existing = self
            .conn
            .query_row("SELECT * FROM learner_settings WHERE id = 1", [], parse_settings_row)
            .optional()?;
        match existing {
            Some(settings) => Ok(settings),
            None => {
                let settings = LearnerSettings::new(now);
                self.save_settings(&settings)?;
                Ok(settings)
            }
        }
    }

    fn save_settings(&mut self, settings: &LearnerSettings) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO learner_settings (id, words_per_batch, batch_interval_days,
                include_review_words, batch_started_at)
             VALUES (1, ?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                words_per_batch = excluded.words_per_batch,
                batch_interval_days = excluded.batch_interval_days,
                include_review_words = excluded.include_review_words,
                batch_started_at = excluded.batch_started_at",
            params![
                settings.words_per_batch,
                settings.batch_interval_days,
                settings.include_review_words,
                settings.batch_started_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

fn conversion_error(column: &str, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        Type::Text,
        Box::new(StoreError::InvalidValue(format!("{}: {}", column, message))),
    )
}

fn parse_time(column: &str, value: &str) -> SqlResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e.to_string()))
}

fn parse_optional_time(row: &rusqlite::Row, column: &str) -> SqlResult<Option<DateTime<Utc>>> {
    row.get::<_, Option<String>>(column)?
        .map(|s| parse_time(column, &s))
        .transpose()
}

/// Stored counters may be negative or oversized; clamp into range.
fn get_count(row: &rusqlite::Row, column: &str) -> SqlResult<u32> {
    let value: i64 = row.get(column)?;
    Ok(u32::try_from(value.max(0)).unwrap_or(u32::MAX))
}

fn parse_card_row(row: &rusqlite::Row) -> SqlResult<MemoryCard> {
    let state: String = row.get("state")?;
    let date_added: String = row.get("date_added")?;

    Ok(MemoryCard {
        item_id: row.get("item_id")?,
        stability: row.get("stability")?,
        difficulty: row.get("difficulty")?,
        elapsed_days: get_count(row, "elapsed_days")?,
        scheduled_days: get_count(row, "scheduled_days")?,
        repetitions: get_count(row, "repetitions")?,
        lapses: get_count(row, "lapses")?,
        last_review: parse_optional_time(row, "last_review")?,
        next_review: parse_optional_time(row, "next_review")?,
        state: CardState::from_tag(&state),
        date_added: parse_time("date_added", &date_added)?,
    })
}

fn parse_result_row(row: &rusqlite::Row) -> SqlResult<QuizResult> {
    let id: String = row.get("id")?;
    let code: i64 = row.get("quiz_type")?;
    let timestamp: String = row.get("timestamp")?;

    Ok(QuizResult {
        id: Uuid::parse_str(&id).map_err(|e| conversion_error("id", e.to_string()))?,
        item_id: row.get("item_id")?,
        quiz_type: QuestionType::from_code(code)
            .ok_or_else(|| conversion_error("quiz_type", format!("unknown code {}", code)))?,
        was_correct: row.get("was_correct")?,
        timestamp: parse_time("timestamp", &timestamp)?,
    })
}

fn parse_settings_row(row: &rusqlite::Row) -> SqlResult<LearnerSettings> {
    let started: String = row.get("batch_started_at")?;
    Ok(LearnerSettings {
        words_per_batch: get_count(row, "words_per_batch")?,
        batch_interval_days: get_count(row, "batch_interval_days")?,
        include_review_words: row.get("include_review_words")?,
        batch_started_at: parse_time("batch_started_at", &started)?,
    })
}
