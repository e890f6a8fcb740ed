//! SQLite-based study record and progress storage.
//!
//! Provides persistent storage for:
//! - Minutes studied per calendar day
//! - Learning progress (current card, completed cards)
//! - Key-value store for application state

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::{data_dir, migrations, StudyLog};
use crate::error::{DatabaseError, Result};

const CURRENT_CARD_KEY: &str = "current_card";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStudyRecord {
    pub date: NaiveDate,
    pub minutes: u64,
}

/// Learning progress at a glance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub completed_cards: u64,
    pub total_cards: u64,
    pub percentage: u64,
    pub current_card: u64,
    pub today_minutes: u64,
    pub total_study_days: u64,
    pub daily_limit_reached: bool,
}

/// SQLite database for the daily study record and progress.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/studytime/studytime.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("studytime.db"))
    }

    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    // ── Daily study record ───────────────────────────────────────────

    /// Add minutes to the record for `date`.
    ///
    /// Adding zero minutes still marks `date` as a study day.
    pub fn add_study_minutes(&self, date: NaiveDate, minutes: u64) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO daily_study (date, minutes, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(date) DO UPDATE SET
                minutes = minutes + excluded.minutes,
                updated_at = excluded.updated_at",
            params![
                date.format(DATE_FORMAT).to_string(),
                minutes,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    pub fn study_minutes_on(&self, date: NaiveDate) -> Result<u64, DatabaseError> {
        let minutes = self
            .conn
            .query_row(
                "SELECT minutes FROM daily_study WHERE date = ?1",
                params![date.format(DATE_FORMAT).to_string()],
                |row| row.get::<_, u64>(0),
            )
            .optional()?;
        Ok(minutes.unwrap_or(0))
    }

    pub fn has_study_record(&self, date: NaiveDate) -> Result<bool, DatabaseError> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM daily_study WHERE date = ?1)",
            params![date.format(DATE_FORMAT).to_string()],
            |row| row.get::<_, bool>(0),
        )?;
        Ok(exists)
    }

    pub fn study_days(&self) -> Result<u64, DatabaseError> {
        let days = self
            .conn
            .query_row("SELECT COUNT(*) FROM daily_study", [], |row| {
                row.get::<_, u64>(0)
            })?;
        Ok(days)
    }

    pub fn total_study_minutes(&self) -> Result<u64, DatabaseError> {
        let minutes = self.conn.query_row(
            "SELECT COALESCE(SUM(minutes), 0) FROM daily_study",
            [],
            |row| row.get::<_, u64>(0),
        )?;
        Ok(minutes)
    }

    /// Most recent days first.
    pub fn daily_records(&self, limit: usize) -> Result<Vec<DailyStudyRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT date, minutes FROM daily_study ORDER BY date DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (date, minutes) = row?;
            let date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
                .map_err(|e| DatabaseError::QueryFailed(format!("bad date '{date}': {e}")))?;
            records.push(DailyStudyRecord { date, minutes });
        }
        Ok(records)
    }

    pub fn has_reached_daily_limit(
        &self,
        date: NaiveDate,
        limit_minutes: u64,
    ) -> Result<bool, DatabaseError> {
        Ok(self.study_minutes_on(date)? >= limit_minutes)
    }

    // ── Progress ─────────────────────────────────────────────────────

    pub fn current_card_index(&self) -> Result<u64, DatabaseError> {
        Ok(self
            .kv_get(CURRENT_CARD_KEY)?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0))
    }

    pub fn set_current_card_index(&self, index: u64) -> Result<(), DatabaseError> {
        self.kv_set(CURRENT_CARD_KEY, &index.to_string())
    }

    /// Returns `false` if the card was already completed.
    pub fn mark_card_completed(&self, card_id: u64) -> Result<bool, DatabaseError> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO completed_cards (card_id, completed_at) VALUES (?1, ?2)",
            params![card_id, Utc::now().to_rfc3339()],
        )?;
        Ok(inserted > 0)
    }

    pub fn completed_cards(&self) -> Result<BTreeSet<u64>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT card_id FROM completed_cards ORDER BY card_id")?;
        let rows = stmt.query_map([], |row| row.get::<_, u64>(0))?;
        let mut ids = BTreeSet::new();
        for id in rows {
            ids.insert(id?);
        }
        Ok(ids)
    }

    pub fn is_card_completed(&self, card_id: u64) -> Result<bool, DatabaseError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM completed_cards WHERE card_id = ?1",
                params![card_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Completed share of `total_cards`, 0..=100.
    pub fn progress_percentage(&self, total_cards: u64) -> Result<u64, DatabaseError> {
        if total_cards == 0 {
            return Ok(0);
        }
        let completed = self.completed_cards()?.len() as u64;
        Ok((completed * 100 / total_cards).min(100))
    }

    pub fn progress_summary(
        &self,
        total_cards: u64,
        today: NaiveDate,
        daily_limit_minutes: u64,
    ) -> Result<ProgressSummary, DatabaseError> {
        let today_minutes = self.study_minutes_on(today)?;
        Ok(ProgressSummary {
            completed_cards: self.completed_cards()?.len() as u64,
            total_cards,
            percentage: self.progress_percentage(total_cards)?,
            current_card: self.current_card_index()?,
            today_minutes,
            total_study_days: self.study_days()?,
            daily_limit_reached: today_minutes >= daily_limit_minutes,
        })
    }

    /// Clear the study record and all progress.
    ///
    /// Other key-value entries (such as a saved tracker) are kept.
    pub fn reset_all_progress(&self) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM daily_study", [])?;
        tx.execute("DELETE FROM completed_cards", [])?;
        tx.execute("DELETE FROM kv WHERE key = ?1", params![CURRENT_CARD_KEY])?;
        tx.commit()?;
        tracing::info!("all study progress reset");
        Ok(())
    }

    // ── Key-value store ──────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl StudyLog for Database {
    fn add_minutes(&self, date: NaiveDate, minutes: u64) {
        match self.add_study_minutes(date, minutes) {
            Ok(()) => tracing::info!(%date, minutes, "study minutes recorded"),
            Err(e) => tracing::warn!(%date, minutes, error = %e, "failed to record study minutes"),
        }
    }

    fn minutes_on(&self, date: NaiveDate) -> u64 {
        self.study_minutes_on(date).unwrap_or_else(|e| {
            tracing::warn!(%date, error = %e, "failed to read study minutes");
            0
        })
    }

    fn studied_on(&self, date: NaiveDate) -> bool {
        self.has_study_record(date).unwrap_or_else(|e| {
            tracing::warn!(%date, error = %e, "failed to read study record");
            false
        })
    }

    fn total_study_days(&self) -> u64 {
        self.study_days().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to count study days");
            0
        })
    }

    fn total_minutes(&self) -> u64 {
        self.total_study_minutes().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to sum study minutes");
            0
        })
    }
}
