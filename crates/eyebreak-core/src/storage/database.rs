//! SQLite-based persistence.
//!
//! Provides the daily completion counter and a key-value store used to
//! carry the serialized timer engine across CLI invocations. The stats
//! record `{date, count}` is independent of the settings file.

use chrono::{Local, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::{DatabaseError, Result};

/// Today's completion counter.
///
/// `count` only increases between rollovers: it is reset to zero exactly
/// when the stored date no longer matches the current date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub count: u32,
}

/// SQLite database for stats and key-value state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/eyebreak/eyebreak.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Ok(Self::at(data_dir()?.join("eyebreak.db"))?)
    }

    /// Open the database at an explicit path (for tests).
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn at(path: PathBuf) -> Result<Self, DatabaseError> {
        let conn = Connection::open(&path)
            .map_err(|source| DatabaseError::OpenFailed { path, source })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (primarily for tests).
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS daily_stats (
                id    INTEGER PRIMARY KEY CHECK (id = 1),
                date  TEXT NOT NULL,
                count INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// Read today's stats.
    ///
    /// A stored row from an earlier date reads as zero; the rollover is not
    /// persisted until the next increment.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn daily_stats(&self) -> Result<DailyStats, DatabaseError> {
        let row: Option<(String, u32)> = self
            .conn
            .query_row("SELECT date, count FROM daily_stats WHERE id = 1", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()?;

        let today = Self::today();
        match row {
            Some((date, count)) if date == today.format("%Y-%m-%d").to_string() => {
                Ok(DailyStats { date: today, count })
            }
            _ => Ok(DailyStats {
                date: today,
                count: 0,
            }),
        }
    }

    /// Increment today's counter by one and persist the result.
    ///
    /// Rollover and increment happen in a single statement, so a
    /// read-modify-write can never lose an update.
    ///
    /// # Errors
    /// Returns an error if the upsert fails.
    pub fn increment_today(&self) -> Result<DailyStats, DatabaseError> {
        let today = Self::today().format("%Y-%m-%d").to_string();
        self.conn.execute(
            "INSERT INTO daily_stats (id, date, count) VALUES (1, ?1, 1)
             ON CONFLICT(id) DO UPDATE SET
                 count = CASE WHEN daily_stats.date = excluded.date
                              THEN daily_stats.count + 1 ELSE 1 END,
                 date = excluded.date",
            params![today],
        )?;
        self.daily_stats()
    }

    /// Read a value from the key-value store.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Write a value to the key-value store.
    ///
    /// # Errors
    /// Returns an error if the upsert fails.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_start_at_zero() {
        let db = Database::open_memory().unwrap();
        let stats = db.daily_stats().unwrap();
        assert_eq!(stats.count, 0);
    }

    #[test]
    fn increment_is_monotonic_within_a_day() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.increment_today().unwrap().count, 1);
        assert_eq!(db.increment_today().unwrap().count, 2);
        assert_eq!(db.increment_today().unwrap().count, 3);
        assert_eq!(db.daily_stats().unwrap().count, 3);
    }

    #[test]
    fn stale_date_reads_as_zero_without_persisting_rollover() {
        let db = Database::open_memory().unwrap();
        db.conn()
            .execute(
                "INSERT INTO daily_stats (id, date, count) VALUES (1, '2024-01-01', 7)",
                [],
            )
            .unwrap();

        // Reads roll over in memory only.
        assert_eq!(db.daily_stats().unwrap().count, 0);
        let stored: (String, u32) = db
            .conn()
            .query_row("SELECT date, count FROM daily_stats WHERE id = 1", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(stored, ("2024-01-01".to_string(), 7));

        // The first increment persists the rollover.
        let stats = db.increment_today().unwrap();
        assert_eq!(stats.count, 1);
        let stored: String = db
            .conn()
            .query_row("SELECT date FROM daily_stats WHERE id = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(stored, stats.date.format("%Y-%m-%d").to_string());
    }

    #[test]
    fn kv_roundtrip() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.kv_get("engine").unwrap(), None);
        db.kv_set("engine", "{}").unwrap();
        db.kv_set("engine", "{\"phase\":\"stopped\"}").unwrap();
        assert_eq!(
            db.kv_get("engine").unwrap().as_deref(),
            Some("{\"phase\":\"stopped\"}")
        );
    }
}
