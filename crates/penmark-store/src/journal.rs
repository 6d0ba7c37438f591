// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operation journal — append-only SQLite log of registry operations.
//
// Partial failures land here with the orphaned blob path in `details`, which
// is what an operator works from when reclaiming storage.
//
// Schema:
//   registry_journal(
//     id        INTEGER PRIMARY KEY AUTOINCREMENT,
//     timestamp TEXT    NOT NULL,   -- RFC 3339
//     action    TEXT    NOT NULL,   -- "upload", "activate", "delete"
//     owner_id  TEXT    NOT NULL,
//     subject   TEXT    NOT NULL,   -- profile id or blob path
//     success   INTEGER NOT NULL,   -- 0 = failure, 1 = success
//     details   TEXT
//   )

use std::path::Path;

use chrono::Utc;
use penmark_core::error::{PenmarkError, Result};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS registry_journal (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT    NOT NULL,
    action    TEXT    NOT NULL,
    owner_id  TEXT    NOT NULL,
    subject   TEXT    NOT NULL,
    success   INTEGER NOT NULL,
    details   TEXT
);";

fn db_err(e: rusqlite::Error) -> PenmarkError {
    PenmarkError::Store(e.to_string())
}

/// A single journal entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: i64,
    pub timestamp: String,
    pub action: String,
    pub owner_id: String,
    pub subject: String,
    pub success: bool,
    pub details: Option<String>,
}

fn map_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<JournalEntry> {
    Ok(JournalEntry {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        action: row.get(2)?,
        owner_id: row.get(3)?,
        subject: row.get(4)?,
        success: row.get::<_, i32>(5)? != 0,
        details: row.get(6)?,
    })
}

/// Append-only journal backed by a SQLite database.
pub struct OperationJournal {
    conn: Connection,
}

impl OperationJournal {
    /// Open (or create) the journal database at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(db_err)?;
        conn.execute_batch(CREATE_TABLE_SQL).map_err(db_err)?;

        debug!("operation journal opened");
        Ok(Self { conn })
    }

    /// Open an in-memory journal (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(CREATE_TABLE_SQL).map_err(db_err)?;
        Ok(Self { conn })
    }

    /// Append an entry.
    #[instrument(skip(self, details), fields(%action, %owner_id, success))]
    pub fn record(
        &self,
        action: &str,
        owner_id: &str,
        subject: &str,
        success: bool,
        details: Option<&str>,
    ) -> Result<()> {
        let timestamp = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO registry_journal (timestamp, action, owner_id, subject, success, details)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![timestamp, action, owner_id, subject, success as i32, details],
            )
            .map_err(db_err)?;
        Ok(())
    }

    /// Entries for one owner, oldest first.
    pub fn entries_for_owner(&self, owner_id: &str) -> Result<Vec<JournalEntry>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, action, owner_id, subject, success, details
                 FROM registry_journal
                 WHERE owner_id = ?1
                 ORDER BY id ASC",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![owner_id], map_entry)
            .map_err(db_err)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(db_err)?);
        }
        Ok(entries)
    }

    /// The most recent `limit` entries, newest first.
    pub fn recent_entries(&self, limit: u32) -> Result<Vec<JournalEntry>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, action, owner_id, subject, success, details
                 FROM registry_journal
                 ORDER BY id DESC
                 LIMIT ?1",
            )
            .map_err(db_err)?;
        let rows = stmt.query_map(params![limit], map_entry).map_err(db_err)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(db_err)?);
        }
        Ok(entries)
    }

    pub fn count(&self) -> Result<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM registry_journal", [], |row| row.get(0))
            .map_err(db_err)
    }
}
