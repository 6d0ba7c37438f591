// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Record store — CRUD over the profile table, keyed by owner and id.
//
// The SQLite implementation keeps one row per handwriting profile:
//   handwriting_fonts(
//     id               TEXT    PRIMARY KEY,  -- UUID v4 assigned on insert
//     user_id          TEXT    NOT NULL,
//     name             TEXT    NOT NULL,
//     sample_image_url TEXT    NOT NULL,
//     font_style       TEXT    NOT NULL,     -- cursive | print | mixed
//     is_active        INTEGER NOT NULL,     -- 0 / 1
//     created_at       TEXT    NOT NULL      -- RFC 3339, microsecond precision
//   )

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use penmark_core::error::{PenmarkError, Result};
use penmark_core::types::{HandwritingProfile, OwnerId, ProfileId};
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, Row, params, params_from_iter};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Table holding handwriting profiles.
pub const PROFILE_TABLE: &str = "handwriting_fonts";

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS handwriting_fonts (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        name TEXT NOT NULL,
        sample_image_url TEXT NOT NULL,
        font_style TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_handwriting_fonts_user ON handwriting_fonts (user_id);
"#;

const SELECT_SQL: &str = "SELECT id, user_id, name, sample_image_url, font_style, is_active, created_at
     FROM handwriting_fonts";

/// Convert a `rusqlite::Error` into a `PenmarkError::Store`.
fn db_err(e: rusqlite::Error) -> PenmarkError {
    PenmarkError::Store(e.to_string())
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A persisted profile row, exactly as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub sample_image_url: String,
    pub font_style: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ProfileRow {
    /// Convert into the domain type, rejecting unknown style keywords.
    pub fn into_profile(self) -> Result<HandwritingProfile> {
        let style_category = self.font_style.parse().map_err(|_| {
            PenmarkError::Store(format!(
                "row {} has invalid font_style '{}'",
                self.id, self.font_style
            ))
        })?;
        Ok(HandwritingProfile {
            id: ProfileId(self.id),
            owner_id: OwnerId(self.user_id),
            name: self.name,
            style_category,
            sample_image_ref: self.sample_image_url,
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}

/// Row contents supplied on insert. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfileRow {
    pub user_id: String,
    pub name: String,
    pub sample_image_url: String,
    pub font_style: String,
    pub is_active: bool,
}

/// Equality filter on owner and/or id. An empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    pub id: Option<String>,
    pub user_id: Option<String>,
}

impl RowFilter {
    /// Rows owned by `owner`.
    pub fn owner(owner: &OwnerId) -> Self {
        Self {
            id: None,
            user_id: Some(owner.0.clone()),
        }
    }

    /// Narrow the filter to a single id.
    pub fn with_id(mut self, id: &ProfileId) -> Self {
        self.id = Some(id.0.clone());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.user_id.is_none()
    }

    /// `WHERE` clause (possibly empty) and its positional values.
    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut values = Vec::new();
        if let Some(ref id) = self.id {
            clauses.push("id = ?");
            values.push(Value::Text(id.clone()));
        }
        if let Some(ref user_id) = self.user_id {
            clauses.push("user_id = ?");
            values.push(Value::Text(user_id.clone()));
        }
        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), values)
        }
    }
}

/// Columns changed by an update. Only the active flag is mutable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowPatch {
    pub is_active: Option<bool>,
}

impl RowPatch {
    pub fn active(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
        }
    }
}

/// Result ordering for queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderBy {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl OrderBy {
    fn sql(&self) -> &'static str {
        // rowid breaks ties between rows created in the same microsecond.
        match self {
            Self::NewestFirst => " ORDER BY created_at DESC, rowid DESC",
            Self::OldestFirst => " ORDER BY created_at ASC, rowid ASC",
        }
    }
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// Table-oriented record storage used by the profile registry.
pub trait RecordStore {
    /// Insert a row and return the id the store assigned to it.
    fn insert(&self, table: &str, row: &NewProfileRow) -> Result<String>;

    /// Apply `patch` to every row matching `filter`; returns rows affected.
    fn update(&self, table: &str, filter: &RowFilter, patch: &RowPatch) -> Result<usize>;

    /// Remove every row matching `filter`; returns rows affected.
    fn delete(&self, table: &str, filter: &RowFilter) -> Result<usize>;

    fn query(&self, table: &str, filter: &RowFilter, order: OrderBy) -> Result<Vec<ProfileRow>>;
}

fn check_table(table: &str) -> Result<()> {
    if table == PROFILE_TABLE {
        Ok(())
    } else {
        Err(PenmarkError::Store(format!("unknown table '{table}'")))
    }
}

fn check_mutation_filter(filter: &RowFilter) -> Result<()> {
    if filter.is_empty() {
        return Err(PenmarkError::Store("refusing to mutate without a filter".into()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// SQLite implementation
// ---------------------------------------------------------------------------

/// Record store backed by a SQLite database.
///
/// All methods are synchronous; `rusqlite` has no async API.
pub struct SqliteRecordStore {
    conn: Connection,
}

impl SqliteRecordStore {
    /// Open (or create) the profile database at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(db_err)?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(db_err)?;
        conn.execute_batch(CREATE_TABLE_SQL).map_err(db_err)?;

        info!("profile database opened");
        Ok(Self { conn })
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(CREATE_TABLE_SQL).map_err(db_err)?;

        debug!("in-memory profile database opened");
        Ok(Self { conn })
    }
}

fn row_to_profile_row(row: &Row<'_>) -> rusqlite::Result<ProfileRow> {
    let created_at: String = row.get(6)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);
    Ok(ProfileRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        sample_image_url: row.get(3)?,
        font_style: row.get(4)?,
        is_active: row.get::<_, i32>(5)? != 0,
        created_at,
    })
}

impl RecordStore for SqliteRecordStore {
    #[instrument(skip(self, row), fields(user_id = %row.user_id))]
    fn insert(&self, table: &str, row: &NewProfileRow) -> Result<String> {
        check_table(table)?;
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        self.conn
            .execute(
                "INSERT INTO handwriting_fonts
                 (id, user_id, name, sample_image_url, font_style, is_active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id,
                    row.user_id,
                    row.name,
                    row.sample_image_url,
                    row.font_style,
                    row.is_active as i32,
                    created_at,
                ],
            )
            .map_err(db_err)?;

        debug!(%id, "profile row inserted");
        Ok(id)
    }

    #[instrument(skip(self))]
    fn update(&self, table: &str, filter: &RowFilter, patch: &RowPatch) -> Result<usize> {
        check_table(table)?;
        check_mutation_filter(filter)?;
        let Some(is_active) = patch.is_active else {
            return Err(PenmarkError::Store("empty patch".into()));
        };

        let (where_sql, filter_values) = filter.where_clause();
        let mut values = vec![Value::Integer(is_active as i64)];
        values.extend(filter_values);

        let sql = format!("UPDATE {PROFILE_TABLE} SET is_active = ?{where_sql}");
        let rows = self
            .conn
            .execute(&sql, params_from_iter(values.iter()))
            .map_err(db_err)?;

        debug!(rows, "profile rows updated");
        Ok(rows)
    }

    #[instrument(skip(self))]
    fn delete(&self, table: &str, filter: &RowFilter) -> Result<usize> {
        check_table(table)?;
        check_mutation_filter(filter)?;

        let (where_sql, values) = filter.where_clause();
        let sql = format!("DELETE FROM {PROFILE_TABLE}{where_sql}");
        let rows = self
            .conn
            .execute(&sql, params_from_iter(values.iter()))
            .map_err(db_err)?;

        debug!(rows, "profile rows deleted");
        Ok(rows)
    }

    #[instrument(skip(self))]
    fn query(&self, table: &str, filter: &RowFilter, order: OrderBy) -> Result<Vec<ProfileRow>> {
        check_table(table)?;

        let (where_sql, values) = filter.where_clause();
        let sql = format!("{SELECT_SQL}{where_sql}{}", order.sql());
        let mut stmt = self.conn.prepare(&sql).map_err(db_err)?;

        let rows = stmt
            .query_map(params_from_iter(values.iter()), row_to_profile_row)
            .map_err(db_err)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(db_err)?);
        }
        Ok(result)
    }
}
