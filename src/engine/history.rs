//! History Repository: log of snapshot changes recorded by `watch`.

use super::types::{Severity, StatusSnapshot};
use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SNAPSHOT_SELECT: &str =
    "SELECT id, status, message, nagging, downtime, recorded_at FROM snapshots";

/// A stored snapshot and when it was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: i64,
    pub snapshot: StatusSnapshot,
    pub recorded_at: String,
}

pub struct HistoryRepo<'a> {
    conn: &'a Connection,
}

impl<'a> HistoryRepo<'a> {
    #[must_use]
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Appends a snapshot to the log.
    ///
    /// # Errors
    /// Returns an error if the insertion fails.
    pub fn record(&self, snapshot: &StatusSnapshot, recorded_at: NaiveDateTime) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO snapshots (status, message, nagging, downtime, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                snapshot.status.to_string(),
                snapshot.message,
                snapshot.nagging_enabled,
                snapshot.downtime_enabled,
                recorded_at.format(TIMESTAMP_FORMAT).to_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Gets the most recently recorded snapshot.
    ///
    /// # Errors
    /// Returns a `rusqlite` error if query logic fails.
    pub fn latest(&self) -> rusqlite::Result<Option<HistoryEntry>> {
        let sql = format!("{SNAPSHOT_SELECT} ORDER BY id DESC LIMIT 1");
        self.conn.query_row(&sql, [], row_to_entry).optional()
    }

    /// Retrieves up to `limit` entries, newest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let sql = format!("{SNAPSHOT_SELECT} ORDER BY id DESC LIMIT ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit], row_to_entry)?;

        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry?);
        }
        Ok(entries)
    }
}

fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<HistoryEntry> {
    let status = row
        .get::<_, String>(1)?
        .parse::<Severity>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
    Ok(HistoryEntry {
        id: row.get(0)?,
        snapshot: StatusSnapshot {
            status,
            message: row.get(2)?,
            nagging_enabled: row.get(3)?,
            downtime_enabled: row.get(4)?,
        },
        recorded_at: row.get(5)?,
    })
}
