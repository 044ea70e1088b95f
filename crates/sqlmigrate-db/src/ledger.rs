//! The version ledger: one table in the target database recording every
//! attempted migration version, whether it failed, and when it was written.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use sqlmigrate_common::{Error, Result};
use sqlmigrate_config::{DEFAULT_TABLE, validate_identifier};
use tracing::debug;

/// A ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub version: i64,
    pub dirty: bool,
    pub applied_at: DateTime<Utc>,
}

/// Accessor for the ledger table.
///
/// Every method takes the connection explicitly so the same calls work on a
/// bare connection and inside a `rusqlite::Transaction`.
#[derive(Debug, Clone)]
pub struct Ledger {
    table: String,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

impl Ledger {
    pub fn new(table: &str) -> Result<Self> {
        validate_identifier(table)?;
        Ok(Self {
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the ledger table unless it already exists. Safe to race.
    pub fn create_table_if_absent(&self, conn: &Connection) -> Result<()> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                version VARCHAR(60) NOT NULL UNIQUE,
                dirty BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            );",
            self.table
        ))
        .map_err(|e| Error::Database(format!("failed to create ledger table: {e}")))?;
        Ok(())
    }

    /// The most recently applied version, or `None` for an empty ledger.
    ///
    /// Fails with [`Error::DirtyLedger`] when that record is dirty. Every
    /// operation that needs the current version goes through here, so they all
    /// refuse to run past a failed migration.
    pub fn last_version(&self, conn: &Connection) -> Result<Option<VersionRecord>> {
        match self.latest_record(conn)? {
            Some(record) if record.dirty => Err(Error::DirtyLedger {
                version: record.version,
            }),
            other => Ok(other),
        }
    }

    /// Like [`Ledger::last_version`] but without the dirty check.
    pub(crate) fn latest_record(&self, conn: &Connection) -> Result<Option<VersionRecord>> {
        let row = conn
            .query_row(
                &format!(
                    "SELECT version, dirty, created_at FROM {}
                     ORDER BY created_at DESC, rowid DESC LIMIT 1",
                    self.table
                ),
                [],
                read_row,
            )
            .optional()
            .map_err(|e| Error::Database(format!("failed to read last version: {e}")))?;

        row.map(into_record).transpose()
    }

    /// Every ledger row in application order.
    pub fn all_versions(&self, conn: &Connection) -> Result<Vec<VersionRecord>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT version, dirty, created_at FROM {} ORDER BY created_at ASC, rowid ASC",
                self.table
            ))
            .map_err(|e| Error::Database(format!("failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map([], read_row)
            .map_err(|e| Error::Database(format!("failed to query versions: {e}")))?;

        let mut records = Vec::new();
        for row in rows {
            let row =
                row.map_err(|e| Error::Database(format!("failed to read version row: {e}")))?;
            records.push(into_record(row)?);
        }
        Ok(records)
    }

    /// The dirty version, if any. Does not fail on a dirty ledger.
    pub fn dirty_version(&self, conn: &Connection) -> Result<Option<i64>> {
        let version: Option<String> = conn
            .query_row(
                &format!(
                    "SELECT version FROM {} WHERE dirty
                     ORDER BY created_at DESC, rowid DESC LIMIT 1",
                    self.table
                ),
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::Database(format!("failed to look up dirty version: {e}")))?;

        version.map(|v| parse_version(&v)).transpose()
    }

    /// Insert a row. The database assigns `created_at`.
    pub fn record_version(&self, conn: &Connection, version: i64, dirty: bool) -> Result<()> {
        conn.execute(
            &format!("INSERT INTO {} (version, dirty) VALUES (?1, ?2)", self.table),
            params![version.to_string(), dirty],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(ref err, _)
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Error::DuplicateVersion { version }
            }
            other => Error::Database(format!("failed to record version {version}: {other}")),
        })?;
        debug!(version, dirty, "ledger row recorded");
        Ok(())
    }

    pub fn set_dirty(&self, conn: &Connection, version: i64, dirty: bool) -> Result<()> {
        let updated = conn
            .execute(
                &format!("UPDATE {} SET dirty = ?2 WHERE version = ?1", self.table),
                params![version.to_string(), dirty],
            )
            .map_err(|e| Error::Database(format!("failed to update version {version}: {e}")))?;
        if updated == 0 {
            return Err(Error::NotFound(format!("version {version} is not in the ledger")));
        }
        Ok(())
    }

    pub fn delete_version(&self, conn: &Connection, version: i64) -> Result<()> {
        let deleted = conn
            .execute(
                &format!("DELETE FROM {} WHERE version = ?1", self.table),
                params![version.to_string()],
            )
            .map_err(|e| Error::Database(format!("failed to delete version {version}: {e}")))?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("version {version} is not in the ledger")));
        }
        Ok(())
    }

    /// Remove every row. SQLite has no TRUNCATE, so this is a plain DELETE.
    pub fn clear(&self, conn: &Connection) -> Result<usize> {
        conn.execute(&format!("DELETE FROM {}", self.table), [])
            .map_err(|e| Error::Database(format!("failed to clear ledger: {e}")))
    }
}

type RawRow = (String, bool, String);

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn into_record((version, dirty, created_at): RawRow) -> Result<VersionRecord> {
    Ok(VersionRecord {
        version: parse_version(&version)?,
        dirty,
        applied_at: parse_datetime(&created_at)?,
    })
}

fn parse_version(s: &str) -> Result<i64> {
    s.trim()
        .parse()
        .map_err(|_| Error::Database(format!("ledger holds a non-numeric version: {s:?}")))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    // strftime('%Y-%m-%d %H:%M:%f') yields "YYYY-MM-DD HH:MM:SS.SSS"
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::Database(format!("invalid created_at {s:?}: {e}")))
}
