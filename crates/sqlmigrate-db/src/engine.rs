//! Applies and reverts migration scripts against the ledger.
//!
//! The engine keeps no state between runs. Each call reads the ledger, lists
//! the migration directory, and reconciles the two.

use std::path::PathBuf;

use rusqlite::Connection;
use serde::Serialize;
use sqlmigrate_common::{Error, Result};
use sqlmigrate_config::{MigrateConfig, RollbackMode};
use tracing::{debug, error, info, warn};

use crate::connection::open_dsn;
use crate::ledger::{Ledger, VersionRecord};
use crate::migrations::{Direction, MigrationScript};
use crate::resolver::{list_migration_files, read_script, resolve};

/// Result of a successful migrate or rollback call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Versions applied, in order.
    Applied(Vec<i64>),
    /// Versions reverted, newest first.
    RolledBack(Vec<i64>),
    /// Nothing to apply or revert.
    NoChange,
}

/// Snapshot of the ledger against the migration directory.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    pub current: Option<VersionRecord>,
    pub dirty: Option<i64>,
    pub applied: Vec<VersionRecord>,
    pub pending: Vec<MigrationScript>,
}

pub struct Migrator {
    conn: Connection,
    ledger: Ledger,
    dir: PathBuf,
    rollback_mode: RollbackMode,
}

impl Migrator {
    /// Open the configured database and make sure the ledger table exists.
    pub fn open(config: &MigrateConfig) -> Result<Self> {
        config.validate()?;
        let conn = open_dsn(config.dsn()?)?;
        let ledger = Ledger::new(&config.table)?;
        Ok(Self::new(conn, &config.dir, ledger)?.with_rollback_mode(config.rollback))
    }

    pub fn new(conn: Connection, dir: impl Into<PathBuf>, ledger: Ledger) -> Result<Self> {
        ledger.create_table_if_absent(&conn)?;
        Ok(Self {
            conn,
            ledger,
            dir: dir.into(),
            rollback_mode: RollbackMode::default(),
        })
    }

    pub fn with_rollback_mode(mut self, mode: RollbackMode) -> Self {
        self.rollback_mode = mode;
        self
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn last_version(&self) -> Result<Option<VersionRecord>> {
        self.ledger.last_version(&self.conn)
    }

    pub fn versions(&self) -> Result<Vec<VersionRecord>> {
        self.ledger.all_versions(&self.conn)
    }

    /// Apply every pending `.up.sql` script in one transaction.
    ///
    /// On a failing script the transaction is rolled back and the version is
    /// written to the ledger as dirty outside the transaction, so the next run
    /// stops at [`Error::DirtyLedger`].
    pub fn migrate(&mut self) -> Result<MigrationOutcome> {
        let last = self.ledger.last_version(&self.conn)?.map(|r| r.version);
        let files = list_migration_files(&self.dir)?;
        let scripts = resolve(Direction::Up, last, &files);
        if scripts.is_empty() {
            info!("no new migrations to apply");
            return Ok(MigrationOutcome::NoChange);
        }

        let total = scripts.len();
        let tx = self
            .conn
            .transaction()
            .map_err(|e| Error::Database(format!("failed to begin transaction: {e}")))?;
        let mut applied = Vec::with_capacity(total);

        for (i, script) in scripts.iter().enumerate() {
            let sql = read_script(&self.dir, script)?;
            debug!(file = %script.file_name, "executing");

            if let Err(e) = tx.execute_batch(&sql) {
                let message = e.to_string();
                if let Err(rb) = tx.rollback() {
                    error!("failed to roll back after {}: {rb}", script.file_name);
                }
                self.mark_dirty(script, &message)?;
                return Err(Error::SqlExecution {
                    file: script.file_name.clone(),
                    message,
                });
            }

            self.ledger.record_version(&tx, script.version, false)?;
            info!("{}/{}  {}", i + 1, total, script.file_name);
            applied.push(script.version);
        }

        tx.commit()
            .map_err(|e| Error::Database(format!("failed to commit migrations: {e}")))?;
        Ok(MigrationOutcome::Applied(applied))
    }

    /// Record `script` as dirty after its SQL failed with `sql_error`. If the
    /// marker cannot be written the ledger would not block the next run, so
    /// that failure is returned together with the original SQL error.
    fn mark_dirty(&self, script: &MigrationScript, sql_error: &str) -> Result<()> {
        match self.ledger.record_version(&self.conn, script.version, true) {
            Ok(()) => {
                warn!(
                    version = script.version,
                    "{} failed, version marked dirty", script.file_name
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    version = script.version,
                    "{} failed and the dirty flag could not be written: {e}", script.file_name
                );
                Err(Error::Database(format!(
                    "{}: {sql_error}; additionally failed to mark version {} dirty: {e}",
                    script.file_name, script.version
                )))
            }
        }
    }

    /// Roll back according to the configured [`RollbackMode`].
    pub fn rollback(&mut self) -> Result<MigrationOutcome> {
        match self.rollback_mode {
            RollbackMode::One => self.rollback_one(),
            RollbackMode::All => self.rollback_all(),
        }
    }

    /// Undo the most recently applied version only.
    pub fn rollback_one(&mut self) -> Result<MigrationOutcome> {
        let last = match self.ledger.last_version(&self.conn)? {
            Some(record) if record.version != 0 => record.version,
            _ => {
                info!("no applied migrations to roll back");
                return Ok(MigrationOutcome::NoChange);
            }
        };
        info!("last version: {last}");

        let files = list_migration_files(&self.dir)?;
        let script = resolve(Direction::Down, Some(last), &files)
            .into_iter()
            .find(|s| s.version == last)
            .ok_or(Error::MissingDownFile { version: last })?;
        let sql = read_script(&self.dir, &script)?;

        let tx = self
            .conn
            .transaction()
            .map_err(|e| Error::Database(format!("failed to begin transaction: {e}")))?;
        tx.execute_batch(&sql).map_err(|e| Error::SqlExecution {
            file: script.file_name.clone(),
            message: e.to_string(),
        })?;
        self.ledger.delete_version(&tx, last)?;
        tx.commit()
            .map_err(|e| Error::Database(format!("failed to commit rollback: {e}")))?;

        info!("rolled back version {last}");
        Ok(MigrationOutcome::RolledBack(vec![last]))
    }

    /// Undo every recorded version, newest first, then empty the ledger.
    /// All of it happens in one transaction.
    pub fn rollback_all(&mut self) -> Result<MigrationOutcome> {
        let last = match self.ledger.last_version(&self.conn)? {
            Some(record) if record.version != 0 => record.version,
            _ => {
                info!("no applied migrations to roll back");
                return Ok(MigrationOutcome::NoChange);
            }
        };

        let recorded = self.ledger.all_versions(&self.conn)?;
        let files = list_migration_files(&self.dir)?;
        let scripts: Vec<MigrationScript> = resolve(Direction::Down, Some(last), &files)
            .into_iter()
            .filter(|s| recorded.iter().any(|r| r.version == s.version))
            .collect();

        if let Some(missing) = recorded
            .iter()
            .find(|r| !scripts.iter().any(|s| s.version == r.version))
        {
            return Err(Error::MissingDownFile {
                version: missing.version,
            });
        }

        let sources = scripts
            .iter()
            .map(|s| read_script(&self.dir, s))
            .collect::<Result<Vec<_>>>()?;

        let total = scripts.len();
        let tx = self
            .conn
            .transaction()
            .map_err(|e| Error::Database(format!("failed to begin transaction: {e}")))?;
        for (i, (script, sql)) in scripts.iter().zip(&sources).enumerate() {
            tx.execute_batch(sql).map_err(|e| Error::SqlExecution {
                file: script.file_name.clone(),
                message: e.to_string(),
            })?;
            info!("{}/{}  {}", i + 1, total, script.file_name);
        }
        self.ledger.clear(&tx)?;
        tx.commit()
            .map_err(|e| Error::Database(format!("failed to commit rollback: {e}")))?;

        Ok(MigrationOutcome::RolledBack(
            scripts.iter().map(|s| s.version).collect(),
        ))
    }

    /// Empty the ledger without touching the schema. Returns the rows removed.
    pub fn clean(&self) -> Result<usize> {
        let removed = self.ledger.clear(&self.conn)?;
        info!("removed {removed} ledger rows from {}", self.ledger.table());
        Ok(removed)
    }

    /// Ledger contents and pending scripts. Works on a dirty ledger.
    pub fn status(&self) -> Result<MigrationStatus> {
        let applied = self.ledger.all_versions(&self.conn)?;
        let current = self.ledger.latest_record(&self.conn)?;
        let dirty = self.ledger.dirty_version(&self.conn)?;
        let files = list_migration_files(&self.dir)?;
        let pending = resolve(Direction::Up, current.as_ref().map(|r| r.version), &files);

        Ok(MigrationStatus {
            current,
            dirty,
            applied,
            pending,
        })
    }

    /// Forget a dirty version so its fixed script is attempted again by the
    /// next `migrate`. Only the dirty version can be cleared this way.
    pub fn clear_dirty(&self, version: i64) -> Result<()> {
        match self.ledger.dirty_version(&self.conn)? {
            Some(dirty) if dirty == version => {
                self.ledger.delete_version(&self.conn, version)?;
                info!("cleared dirty version {version}");
                Ok(())
            }
            Some(dirty) => Err(Error::NotFound(format!(
                "version {version} is not dirty (dirty version is {dirty})"
            ))),
            None => Err(Error::NotFound("ledger has no dirty version".into())),
        }
    }
}
