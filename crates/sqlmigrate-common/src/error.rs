use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    /// The most recently applied version failed mid-apply. Nothing moves
    /// until an operator fixes the script and clears the flag.
    #[error("migration is dirty: version {version} failed previously and must be resolved manually")]
    DirtyLedger { version: i64 },

    #[error("version {version} is already recorded in the ledger")]
    DuplicateVersion { version: i64 },

    #[error("rollback: no .down.sql file for version {version}")]
    MissingDownFile { version: i64 },

    #[error("{file}: {message}")]
    SqlExecution { file: String, message: String },

    #[error("file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
