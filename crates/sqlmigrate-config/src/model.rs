use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlmigrate_common::{Error, Result};

pub const DEFAULT_DIR: &str = "migrations";
pub const DEFAULT_TABLE: &str = "migrations";

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("identifier pattern is valid")
});

/// What `down` undoes: the latest version only, or everything back to empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollbackMode {
    #[default]
    One,
    All,
}

/// Settings shared by every command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrateConfig {
    pub dsn: Option<String>,
    pub dir: PathBuf,
    pub table: String,
    pub rollback: RollbackMode,
    /// Ask for interactive confirmation before touching the database.
    pub production: bool,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            dir: PathBuf::from(DEFAULT_DIR),
            table: DEFAULT_TABLE.to_string(),
            rollback: RollbackMode::One,
            production: true,
        }
    }
}

impl MigrateConfig {
    /// Check the settings needed to open the database.
    pub fn validate(&self) -> Result<()> {
        validate_identifier(&self.table)?;
        match self.dsn.as_deref().map(str::trim) {
            None | Some("") => Err(Error::Config("database source (dsn) required".into())),
            Some(_) => Ok(()),
        }
    }

    /// The DSN after `validate()` has passed.
    pub fn dsn(&self) -> Result<&str> {
        self.dsn
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| Error::Config("database source (dsn) required".into()))
    }
}

/// The ledger table name is spliced into SQL text, so only plain identifiers
/// are accepted.
pub fn validate_identifier(name: &str) -> Result<()> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(Error::Config(format!("invalid table name: {name:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_cli_defaults() {
        let config = MigrateConfig::default();
        assert_eq!(config.dir, PathBuf::from("migrations"));
        assert_eq!(config.table, "migrations");
        assert_eq!(config.rollback, RollbackMode::One);
        assert!(config.production);
        assert!(config.dsn.is_none());
    }

    #[test]
    fn validate_requires_dsn() {
        let mut config = MigrateConfig::default();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.dsn = Some("   ".into());
        assert!(config.validate().is_err());

        config.dsn = Some("app.db".into());
        assert!(config.validate().is_ok());
        assert_eq!(config.dsn().unwrap(), "app.db");
    }

    #[test]
    fn table_names_must_be_identifiers() {
        assert!(validate_identifier("migrations").is_ok());
        assert!(validate_identifier("_schema_versions2").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("2migrations").is_err());
        assert!(validate_identifier("migrations; drop table users").is_err());
        assert!(validate_identifier("public.migrations").is_err());
    }

    #[test]
    fn rollback_mode_deserializes_lowercase() {
        let mode: RollbackMode = serde_yaml::from_str("all").unwrap();
        assert_eq!(mode, RollbackMode::All);
        let mode: RollbackMode = serde_yaml::from_str("one").unwrap();
        assert_eq!(mode, RollbackMode::One);
    }
}
