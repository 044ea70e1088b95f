use std::path::{Path, PathBuf};

use sqlmigrate_common::{Error, Result};
use tracing::{debug, info};

use crate::model::{MigrateConfig, RollbackMode};

/// Config files picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["sqlmigrate.yml", "sqlmigrate.yaml", "sqlmigrate.toml"];

const ENV_PREFIX: &str = "SQLMIGRATE_";

/// Builds a [`MigrateConfig`] from an optional file and `SQLMIGRATE_*`
/// environment variables. Command-line flags are layered on by the caller.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load `path` if given, otherwise the first default config file found in
    /// `base_dir`, otherwise defaults. Environment variables win over the file.
    pub fn load(path: Option<&Path>, base_dir: &Path) -> Result<MigrateConfig> {
        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::discover(base_dir),
        };

        let mut config = match file {
            Some(ref p) => Self::from_file(p)?,
            None => {
                debug!("no config file found, using defaults");
                MigrateConfig::default()
            }
        };

        Self::apply_vars(&mut config, |key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn discover(base_dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_FILES
            .iter()
            .map(|name| base_dir.join(name))
            .find(|p| p.is_file())
    }

    pub fn from_file(path: &Path) -> Result<MigrateConfig> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config = match ext {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .map_err(|e| Error::Config(format!("YAML parse error: {e}")))?,
            "toml" => toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("TOML parse error: {e}")))?,
            other => {
                return Err(Error::Config(format!(
                    "unsupported config extension: {other}"
                )));
            }
        };

        info!("config loaded from {}", path.display());
        Ok(config)
    }

    /// Overlay `SQLMIGRATE_DSN`, `_DIR`, `_TABLE`, `_ROLLBACK` and `_PRODUCTION`.
    pub fn apply_vars<F>(config: &mut MigrateConfig, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}")).filter(|v| !v.is_empty());

        if let Some(dsn) = var("DSN") {
            config.dsn = Some(dsn);
        }
        if let Some(dir) = var("DIR") {
            config.dir = PathBuf::from(dir);
        }
        if let Some(table) = var("TABLE") {
            config.table = table;
        }
        if let Some(mode) = var("ROLLBACK") {
            config.rollback = parse_rollback_mode(&mode)?;
        }
        if let Some(flag) = var("PRODUCTION") {
            config.production = parse_bool(&flag)
                .ok_or_else(|| Error::Config(format!("invalid {ENV_PREFIX}PRODUCTION: {flag}")))?;
        }
        Ok(())
    }
}

fn parse_rollback_mode(s: &str) -> Result<RollbackMode> {
    match s.trim().to_ascii_lowercase().as_str() {
        "one" => Ok(RollbackMode::One),
        "all" => Ok(RollbackMode::All),
        other => Err(Error::Config(format!(
            "invalid rollback mode {other:?} (expected \"one\" or \"all\")"
        ))),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
