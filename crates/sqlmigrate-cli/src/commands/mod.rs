pub mod create;
pub mod down;
pub mod ledger;
pub mod status;
pub mod up;

use anyhow::{Context, Result};
use sqlmigrate_config::{ConfigLoader, MigrateConfig};
use sqlmigrate_db::{MigrationOutcome, Migrator};
use tracing::debug;

use crate::cli::{DbArgs, GlobalArgs};
use crate::confirm::{confirm, prompt_for};

/// Config file and environment first, then command-line flags.
pub(crate) fn load_config(global: &GlobalArgs, db: &DbArgs) -> Result<MigrateConfig> {
    let mut config = load_base_config(global)?;
    apply_overrides(&mut config, db);
    config.validate()?;
    debug!(
        dir = %config.dir.display(),
        table = %config.table,
        production = config.production,
        "configuration resolved"
    );
    Ok(config)
}

pub(crate) fn load_base_config(global: &GlobalArgs) -> Result<MigrateConfig> {
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    ConfigLoader::load(global.config.as_deref(), &cwd).context("failed to load configuration")
}

pub(crate) fn apply_overrides(config: &mut MigrateConfig, db: &DbArgs) {
    if let Some(dsn) = &db.dsn {
        config.dsn = Some(dsn.clone());
    }
    if let Some(dir) = &db.dir {
        config.dir = dir.clone();
    }
    if let Some(production) = db.production {
        config.production = production;
    }
}

/// Returns `false` when the operator declined. Outside production mode
/// nothing is asked.
pub(crate) fn confirmed(config: &MigrateConfig, action: &str) -> Result<bool> {
    if !config.production {
        return Ok(true);
    }
    let accepted = confirm(&prompt_for(action))?;
    if !accepted {
        println!("Aborted, nothing was changed.");
    }
    Ok(accepted)
}

pub(crate) fn open(config: &MigrateConfig) -> Result<Migrator> {
    Migrator::open(config).context("failed to open database")
}

pub(crate) fn report(outcome: &MigrationOutcome) {
    match outcome {
        MigrationOutcome::Applied(versions) => {
            let last = versions.last().copied().unwrap_or_default();
            println!(
                "Applied {} migration{}, now at version {last}.",
                versions.len(),
                if versions.len() == 1 { "" } else { "s" }
            );
        }
        MigrationOutcome::RolledBack(versions) => {
            let list: Vec<String> = versions.iter().map(|v| v.to_string()).collect();
            println!(
                "Rolled back version{} {}.",
                if versions.len() == 1 { "" } else { "s" },
                list.join(", ")
            );
        }
        MigrationOutcome::NoChange => println!("No change."),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn flags_override_config() {
        let mut config = MigrateConfig {
            dsn: Some("file.db".into()),
            ..Default::default()
        };
        let db = DbArgs {
            dsn: Some("flag.db".into()),
            dir: Some(PathBuf::from("sql")),
            production: Some(false),
        };
        apply_overrides(&mut config, &db);

        assert_eq!(config.dsn.as_deref(), Some("flag.db"));
        assert_eq!(config.dir, PathBuf::from("sql"));
        assert!(!config.production);
    }

    #[test]
    fn absent_flags_keep_config() {
        let mut config = MigrateConfig {
            dsn: Some("file.db".into()),
            ..Default::default()
        };
        apply_overrides(&mut config, &DbArgs::default());

        assert_eq!(config.dsn.as_deref(), Some("file.db"));
        assert!(config.production);
    }

    #[test]
    fn non_production_needs_no_confirmation() {
        let config = MigrateConfig {
            production: false,
            ..Default::default()
        };
        assert!(confirmed(&config, "migrate the database").unwrap());
    }
}
