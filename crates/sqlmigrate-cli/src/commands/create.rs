use anyhow::{Context, Result};
use sqlmigrate_db::create_pair;

use crate::cli::{CreateArgs, GlobalArgs};

pub fn execute(args: &CreateArgs, global: &GlobalArgs) -> Result<()> {
    let config = super::load_base_config(global)?;
    let dir = args.dir.clone().unwrap_or(config.dir);

    let pair = create_pair(&dir, &args.name)
        .with_context(|| format!("failed to create migration in {}", dir.display()))?;

    println!("Created migration {:03} ({}):", pair.version, pair.name);
    println!("  {}", pair.up.display());
    println!("  {}", pair.down.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_pair_in_configured_directory() {
        let root = tempfile::tempdir().unwrap();
        let migrations = root.path().join("m");
        let config_path = root.path().join("sqlmigrate.yml");
        std::fs::write(&config_path, format!("dir: {}\n", migrations.display())).unwrap();

        let global = GlobalArgs {
            config: Some(config_path),
            verbose: false,
            log_json: false,
        };
        let args = CreateArgs {
            name: "Create Users".into(),
            dir: None,
        };
        execute(&args, &global).unwrap();

        assert!(migrations.join("001__create_users.up.sql").is_file());
        assert!(migrations.join("001__create_users.down.sql").is_file());
    }
}
