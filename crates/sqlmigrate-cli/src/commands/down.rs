use anyhow::Result;
use sqlmigrate_config::RollbackMode;

use crate::cli::{DownArgs, GlobalArgs};

pub fn execute(args: &DownArgs, global: &GlobalArgs) -> Result<()> {
    let config = super::load_config(global, &args.db)?;
    let mode = if args.all {
        RollbackMode::All
    } else {
        config.rollback
    };

    let action = match mode {
        RollbackMode::One => "roll back the last migration",
        RollbackMode::All => "roll back ALL migrations",
    };
    if !super::confirmed(&config, action)? {
        return Ok(());
    }

    let mut migrator = super::open(&config)?.with_rollback_mode(mode);
    let outcome = migrator.rollback()?;
    super::report(&outcome);
    Ok(())
}
