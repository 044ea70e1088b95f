use anyhow::Result;

use crate::cli::{ClearDirtyArgs, DbArgs, GlobalArgs};

pub fn clean(args: &DbArgs, global: &GlobalArgs) -> Result<()> {
    let config = super::load_config(global, args)?;
    if !super::confirmed(&config, "clear the migration ledger")? {
        return Ok(());
    }

    let migrator = super::open(&config)?;
    let removed = migrator.clean()?;
    println!("Removed {removed} ledger row(s) from {}.", migrator.ledger().table());
    Ok(())
}

pub fn clear_dirty(args: &ClearDirtyArgs, global: &GlobalArgs) -> Result<()> {
    let config = super::load_config(global, &args.db)?;
    let action = format!("clear dirty version {}", args.version);
    if !super::confirmed(&config, &action)? {
        return Ok(());
    }

    let migrator = super::open(&config)?;
    migrator.clear_dirty(args.version)?;
    println!(
        "Cleared dirty version {}. Run `sqlmigrate up` to apply it again.",
        args.version
    );
    Ok(())
}
