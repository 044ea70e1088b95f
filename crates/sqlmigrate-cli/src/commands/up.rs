use anyhow::Result;

use crate::cli::{DbArgs, GlobalArgs};

pub fn execute(args: &DbArgs, global: &GlobalArgs) -> Result<()> {
    let config = super::load_config(global, args)?;
    if !super::confirmed(&config, "migrate the database")? {
        return Ok(());
    }

    let mut migrator = super::open(&config)?;
    let outcome = migrator.migrate()?;
    super::report(&outcome);
    Ok(())
}
