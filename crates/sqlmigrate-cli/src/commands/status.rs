use anyhow::{Context, Result};

use crate::cli::{GlobalArgs, StatusArgs};
use crate::report::print_status;

pub fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let config = super::load_config(global, &args.db)?;
    let migrator = super::open(&config)?;
    let status = migrator.status()?;

    if args.json {
        let json = serde_json::to_string_pretty(&status).context("failed to serialize status")?;
        println!("{json}");
    } else {
        print_status(&status, &config);
    }
    Ok(())
}
