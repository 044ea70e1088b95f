use std::io::IsTerminal;

use anyhow::{Context, Result, bail};
use dialoguer::Confirm;

/// Ask a yes/no question before a production run. Without a terminal there is
/// nobody to ask, so the run is refused rather than assumed.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !std::io::stdin().is_terminal() {
        bail!(
            "production mode requires interactive confirmation; \
             rerun with --production=false to skip it"
        );
    }

    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("confirmation cancelled")
}

/// The question asked before each destructive command.
pub fn prompt_for(action: &str) -> String {
    format!("Do you really want to {action} in production mode?")
}
