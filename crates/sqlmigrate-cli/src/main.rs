//! sqlmigrate - apply and roll back versioned SQL migration files.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod confirm;
mod report;

use cli::{Cli, Commands, GlobalArgs};
use commands::{create, down, ledger, status, up};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.global);

    match &cli.command {
        Commands::Up(args) => up::execute(args, &cli.global),
        Commands::Down(args) => down::execute(args, &cli.global),
        Commands::Create(args) => create::execute(args, &cli.global),
        Commands::Status(args) => status::execute(args, &cli.global),
        Commands::Clean(args) => ledger::clean(args, &cli.global),
        Commands::ClearDirty(args) => ledger::clear_dirty(args, &cli.global),
    }
}

/// Logs go to stderr so command output on stdout stays clean.
/// `RUST_LOG` wins over `--verbose`.
fn init_tracing(global: &GlobalArgs) {
    let default_level = if global.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if global.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}
