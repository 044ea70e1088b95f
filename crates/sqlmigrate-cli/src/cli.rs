use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "sqlmigrate",
    version,
    about = "Apply and roll back versioned SQL migration files"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Config file (YAML or TOML). Defaults to ./sqlmigrate.{yml,yaml,toml}
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply all pending migrations
    Up(DbArgs),
    /// Roll back the last migration (or all of them with --all)
    Down(DownArgs),
    /// Create a new pair of up/down migration files
    Create(CreateArgs),
    /// Show applied and pending migrations
    Status(StatusArgs),
    /// Empty the migration ledger without touching the schema
    Clean(DbArgs),
    /// Forget a dirty version so it is attempted again by `up`
    ClearDirty(ClearDirtyArgs),
}

#[derive(Args, Debug, Default)]
pub struct DbArgs {
    /// Database source, e.g. `app.db` or `sqlite://data/app.db`
    #[arg(long, env = "SQLMIGRATE_DSN")]
    pub dsn: Option<String>,

    /// Migration files folder
    #[arg(long, env = "SQLMIGRATE_DIR")]
    pub dir: Option<PathBuf>,

    /// Ask for confirmation before changing the database (default true)
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub production: Option<bool>,
}

#[derive(Args, Debug)]
pub struct DownArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// Roll back every applied version instead of only the last one
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Migration name, stored in snake_case
    #[arg(long)]
    pub name: String,

    /// Migration files folder
    #[arg(long, env = "SQLMIGRATE_DIR")]
    pub dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// Print the status as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ClearDirtyArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// The dirty version to clear
    pub version: i64,
}
