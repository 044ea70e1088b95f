//! Migration engine for versioned `.up.sql` / `.down.sql` file pairs.
//!
//! The [`Ledger`] records applied versions in the target database, the
//! [`resolver`] decides which files apply, and the [`Migrator`] runs them
//! inside transactions.

pub mod connection;
pub mod engine;
pub mod ledger;
pub mod migrations;
pub mod resolver;
pub mod scaffold;

pub use connection::open_dsn;
pub use engine::{MigrationOutcome, MigrationStatus, Migrator};
pub use ledger::{Ledger, VersionRecord};
pub use migrations::{Direction, MigrationScript};
pub use scaffold::{MigrationPair, create_pair};
