use std::path::Path;

use rusqlite::Connection;
use sqlmigrate_common::{Error, Result};
use tracing::info;

/// Open the SQLite database named by `dsn`.
///
/// Accepts a plain path, `:memory:`, or `sqlite://`, `sqlite:` and `file:`
/// URLs. Other schemes are rejected since only the SQLite driver is built in.
pub fn open_dsn(dsn: &str) -> Result<Connection> {
    let target = parse_dsn(dsn)?;

    let conn = match target {
        DsnTarget::Memory => Connection::open_in_memory()
            .map_err(|e| Error::Database(format!("failed to open in-memory database: {e}")))?,
        DsnTarget::Path(path) => {
            info!("opening database at {path}");
            Connection::open(Path::new(path))
                .map_err(|e| Error::Database(format!("failed to open database {path}: {e}")))?
        }
    };

    conn.execute_batch("PRAGMA foreign_keys=ON; PRAGMA busy_timeout=5000;")
        .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

    Ok(conn)
}

#[derive(Debug, PartialEq, Eq)]
enum DsnTarget<'a> {
    Memory,
    Path(&'a str),
}

fn parse_dsn(dsn: &str) -> Result<DsnTarget<'_>> {
    let dsn = dsn.trim();
    let rest = ["sqlite://", "sqlite:", "file:"]
        .iter()
        .find_map(|prefix| dsn.strip_prefix(prefix))
        .unwrap_or(dsn);

    if rest.is_empty() {
        return Err(Error::Config("database source (dsn) required".into()));
    }
    if let Some((scheme, _)) = rest.split_once("://") {
        return Err(Error::Config(format!(
            "unsupported database driver {scheme:?}: only sqlite is available"
        )));
    }
    if rest == ":memory:" {
        return Ok(DsnTarget::Memory);
    }
    Ok(DsnTarget::Path(rest))
}
