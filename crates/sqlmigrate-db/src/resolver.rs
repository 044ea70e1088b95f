//! Decides which migration files apply, and in what order.
//!
//! [`resolve`] is pure: it takes the directory listing as data so ordering
//! and filtering can be tested without a database or a filesystem.

use std::path::Path;

use sqlmigrate_common::{Error, Result};
use tracing::debug;

use crate::migrations::{Direction, MigrationScript};

/// Select and order the scripts for `direction` relative to `last_version`.
///
/// `Up` keeps versions strictly greater than the last applied one (all of them
/// when nothing was applied) in ascending version order. `Down` keeps
/// versions at or below it in descending order. Prefix width does not matter:
/// `10_` sorts after `2_`, and `1000__` after `999__`.
pub fn resolve<S: AsRef<str>>(
    direction: Direction,
    last_version: Option<i64>,
    file_names: &[S],
) -> Vec<MigrationScript> {
    let last = last_version.unwrap_or(0);

    let mut scripts: Vec<MigrationScript> = file_names
        .iter()
        .filter_map(|name| {
            let parsed = MigrationScript::parse(name.as_ref());
            if parsed.is_none() {
                debug!("skipping {}: not a migration file name", name.as_ref());
            }
            parsed
        })
        .filter(|s| s.direction == direction)
        .filter(|s| match direction {
            Direction::Up => last == 0 || s.version > last,
            Direction::Down => last > 0 && s.version <= last,
        })
        .collect();

    match direction {
        Direction::Up => scripts.sort_by(|a, b| {
            (a.version, &a.file_name).cmp(&(b.version, &b.file_name))
        }),
        Direction::Down => scripts.sort_by(|a, b| {
            (b.version, &b.file_name).cmp(&(a.version, &a.file_name))
        }),
    }
    scripts
}

/// Names of the regular files directly inside `dir`. Subdirectories are ignored.
pub fn list_migration_files(dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read migration directory {}: {e}", dir.display()),
        ))
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => debug!("skipping non UTF-8 file name {raw:?}"),
        }
    }
    Ok(names)
}

/// Read the SQL text of `script` from `dir`.
pub fn read_script(dir: &Path, script: &MigrationScript) -> Result<String> {
    let path = dir.join(&script.file_name);
    std::fs::read_to_string(&path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read {}: {e}", path.display()),
        ))
    })
}

/// Highest version among parseable files in either direction.
pub fn max_version<S: AsRef<str>>(file_names: &[S]) -> Option<i64> {
    file_names
        .iter()
        .filter_map(|name| MigrationScript::parse(name.as_ref()))
        .map(|s| s.version)
        .max()
}
