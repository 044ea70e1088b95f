//! Creates new, empty migration pairs.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use sqlmigrate_common::{Error, Result};
use tracing::info;

use crate::migrations::{Direction, file_name};
use crate::resolver::{list_migration_files, max_version};

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("name pattern is valid"));

/// The two files written by [`create_pair`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPair {
    pub version: i64,
    pub name: String,
    pub up: PathBuf,
    pub down: PathBuf,
}

/// Write `{next}__{name}.up.sql` and `.down.sql` into `dir`, where `next` is
/// one past the highest version already present.
///
/// Fails with [`Error::AlreadyExists`] if either file is there already, and
/// never overwrites or removes a file it did not create.
pub fn create_pair(dir: &Path, name: &str) -> Result<MigrationPair> {
    let name = normalize_name(name)?;
    std::fs::create_dir_all(dir)?;

    let existing = list_migration_files(dir)?;
    let highest = max_version(&existing).unwrap_or(0);
    let version = highest.checked_add(1).ok_or_else(|| {
        Error::InvalidInput(format!(
            "no version left after {highest} in {}",
            dir.display()
        ))
    })?;

    let up = dir.join(file_name(version, &name, Direction::Up));
    let down = dir.join(file_name(version, &name, Direction::Down));
    for path in [&up, &down] {
        if path.exists() {
            return Err(Error::AlreadyExists(path.clone()));
        }
    }

    write_new(&up, &placeholder(&name, Direction::Up))?;
    if let Err(e) = write_new(&down, &placeholder(&name, Direction::Down)) {
        // Only the up file is ours to remove.
        let _ = std::fs::remove_file(&up);
        return Err(e);
    }

    info!("created migration {}", up.display());
    info!("created migration {}", down.display());
    Ok(MigrationPair {
        version,
        name,
        up,
        down,
    })
}

/// Lowercase snake_case. `"Add Users-Table"` becomes `add_users_table`.
pub fn normalize_name(name: &str) -> Result<String> {
    let lower = name.trim().to_lowercase();
    let snake = NON_WORD.replace_all(&lower, "_");
    let snake = snake.trim_matches('_');
    if snake.is_empty() {
        return Err(Error::InvalidInput(format!(
            "migration name {name:?} has no letters or digits"
        )));
    }
    Ok(snake.to_string())
}

fn placeholder(name: &str, direction: Direction) -> String {
    let what = match direction {
        Direction::Up => "forward",
        Direction::Down => "rollback",
    };
    format!("-- Migration: {name} ({direction})\n-- Write the {what} SQL statements below.\n")
}

fn write_new(path: &Path, contents: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => Error::AlreadyExists(path.to_path_buf()),
            _ => Error::Io(e),
        })?;
    file.write_all(contents.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_pair_in_empty_directory_is_version_one() {
        let dir = tempfile::tempdir().unwrap();
        let pair = create_pair(dir.path(), "init").unwrap();

        assert_eq!(pair.version, 1);
        assert!(pair.up.ends_with("001__init.up.sql"));
        assert!(pair.down.ends_with("001__init.down.sql"));
        let up = std::fs::read_to_string(&pair.up).unwrap();
        assert!(up.starts_with("-- Migration: init (up)"));
    }

    #[test]
    fn next_version_follows_highest_existing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("001__a.up.sql"), "").unwrap();
        std::fs::write(dir.path().join("002__x.up.sql"), "").unwrap();
        std::fs::write(dir.path().join("notes.md"), "").unwrap();

        let pair = create_pair(dir.path(), "Add Users").unwrap();
        assert_eq!(pair.version, 3);
        assert_eq!(pair.name, "add_users");
        assert!(dir.path().join("003__add_users.up.sql").is_file());
        assert!(dir.path().join("003__add_users.down.sql").is_file());
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("db").join("migrations");
        create_pair(&nested, "init").unwrap();
        assert!(nested.join("001__init.up.sql").is_file());
    }

    #[test]
    fn existing_target_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("001__a.up.sql"), "keep me").unwrap();
        // Directories are not listed, so the next version is still 2 and the
        // up target is taken.
        std::fs::create_dir(dir.path().join("002__dup.up.sql")).unwrap();

        let err = create_pair(dir.path(), "dup").unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(ref p) if p.ends_with("002__dup.up.sql")));
        assert!(!dir.path().join("002__dup.down.sql").exists());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("001__a.up.sql")).unwrap(),
            "keep me"
        );
    }

    #[test]
    fn write_new_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("001__a.up.sql");
        std::fs::write(&path, "original").unwrap();

        let err = write_new(&path, "replacement").unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn highest_possible_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(format!("{}__max.up.sql", i64::MAX)), "").unwrap();

        let err = create_pair(dir.path(), "after_max").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        let names = list_migration_files(dir.path()).unwrap();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn normalizes_names() {
        assert_eq!(normalize_name("create users").unwrap(), "create_users");
        assert_eq!(normalize_name("  Add--Index!! ").unwrap(), "add_index");
        assert_eq!(normalize_name("already_snake").unwrap(), "already_snake");
        assert!(matches!(normalize_name("---"), Err(Error::InvalidInput(_))));
        assert!(normalize_name("").is_err());
    }
}
