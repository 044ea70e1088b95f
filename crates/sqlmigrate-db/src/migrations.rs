use std::fmt;

use serde::Serialize;

/// Separator written by `create` and expected between version and name.
pub const SEPARATOR: &str = "__";

/// Single-underscore separator still accepted when reading older directories.
pub const LEGACY_SEPARATOR: &str = "_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }

    /// File suffix including the leading dot, e.g. `.up.sql`.
    pub fn suffix(self) -> &'static str {
        match self {
            Direction::Up => ".up.sql",
            Direction::Down => ".down.sql",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One direction of one migration version, as found on disk.
///
/// File names look like `003__add_users.up.sql`. Scripts are read-only: the
/// engine executes them but never rewrites them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationScript {
    pub version: i64,
    pub name: String,
    pub direction: Direction,
    pub file_name: String,
}

impl MigrationScript {
    /// Parse `{version}{sep}{name}.{up|down}.sql`. Anything else yields `None`
    /// and is skipped by the resolver rather than reported.
    pub fn parse(file_name: &str) -> Option<Self> {
        let (stem, direction) = if let Some(stem) = file_name.strip_suffix(Direction::Up.suffix()) {
            (stem, Direction::Up)
        } else if let Some(stem) = file_name.strip_suffix(Direction::Down.suffix()) {
            (stem, Direction::Down)
        } else {
            return None;
        };

        let digits_end = stem
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(stem.len());
        if digits_end == 0 {
            return None;
        }
        let version: i64 = stem[..digits_end].parse().ok()?;

        let rest = &stem[digits_end..];
        let name = rest
            .strip_prefix(SEPARATOR)
            .or_else(|| rest.strip_prefix(LEGACY_SEPARATOR))?;
        if name.is_empty() {
            return None;
        }

        Some(Self {
            version,
            name: name.to_string(),
            direction,
            file_name: file_name.to_string(),
        })
    }
}

/// Canonical file name for a version/name/direction triple.
pub fn file_name(version: i64, name: &str, direction: Direction) -> String {
    format!("{version:03}{SEPARATOR}{name}{}", direction.suffix())
}
