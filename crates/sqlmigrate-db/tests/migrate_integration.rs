use std::path::Path;

use sqlmigrate_common::Error;
use sqlmigrate_config::{MigrateConfig, RollbackMode};
use sqlmigrate_db::{Ledger, MigrationOutcome, Migrator, create_pair, open_dsn};

/// Build a config pointing at an on-disk database inside `root`.
fn config(root: &Path) -> MigrateConfig {
    MigrateConfig {
        dsn: Some(format!("sqlite://{}", root.join("app.db").display())),
        dir: root.join("migrations"),
        table: "schema_migrations".to_string(),
        rollback: RollbackMode::One,
        production: false,
    }
}

/// Scaffold a pair and fill in its SQL.
fn add_pair(dir: &Path, name: &str, up: &str, down: &str) {
    let pair = create_pair(dir, name).expect("create pair");
    std::fs::write(&pair.up, up).unwrap();
    std::fs::write(&pair.down, down).unwrap();
}

fn count_rows(dsn: &str, table: &str) -> i64 {
    let conn = open_dsn(dsn).unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn ledger_survives_reopening_the_database() {
    let root = tempfile::tempdir().unwrap();
    let cfg = config(root.path());
    add_pair(
        &cfg.dir,
        "create users",
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL);",
        "DROP TABLE users;",
    );
    add_pair(
        &cfg.dir,
        "add email",
        "ALTER TABLE users ADD COLUMN email TEXT;",
        "ALTER TABLE users DROP COLUMN email;",
    );

    {
        let mut m = Migrator::open(&cfg).unwrap();
        assert_eq!(m.migrate().unwrap(), MigrationOutcome::Applied(vec![1, 2]));
    }

    let mut m = Migrator::open(&cfg).unwrap();
    assert_eq!(m.last_version().unwrap().unwrap().version, 2);
    assert_eq!(m.migrate().unwrap(), MigrationOutcome::NoChange);
    assert_eq!(count_rows(cfg.dsn().unwrap(), "schema_migrations"), 2);

    assert_eq!(m.rollback().unwrap(), MigrationOutcome::RolledBack(vec![2]));
    assert_eq!(m.last_version().unwrap().unwrap().version, 1);
}

#[test]
fn second_engine_sees_work_done_by_the_first() {
    let root = tempfile::tempdir().unwrap();
    let cfg = config(root.path());
    add_pair(&cfg.dir, "init", "CREATE TABLE a (id INTEGER);", "DROP TABLE a;");

    let mut first = Migrator::open(&cfg).unwrap();
    let mut second = Migrator::open(&cfg).unwrap();

    assert_eq!(first.migrate().unwrap(), MigrationOutcome::Applied(vec![1]));
    assert_eq!(second.migrate().unwrap(), MigrationOutcome::NoChange);
}

#[test]
fn racing_insert_of_the_same_version_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let cfg = config(root.path());
    add_pair(&cfg.dir, "init", "CREATE TABLE a (id INTEGER);", "DROP TABLE a;");

    let mut m = Migrator::open(&cfg).unwrap();
    m.migrate().unwrap();

    let conn = open_dsn(cfg.dsn().unwrap()).unwrap();
    let ledger = Ledger::new(&cfg.table).unwrap();
    let err = ledger.record_version(&conn, 1, false).unwrap_err();
    assert!(matches!(err, Error::DuplicateVersion { version: 1 }));
}

#[test]
fn failed_apply_is_visible_to_a_fresh_process() {
    let root = tempfile::tempdir().unwrap();
    let cfg = config(root.path());
    add_pair(&cfg.dir, "init", "CREATE TABLE a (id INTEGER);", "DROP TABLE a;");
    add_pair(&cfg.dir, "broken", "ALTER TABLE missing ADD COLUMN x;", "");

    {
        let mut m = Migrator::open(&cfg).unwrap();
        let err = m.migrate().unwrap_err();
        assert!(err.to_string().starts_with("002__broken.up.sql: "));
    }

    let mut m = Migrator::open(&cfg).unwrap();
    assert!(matches!(m.migrate(), Err(Error::DirtyLedger { version: 2 })));
    assert!(matches!(m.rollback(), Err(Error::DirtyLedger { version: 2 })));

    let status = m.status().unwrap();
    assert_eq!(status.dirty, Some(2));
    assert_eq!(status.applied.len(), 1);
}

#[test]
fn rollback_all_mode_from_config() {
    let root = tempfile::tempdir().unwrap();
    let mut cfg = config(root.path());
    cfg.rollback = RollbackMode::All;
    add_pair(&cfg.dir, "a", "CREATE TABLE a (id INTEGER);", "DROP TABLE a;");
    add_pair(&cfg.dir, "b", "CREATE TABLE b (id INTEGER);", "DROP TABLE b;");

    let mut m = Migrator::open(&cfg).unwrap();
    m.migrate().unwrap();
    assert_eq!(m.rollback().unwrap(), MigrationOutcome::RolledBack(vec![2, 1]));
    assert!(m.versions().unwrap().is_empty());
}

#[test]
fn open_rejects_missing_dsn_and_bad_table() {
    let root = tempfile::tempdir().unwrap();
    let mut cfg = config(root.path());
    cfg.dsn = None;
    assert!(matches!(Migrator::open(&cfg), Err(Error::Config(_))));

    let mut cfg = config(root.path());
    cfg.table = "drop table x".to_string();
    assert!(matches!(Migrator::open(&cfg), Err(Error::Config(_))));
}
