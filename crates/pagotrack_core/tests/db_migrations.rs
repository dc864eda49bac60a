use pagotrack_core::db::{migrations, open_db, open_db_in_memory, DbError};
use pagotrack_core::{RepoError, SqliteSlipRepository};

#[test]
fn fresh_database_lands_on_the_latest_version() {
    let conn = open_db_in_memory().unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, migrations::latest_version());

    // All domain tables exist after bootstrap.
    for table in ["departments", "reviewers", "error_catalog", "cases", "slips"] {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1;",
                [table],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1, "missing table {table}");
    }
}

#[test]
fn reapplying_migrations_is_a_no_op() {
    let mut conn = open_db_in_memory().unwrap();
    migrations::apply_migrations(&mut conn).unwrap();

    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, migrations::latest_version());
}

#[test]
fn future_schema_version_is_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute_batch("PRAGMA user_version = 9999;").unwrap();

    let err = migrations::apply_migrations(&mut conn).unwrap_err();
    assert!(matches!(
        err,
        DbError::UnsupportedSchemaVersion {
            db_version: 9999,
            ..
        }
    ));
}

#[test]
fn open_db_bootstraps_a_file_backed_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pagotrack.db");

    let conn = open_db(&path).unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, migrations::latest_version());
    drop(conn);

    // Reopening an already migrated file succeeds without changes.
    let conn = open_db(&path).unwrap();
    let foreign_keys: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(foreign_keys, 1);
}

#[test]
fn repository_rejects_an_unmigrated_connection() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();

    let err = SqliteSlipRepository::try_new(&conn).unwrap_err();
    assert!(matches!(
        err,
        RepoError::UninitializedConnection {
            expected_version: _,
            actual_version: 0,
        }
    ));
}

#[test]
fn repository_requires_the_slips_table() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    let pragma = format!("PRAGMA user_version = {};", migrations::latest_version());
    conn.execute_batch(&pragma).unwrap();

    let err = SqliteSlipRepository::try_new(&conn).unwrap_err();
    assert!(matches!(err, RepoError::MissingRequiredTable("slips")));
}
