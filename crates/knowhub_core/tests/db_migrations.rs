use knowhub_core::db::migrations::latest_version;
use knowhub_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "persons");
    assert_table_exists(&conn, "documents");
    assert_table_exists(&conn, "knowledge_components");
    assert_table_exists(&conn, "validation_activities");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("knowhub.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "documents");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn new_documents_get_storage_defaults() {
    let conn = open_db_in_memory().unwrap();

    conn.execute(
        "INSERT INTO persons (uuid, email, display_name) VALUES ('p-1', 'a@b.example', 'A');",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO documents (uuid, title, uploader_uuid) VALUES ('d-1', 'T', 'p-1');",
        [],
    )
    .unwrap();

    let (status, version, views): (String, i64, i64) = conn
        .query_row(
            "SELECT status, version, view_count FROM documents WHERE uuid = 'd-1';",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(status, "DRAFT");
    assert_eq!(version, 1);
    assert_eq!(views, 0);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table `{table_name}` should exist");
}
