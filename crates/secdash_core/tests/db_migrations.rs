use rusqlite::Connection;
use secdash_core::db::migrations::latest_version;
use secdash_core::db::{open_db, open_db_in_memory, DbError};
use secdash_core::{KeyValueStore, SqliteKeyValueStore};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "kv_entries");
}

#[test]
fn opening_same_database_twice_is_idempotent_and_keeps_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("secdash.db");

    let store = SqliteKeyValueStore::open(&path).unwrap();
    store.set("accounts", r#"[{"name":"A","email":"a@b.com","profileImgUrl":""}]"#)
        .unwrap();
    drop(store);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    drop(conn);

    let reopened = SqliteKeyValueStore::open(&path).unwrap();
    assert!(reopened.get("accounts").unwrap().unwrap().contains("a@b.com"));
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
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
