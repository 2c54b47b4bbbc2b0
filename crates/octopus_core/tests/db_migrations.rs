use octopus_core::db::migrations::latest_version;
use octopus_core::db::{open_db, open_db_in_memory, DbError};
use octopus_core::{CacheStore, SqliteCacheStore};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "cache_entries");
}

#[test]
fn cache_entries_is_keyed_by_cache_key() {
    let conn = open_db_in_memory().unwrap();

    let mut stmt = conn
        .prepare(
            "SELECT name, type, \"notnull\", pk FROM pragma_table_info('cache_entries') ORDER BY cid;",
        )
        .unwrap();
    let columns = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)? == 1,
                row.get::<_, i64>(3)? == 1,
            ))
        })
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(
        columns,
        vec![
            ("key".to_string(), "TEXT".to_string(), true, true),
            ("payload".to_string(), "TEXT".to_string(), true, false),
            ("updated_at".to_string(), "INTEGER".to_string(), true, false),
        ]
    );

    let duplicate = conn.execute(
        "INSERT INTO cache_entries (key, payload) VALUES ('events', '[]'), ('events', '[1]');",
        [],
    );
    assert!(duplicate.is_err());
}

#[test]
fn cache_writes_upsert_one_row_per_key() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteCacheStore::new(&conn);

    store.write("calendar_events", "[]").unwrap();
    store.write("calendar_events", r#"[{"id":"a"}]"#).unwrap();
    store.write("diagnostic_last", "{}").unwrap();

    let rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM cache_entries WHERE key = 'calendar_events';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(rows, 1);
    assert_eq!(
        store.read("calendar_events").unwrap().as_deref(),
        Some(r#"[{"id":"a"}]"#)
    );
    let updated_at: i64 = conn
        .query_row(
            "SELECT updated_at FROM cache_entries WHERE key = 'diagnostic_last';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert!(updated_at > 0);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("octopus.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "cache_entries");
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
