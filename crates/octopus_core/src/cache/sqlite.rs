//! SQLite-backed cache store over the `cache_entries` table.

use super::{CacheResult, CacheStore};
use rusqlite::{params, Connection, OptionalExtension};

/// `CacheStore` persisted in the on-device cache database.
///
/// The connection must come from [`crate::db::open_db`] or
/// [`crate::db::open_db_in_memory`] so the table exists.
pub struct SqliteCacheStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCacheStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CacheStore for SqliteCacheStore<'_> {
    fn read(&self, key: &str) -> CacheResult<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM cache_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn write(&self, key: &str, payload: &str) -> CacheResult<()> {
        self.conn.execute(
            "INSERT INTO cache_entries (key, payload, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at;",
            params![key, payload],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        self.conn
            .execute("DELETE FROM cache_entries WHERE key = ?1;", [key])?;
        Ok(())
    }
}
