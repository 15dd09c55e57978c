//! Raw key-value operations over the `kv_entries` and `counters` tables.
//!
//! These are free functions over a [`Connection`] so they can run either on a
//! bare connection or inside a [`rusqlite::Transaction`]. [`Database`] exposes
//! the same operations as methods.

use academy_shared::constants::counters;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::database::Database;
use crate::error::{Result, StoreError};

/// One stored value together with its bookkeeping columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub key: String,
    pub value: String,
    pub schema_version: u32,
    pub revision: i64,
    pub updated_at: DateTime<Utc>,
}

pub fn read_entry(conn: &Connection, key: &str) -> Result<Option<StoredEntry>> {
    conn.query_row(
        "SELECT key, value, schema_version, revision, updated_at
         FROM kv_entries
         WHERE key = ?1",
        params![key],
        row_to_entry,
    )
    .optional()
    .map_err(StoreError::Sqlite)
}

/// Insert or replace the value under `key`, enforcing the total `quota`.
///
/// Returns the revision assigned to the write.
pub fn write_entry(
    conn: &Connection,
    key: &str,
    value: &str,
    schema_version: u32,
    quota: usize,
) -> Result<i64> {
    let others: i64 = conn.query_row(
        "SELECT COALESCE(SUM(LENGTH(CAST(value AS BLOB))), 0)
         FROM kv_entries
         WHERE key != ?1",
        params![key],
        |row| row.get(0),
    )?;
    let needed = others as usize + value.len();
    if needed > quota {
        return Err(StoreError::QuotaExceeded {
            key: key.to_string(),
            needed,
            quota,
        });
    }

    let revision = next_counter(conn, counters::REVISION, 1)?;

    conn.execute(
        "INSERT INTO kv_entries (key, value, schema_version, revision, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            schema_version = excluded.schema_version,
            revision = excluded.revision,
            updated_at = excluded.updated_at",
        params![key, value, schema_version, revision, Utc::now().to_rfc3339()],
    )?;

    Ok(revision)
}

pub fn remove_entry(conn: &Connection, key: &str) -> Result<bool> {
    let affected = conn.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
    Ok(affected > 0)
}

pub fn list_keys(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT key FROM kv_entries ORDER BY key ASC")?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    rows.collect::<std::result::Result<Vec<String>, _>>()
        .map_err(StoreError::Sqlite)
}

pub fn list_entries(conn: &Connection) -> Result<Vec<StoredEntry>> {
    let mut stmt = conn.prepare(
        "SELECT key, value, schema_version, revision, updated_at
         FROM kv_entries
         ORDER BY key ASC",
    )?;
    let rows = stmt.query_map([], row_to_entry)?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}

/// Total bytes of stored values.
pub fn used_bytes(conn: &Connection) -> Result<usize> {
    let used: i64 = conn.query_row(
        "SELECT COALESCE(SUM(LENGTH(CAST(value AS BLOB))), 0) FROM kv_entries",
        [],
        |row| row.get(0),
    )?;
    Ok(used as usize)
}

/// Atomically advance the counter `name` and return its new value.
///
/// The result is at least `floor` and strictly greater than any value the
/// counter returned before.
pub fn next_counter(conn: &Connection, name: &str, floor: i64) -> Result<i64> {
    let value = conn.query_row(
        "INSERT INTO counters (name, value) VALUES (?1, ?2)
         ON CONFLICT(name) DO UPDATE SET value = MAX(value + 1, ?2)
         RETURNING value",
        params![name, floor.max(1)],
        |row| row.get(0),
    )?;
    Ok(value)
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredEntry> {
    let key: String = row.get(0)?;
    let value: String = row.get(1)?;
    let schema_version: u32 = row.get(2)?;
    let revision: i64 = row.get(3)?;
    let updated_str: String = row.get(4)?;

    let updated_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&updated_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(StoredEntry {
        key,
        value,
        schema_version,
        revision,
        updated_at,
    })
}

impl Database {
    pub fn get_entry(&self, key: &str) -> Result<Option<StoredEntry>> {
        read_entry(self.conn(), key)
    }

    pub fn put_entry(
        &self,
        key: &str,
        value: &str,
        schema_version: u32,
        quota: usize,
    ) -> Result<i64> {
        write_entry(self.conn(), key, value, schema_version, quota)
    }

    pub fn delete_entry(&self, key: &str) -> Result<bool> {
        remove_entry(self.conn(), key)
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        list_keys(self.conn())
    }

    pub fn next_counter(&self, name: &str, floor: i64) -> Result<i64> {
        next_counter(self.conn(), name, floor)
    }
}
