//! v001 -- Initial schema creation.
//!
//! Creates the `kv_entries` table holding one JSON (or raw string) value per
//! storage key.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS kv_entries (
    key            TEXT PRIMARY KEY NOT NULL,
    value          TEXT NOT NULL,              -- JSON document or raw string
    schema_version INTEGER NOT NULL DEFAULT 0, -- 0 = untagged
    revision       INTEGER NOT NULL,           -- global write sequence
    updated_at     TEXT NOT NULL               -- RFC-3339
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
