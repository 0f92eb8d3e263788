//! Database schema definitions

use rusqlite::{Connection, OptionalExtension};
use crate::{Error, Result};

/// Name of the tag table
pub const TAG_TABLE: &str = "alert_tag";

/// Name of the per-alert lookup index
pub const ALERT_ID_INDEX: &str = "alert_id_index";

/// SQL to create the alert_tag table
///
/// AUTOINCREMENT keeps tag ids from being reused after deletion.
/// UNIQUE(alert_id, key) is the conflict target of the upsert.
pub const CREATE_TAG_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS alert_tag (
    tag_id INTEGER PRIMARY KEY AUTOINCREMENT,
    alert_id INTEGER NOT NULL,
    key TEXT NOT NULL DEFAULT '' CHECK (length(key) <= 1024),
    value TEXT NOT NULL DEFAULT '' CHECK (length(value) <= 4000),
    UNIQUE(alert_id, key)
)
"#;

/// SQL to create the alert_id index
pub const CREATE_ALERT_ID_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS alert_id_index ON alert_tag(alert_id)";

/// Create the tag table and its index if they are missing.
///
/// Safe to call on every connect.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_TAG_TABLE, [])
        .map_err(|e| Error::Schema(format!("failed to create table {}: {}", TAG_TABLE, e)))?;

    conn.execute(CREATE_ALERT_ID_INDEX, [])
        .map_err(|e| Error::Schema(format!("failed to create index {}: {}", ALERT_ID_INDEX, e)))?;

    let table = has_table(conn, TAG_TABLE)?;
    let index = has_index(conn, ALERT_ID_INDEX)?;
    tracing::debug!(table, index, "alert tag schema ensured");
    Ok(())
}

/// Check whether a table exists
pub fn has_table(conn: &Connection, name: &str) -> Result<bool> {
    exists_in_master(conn, "table", name)
}

/// Check whether an index exists
pub fn has_index(conn: &Connection, name: &str) -> Result<bool> {
    exists_in_master(conn, "index", name)
}

fn exists_in_master(conn: &Connection, kind: &str, name: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = ?1 AND name = ?2",
            [kind, name],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| Error::Schema(format!("failed to inspect schema: {}", e)))?;
    Ok(found.is_some())
}
