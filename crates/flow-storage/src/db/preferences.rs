//! Preference table operations

use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

/// Read a single value
pub fn get_value(conn: &Connection, namespace: &str, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM preferences WHERE namespace = ?1 AND key = ?2",
            params![namespace, key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

/// Insert or replace a single value
pub fn put_value(conn: &Connection, namespace: &str, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO preferences (namespace, key, value, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(namespace, key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at",
        params![namespace, key, value, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

/// Delete a value, returning whether a row was removed
pub fn delete_value(conn: &Connection, namespace: &str, key: &str) -> Result<bool> {
    let removed = conn.execute(
        "DELETE FROM preferences WHERE namespace = ?1 AND key = ?2",
        params![namespace, key],
    )?;
    Ok(removed > 0)
}

/// All values in a namespace ordered by key
pub fn list_values(conn: &Connection, namespace: &str) -> Result<Vec<(String, String)>> {
    let mut stmt =
        conn.prepare("SELECT key, value FROM preferences WHERE namespace = ?1 ORDER BY key")?;
    let rows = stmt
        .query_map(params![namespace], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
