//! cache_meta queries: string settings keyed by name.

use autoscan_core::errors::StorageError;
use rusqlite::{params, Connection, OptionalExtension};

use crate::connection::sqlite_error;

/// Key under which the detector profile of the stored rows is recorded.
pub const PROFILE_KEY: &str = "detector_profile";

/// Read a setting.
pub fn get(conn: &Connection, key: &str) -> Result<Option<String>, StorageError> {
    conn.query_row(
        "SELECT value FROM cache_meta WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .map_err(sqlite_error)
}

/// Insert or replace a setting.
pub fn set(conn: &Connection, key: &str, value: &str) -> Result<(), StorageError> {
    conn.execute(
        "INSERT OR REPLACE INTO cache_meta (key, value) VALUES (?1, ?2)",
        params![key, value],
    )
    .map_err(sqlite_error)?;
    Ok(())
}
