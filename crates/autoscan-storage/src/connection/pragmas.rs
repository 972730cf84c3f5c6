//! PRAGMA configuration applied to the cache connection.
//!
//! WAL mode, NORMAL sync, 5s busy_timeout, temp_store MEMORY.

use autoscan_core::errors::StorageError;
use rusqlite::Connection;

use super::sqlite_error;

/// Apply performance and safety pragmas to a connection.
pub fn apply_pragmas(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        PRAGMA temp_store = MEMORY;
        ",
    )
    .map_err(sqlite_error)
}

/// Verify that WAL mode is active.
pub fn verify_wal_mode(conn: &Connection) -> Result<bool, StorageError> {
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .map_err(sqlite_error)?;
    Ok(mode.eq_ignore_ascii_case("wal"))
}

/// Fail with `CorruptionDetected` unless SQLite's quick check passes.
pub fn quick_check(conn: &Connection) -> Result<(), StorageError> {
    let verdict: String = conn
        .pragma_query_value(None, "quick_check", |row| row.get(0))
        .map_err(sqlite_error)?;
    if verdict.eq_ignore_ascii_case("ok") {
        Ok(())
    } else {
        Err(StorageError::CorruptionDetected { details: verdict })
    }
}
