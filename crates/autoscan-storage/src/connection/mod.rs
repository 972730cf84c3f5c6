//! Cache store connection.
//!
//! A scan is single-writer: the orchestrator reads the whole store once at
//! startup and writes once after all workers join. One connection suffices.

pub mod pragmas;

use std::path::{Path, PathBuf};

use autoscan_core::errors::StorageError;
use rusqlite::{Connection, ErrorCode};

use self::pragmas::{apply_pragmas, quick_check};
use crate::migrations;

/// An open cache store.
pub struct CacheDatabase {
    conn: Connection,
    path: Option<PathBuf>,
}

impl CacheDatabase {
    /// Open (or create) the store at `path`, check integrity, apply pragmas
    /// and pending migrations.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(sqlite_error)?;
        quick_check(&conn)?;
        apply_pragmas(&conn)?;
        migrations::run_migrations(&conn)?;

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(sqlite_error)?;
        apply_pragmas(&conn)?;
        migrations::run_migrations(&conn)?;

        Ok(Self { conn, path: None })
    }

    /// Borrow the connection for read queries.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Borrow the connection mutably, needed to open transactions.
    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Fold the WAL back into the main file.
    pub fn checkpoint(&self) -> Result<(), StorageError> {
        if self.path.is_none() {
            return Ok(());
        }
        self.conn
            .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            .map_err(sqlite_error)
    }

    /// The store file path (None for in-memory).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Map a rusqlite error, separating corruption from ordinary failures.
pub(crate) fn sqlite_error(e: rusqlite::Error) -> StorageError {
    match e.sqlite_error_code() {
        Some(ErrorCode::NotADatabase) | Some(ErrorCode::DatabaseCorrupt) => {
            StorageError::CorruptionDetected {
                details: e.to_string(),
            }
        }
        _ => StorageError::sqlite(e),
    }
}
