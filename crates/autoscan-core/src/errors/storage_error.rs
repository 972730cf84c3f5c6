//! Cache store errors. The scan degrades to a cold cache on any of these.

use super::error_code::{self, AutoscanErrorCode};

/// Storage-layer errors for SQLite operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("database corruption detected: {details}")]
    CorruptionDetected { details: String },

    #[error("cache record for {path} could not be serialized: {message}")]
    Serialization { path: String, message: String },
}

impl StorageError {
    /// Wrap a rusqlite-style error message.
    pub fn sqlite(message: impl std::fmt::Display) -> Self {
        Self::SqliteError {
            message: message.to_string(),
        }
    }
}

impl AutoscanErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            Self::CorruptionDetected { .. } => error_code::DB_CORRUPT,
            _ => error_code::STORAGE_ERROR,
        }
    }
}
