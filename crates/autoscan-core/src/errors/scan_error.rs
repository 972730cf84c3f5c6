//! Walk and worker errors. None of these abort a scan on their own.

use std::path::PathBuf;

use super::error_code::{self, AutoscanErrorCode};

/// Errors that can occur while enumerating and scanning files.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("IO error scanning {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Symlink cycle at {path}")]
    SymlinkLoop { path: PathBuf },

    #[error("File too large: {path} ({size} bytes, max {max})")]
    MaxFileSizeExceeded { path: PathBuf, size: u64, max: u64 },

    #[error("Worker for chunk {chunk} failed: {message}")]
    WorkerFailed { chunk: usize, message: String },

    #[error("Scan cancelled")]
    Cancelled,
}

impl ScanError {
    /// Classify an IO error against the path it occurred on.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied { path }
        } else {
            Self::IoError { path, source }
        }
    }
}

impl AutoscanErrorCode for ScanError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Cancelled => error_code::CANCELLED,
            Self::WorkerFailed { .. } => error_code::WORKER_ERROR,
            _ => error_code::WALK_ERROR,
        }
    }
}
