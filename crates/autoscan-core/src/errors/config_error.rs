//! Configuration errors. These are the only errors raised before scanning starts.

use std::path::PathBuf;

use super::error_code::{self, AutoscanErrorCode};

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Config parse error in {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Config validation failed for {field}: {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Invalid config value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Base path does not exist or is not a directory: {path}")]
    BasePathNotFound { path: PathBuf },

    #[error("Invalid glob pattern {pattern:?}: {message}")]
    InvalidGlob { pattern: String, message: String },
}

impl AutoscanErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidGlob { .. } => error_code::INVALID_GLOB,
            _ => error_code::CONFIG_ERROR,
        }
    }
}
