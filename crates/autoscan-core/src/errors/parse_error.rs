//! Parser errors. Recorded against the offending file, never fatal.

use std::path::PathBuf;

use super::error_code::{self, AutoscanErrorCode};

/// Errors that can occur while turning file bytes into a syntax tree.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid UTF-8 in {path} at byte {offset}")]
    InvalidEncoding { path: PathBuf, offset: usize },

    #[error("Syntax error in {path} at line {line}, column {column} ({error_count} error nodes)")]
    Syntax {
        path: PathBuf,
        line: u32,
        column: u32,
        error_count: u32,
    },

    #[error("Tree-sitter error parsing {path}: {message}")]
    TreeSitterError { path: PathBuf, message: String },
}

impl AutoscanErrorCode for ParseError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidEncoding { .. } => error_code::ENCODING_ERROR,
            _ => error_code::PARSE_ERROR,
        }
    }
}
