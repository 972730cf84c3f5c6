//! Tree-sitter parser subsystem: Python grammar, thread-local parser instances.

pub mod error_tolerant;
pub mod python;
pub mod types;

pub use python::{parse_python, ParsedSource};
pub use types::{Position, Range};
