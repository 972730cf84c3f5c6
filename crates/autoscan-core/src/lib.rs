//! autoscan-core: shared foundation for the autoscan model discovery engine.
//!
//! - Errors: one `thiserror` enum per subsystem
//! - Config: layered configuration (call site > pyproject.toml > YAML > defaults)
//! - Tracing: `tracing-subscriber` setup and structured field names
//! - Types: collection aliases used across the workspace
//! - Constants: defaults shared by the scanner, cache, and config layers

pub mod config;
pub mod constants;
pub mod errors;
pub mod tracing;
pub mod types;

pub use config::{AutoscanConfig, DetectorConfig, LogLevel, ScanConfiguration};
pub use errors::{ConfigError, ParseError, ScanError, StorageError, ValidationError};
