//! Stable error codes attached to log records and scan issues.

/// Every error enum maps its variants to a stable code string.
pub trait AutoscanErrorCode {
    /// Returns the code string (e.g., "WALK_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const INVALID_GLOB: &str = "INVALID_GLOB";
pub const WALK_ERROR: &str = "WALK_ERROR";
pub const WORKER_ERROR: &str = "WORKER_ERROR";
pub const CANCELLED: &str = "CANCELLED";
pub const PARSE_ERROR: &str = "PARSE_ERROR";
pub const ENCODING_ERROR: &str = "ENCODING_ERROR";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const DB_CORRUPT: &str = "DB_CORRUPT";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const MODULE_LOAD_FAILED: &str = "MODULE_LOAD_FAILED";
