//! Error handling for autoscan.
//! One error enum per subsystem, `thiserror` only.

pub mod config_error;
pub mod error_code;
pub mod parse_error;
pub mod scan_error;
pub mod storage_error;
pub mod validation_error;

pub use config_error::ConfigError;
pub use error_code::AutoscanErrorCode;
pub use parse_error::ParseError;
pub use scan_error::ScanError;
pub use storage_error::StorageError;
pub use validation_error::ValidationError;
