//! autoscan-storage: SQLite persistence for the scan cache.
//!
//! - `connection`: one connection per store, pragmas, corruption checks
//! - `migrations`: schema versioned through `PRAGMA user_version`
//! - `queries`: scan cache records and store metadata

pub mod connection;
pub mod migrations;
pub mod queries;

pub use connection::CacheDatabase;
pub use queries::scan_cache::ScanCacheRecord;
