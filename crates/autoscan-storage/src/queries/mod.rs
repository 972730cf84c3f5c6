//! Query modules, one per table.

pub mod cache_meta;
pub mod scan_cache;
