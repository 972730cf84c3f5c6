//! Persistent scan cache: (absolute path, fingerprint) -> DetectionResult.

pub mod scan_cache;
pub mod snapshot;

pub use scan_cache::{profile_key, CacheEntry, ScanCache};
pub use snapshot::CacheSnapshot;
