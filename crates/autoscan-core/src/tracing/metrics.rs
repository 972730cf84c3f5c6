//! Structured field names used in scan log records.

/// Candidate files handed to the orchestrator.
pub const FILES_SCANNED: &str = "files_scanned";

/// Cache hits during one scan.
pub const CACHE_HITS: &str = "cache_hits";

/// Cache hit rate (0.0 - 1.0).
pub const CACHE_HIT_RATE: &str = "cache_hit_rate";

/// Files that failed to parse.
pub const PARSE_ERRORS: &str = "parse_errors";

/// Workers used by the orchestrator (1 in serial mode).
pub const WORKERS: &str = "workers";

/// Walk phase duration in milliseconds.
pub const DISCOVERY_DURATION: &str = "discovery_duration";

/// Scan phase duration in milliseconds.
pub const SCAN_DURATION: &str = "scan_duration";
