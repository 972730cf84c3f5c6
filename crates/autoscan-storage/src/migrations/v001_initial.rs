//! V001: scan_cache and cache_meta.

pub const MIGRATION_SQL: &str = r#"
-- One row per scanned file, keyed by absolute path.
-- result_json holds the serialized detection result for that file.
CREATE TABLE IF NOT EXISTS scan_cache (
    path TEXT PRIMARY KEY,
    fingerprint TEXT NOT NULL,
    file_size INTEGER NOT NULL,
    mtime_secs INTEGER NOT NULL,
    mtime_nanos INTEGER NOT NULL,
    result_json TEXT NOT NULL,
    cached_at INTEGER NOT NULL
) STRICT;

-- Store-wide settings, e.g. the detector profile the rows were produced with.
CREATE TABLE IF NOT EXISTS cache_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
) STRICT;
"#;
