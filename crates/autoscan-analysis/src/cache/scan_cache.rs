//! Cache lifecycle: open once, look up from many workers, flush once.
//!
//! Storage problems never fail a scan. A missing, corrupt or unreadable
//! store degrades to a cold cache with a warning and a `Cache` issue.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use autoscan_core::config::{DetectorMarkers, ScanConfiguration};
use autoscan_core::constants::CACHE_FORMAT_VERSION;
use autoscan_core::errors::{AutoscanErrorCode, StorageError};
use autoscan_core::types::FxHashSet;
use autoscan_storage::queries::{cache_meta, scan_cache};
use autoscan_storage::{CacheDatabase, ScanCacheRecord};

use super::snapshot::{CacheSnapshot, SnapshotEntry};
use crate::detectors::DetectionResult;
use crate::scanner::{IssueKind, ScanIssue};

/// A freshly computed result waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Absolute path; the store key.
    pub path: PathBuf,
    /// Fingerprint of the bytes the result was computed from.
    pub fingerprint: String,
    pub mtime_secs: i64,
    pub mtime_nanos: u32,
    pub file_size: u64,
    pub result: DetectionResult,
}

/// The scan cache for one invocation.
pub struct ScanCache {
    store: Option<CacheDatabase>,
    snapshot: CacheSnapshot,
    pending: Vec<CacheEntry>,
    enabled: bool,
    issues: Vec<ScanIssue>,
}

impl ScanCache {
    /// Open the store configured for this scan, or a no-op cache when caching is off.
    pub fn open(config: &ScanConfiguration) -> Self {
        if !config.cache_enabled {
            return Self::disabled();
        }
        Self::open_at(&config.cache_store_path(), &config.markers)
    }

    /// Open the store at `path` for results produced under `markers`.
    pub fn open_at(path: &Path, markers: &DetectorMarkers) -> Self {
        let mut cache = Self {
            store: None,
            snapshot: CacheSnapshot::default(),
            pending: Vec::new(),
            enabled: true,
            issues: Vec::new(),
        };

        let mut db = match CacheDatabase::open(path) {
            Ok(db) => db,
            Err(err @ StorageError::CorruptionDetected { .. }) => {
                cache.record_issue(path, &err, "cache store corrupt, rebuilding");
                remove_store_files(path);
                match CacheDatabase::open(path) {
                    Ok(db) => db,
                    Err(err) => {
                        cache.record_issue(path, &err, "cache store unavailable");
                        return cache;
                    }
                }
            }
            Err(err) => {
                cache.record_issue(path, &err, "cache store unavailable");
                return cache;
            }
        };

        match load_snapshot(&mut db, &profile_key(markers)) {
            Ok(snapshot) => cache.snapshot = snapshot,
            Err(err) => cache.record_issue(path, &err, "cache store unreadable, starting cold"),
        }
        tracing::debug!(path = %path.display(), entries = cache.snapshot.len(), "cache opened");
        cache.store = Some(db);
        cache
    }

    /// A cache that never hits and never writes.
    pub fn disabled() -> Self {
        Self {
            store: None,
            snapshot: CacheSnapshot::default(),
            pending: Vec::new(),
            enabled: false,
            issues: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Read-only view handed to workers.
    pub fn snapshot(&self) -> &CacheSnapshot {
        &self.snapshot
    }

    /// The cached result for `path` if `fingerprint` matches exactly.
    pub fn lookup(&self, path: &Path, fingerprint: &str) -> Option<DetectionResult> {
        self.snapshot.lookup(path, fingerprint)
    }

    /// Stage a new entry. Nothing is written before `flush`.
    pub fn put(&mut self, entry: CacheEntry) {
        if self.enabled {
            self.pending.push(entry);
        }
    }

    /// Write staged entries and prune records of deleted files in one
    /// transaction. Returns the number of entries written.
    pub fn flush(&mut self) -> Result<usize, StorageError> {
        let Some(db) = self.store.as_mut() else {
            self.pending.clear();
            return Ok(0);
        };

        let pending = std::mem::take(&mut self.pending);
        let cached_at = unix_now();
        let records = pending
            .iter()
            .map(|entry| to_record(entry, cached_at))
            .collect::<Result<Vec<_>, _>>()?;

        let written: FxHashSet<&Path> = pending.iter().map(|e| e.path.as_path()).collect();
        let removed: Vec<PathBuf> = self
            .snapshot
            .entries
            .keys()
            .filter(|path| !written.contains(path.as_path()) && !path.exists())
            .cloned()
            .collect();
        let removed_keys: Vec<String> = removed
            .iter()
            .map(|path| path.to_string_lossy().into_owned())
            .collect();

        scan_cache::apply_batch(db.conn_mut(), &records, &removed_keys)?;
        db.checkpoint()?;

        for path in &removed {
            self.snapshot.entries.remove(path);
        }
        let count = pending.len();
        for entry in pending {
            self.snapshot.entries.insert(
                entry.path,
                SnapshotEntry {
                    fingerprint: entry.fingerprint,
                    result: entry.result,
                },
            );
        }

        tracing::debug!(written = count, pruned = removed.len(), "cache flushed");
        Ok(count)
    }

    /// Delete every record in the store.
    pub fn invalidate(&mut self) -> Result<(), StorageError> {
        self.pending.clear();
        self.snapshot.entries.clear();
        if let Some(db) = self.store.as_ref() {
            let removed = scan_cache::clear(db.conn())?;
            tracing::info!(removed, "cache invalidated");
        }
        Ok(())
    }

    /// Issues recorded while opening the store.
    pub fn take_issues(&mut self) -> Vec<ScanIssue> {
        std::mem::take(&mut self.issues)
    }

    fn record_issue(&mut self, path: &Path, err: &StorageError, context: &str) {
        tracing::warn!(path = %path.display(), error = %err, "{context}");
        self.issues.push(ScanIssue::new(
            path.to_string_lossy(),
            IssueKind::Cache,
            format!("{context}: {}", err.coded_string()),
        ));
    }
}

/// Hash of the detector markers and cache format version. Rows written
/// under a different profile are discarded.
pub fn profile_key(markers: &DetectorMarkers) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&CACHE_FORMAT_VERSION.to_le_bytes());
    hasher.update(&serde_json::to_vec(markers).unwrap_or_default());
    hasher.finalize().to_hex().to_string()
}

fn load_snapshot(db: &mut CacheDatabase, profile: &str) -> Result<CacheSnapshot, StorageError> {
    let mut snapshot = CacheSnapshot::default();

    let stored = cache_meta::get(db.conn(), cache_meta::PROFILE_KEY)?;
    if stored.as_deref() != Some(profile) {
        if stored.is_some() {
            let removed = scan_cache::clear(db.conn())?;
            tracing::info!(removed, "detector profile changed, cache cleared");
        }
        cache_meta::set(db.conn(), cache_meta::PROFILE_KEY, profile)?;
        return Ok(snapshot);
    }

    for record in scan_cache::load_all(db.conn())? {
        match serde_json::from_str::<DetectionResult>(&record.result_json) {
            Ok(result) => {
                snapshot.entries.insert(
                    PathBuf::from(record.path),
                    SnapshotEntry {
                        fingerprint: record.fingerprint,
                        result,
                    },
                );
            }
            Err(err) => {
                tracing::warn!(path = %record.path, error = %err, "dropping undecodable cache record");
            }
        }
    }
    Ok(snapshot)
}

fn to_record(entry: &CacheEntry, cached_at: i64) -> Result<ScanCacheRecord, StorageError> {
    let path = entry.path.to_string_lossy().into_owned();
    let result_json =
        serde_json::to_string(&entry.result).map_err(|e| StorageError::Serialization {
            path: path.clone(),
            message: e.to_string(),
        })?;
    Ok(ScanCacheRecord {
        path,
        fingerprint: entry.fingerprint.clone(),
        file_size: entry.file_size as i64,
        mtime_secs: entry.mtime_secs,
        mtime_nanos: entry.mtime_nanos as i64,
        result_json,
        cached_at,
    })
}

fn remove_store_files(path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let mut name = path.as_os_str().to_owned();
        name.push(suffix);
        let _ = std::fs::remove_file(PathBuf::from(name));
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
