//! Read-only view of the cache store, shared by every worker during a scan.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use autoscan_core::types::FxHashMap;

use crate::detectors::DetectionResult;

/// A stored result and the fingerprint it was computed for.
#[derive(Debug, Clone)]
pub(crate) struct SnapshotEntry {
    pub fingerprint: String,
    pub result: DetectionResult,
}

/// All cache rows, loaded once when the store is opened.
#[derive(Debug, Default)]
pub struct CacheSnapshot {
    pub(crate) entries: FxHashMap<PathBuf, SnapshotEntry>,
    lookups: AtomicUsize,
    hits: AtomicUsize,
}

impl CacheSnapshot {
    /// The cached result for `path`, only when `fingerprint` matches exactly.
    pub fn lookup(&self, path: &Path, fingerprint: &str) -> Option<DetectionResult> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let entry = self.entries.get(path)?;
        if entry.fingerprint != fingerprint {
            return None;
        }
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(entry.result.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Hits over lookups (0.0 when nothing was looked up).
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.lookups();
        if lookups == 0 {
            0.0
        } else {
            self.hits() as f64 / lookups as f64
        }
    }
}
