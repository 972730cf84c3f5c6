//! Scan cache lifecycle against a real SQLite store.

use std::path::PathBuf;

use autoscan_analysis::cache::{profile_key, CacheEntry, ScanCache};
use autoscan_analysis::detectors::DetectionResult;
use autoscan_core::config::DetectorMarkers;

fn entry(path: PathBuf, fingerprint: &str) -> CacheEntry {
    CacheEntry {
        result: DetectionResult::empty(path.file_name().unwrap().to_string_lossy()),
        path,
        fingerprint: fingerprint.to_string(),
        mtime_secs: 1_700_000_000,
        mtime_nanos: 0,
        file_size: 12,
    }
}

fn source_file(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, "x = 1\n").unwrap();
    path
}

#[test]
fn flushed_entries_are_visible_after_reopen() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = dir.path().join("cache.db");
    let file = source_file(&dir, "a.py");
    let markers = DetectorMarkers::default();

    let mut cache = ScanCache::open_at(&store, &markers);
    assert!(cache.lookup(&file, "f1").is_none());
    cache.put(entry(file.clone(), "f1"));
    assert_eq!(cache.flush().unwrap(), 1);
    drop(cache);

    let mut cache = ScanCache::open_at(&store, &markers);
    assert!(cache.take_issues().is_empty());
    assert!(cache.lookup(&file, "f1").is_some());
    assert!(cache.lookup(&file, "f2").is_none());
}

#[test]
fn changed_markers_discard_old_records() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = dir.path().join("cache.db");
    let file = source_file(&dir, "a.py");

    let mut cache = ScanCache::open_at(&store, &DetectorMarkers::default());
    cache.put(entry(file.clone(), "f1"));
    cache.flush().unwrap();
    drop(cache);

    let mut custom = DetectorMarkers::default();
    custom.declarative_bases.push("Entity".to_string());
    assert_ne!(profile_key(&custom), profile_key(&DetectorMarkers::default()));

    let cache = ScanCache::open_at(&store, &custom);
    assert!(cache.snapshot().is_empty());
    assert!(cache.lookup(&file, "f1").is_none());
}

#[test]
fn flush_prunes_records_of_deleted_files() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = dir.path().join("cache.db");
    let keep = source_file(&dir, "keep.py");
    let gone = source_file(&dir, "gone.py");
    let markers = DetectorMarkers::default();

    let mut cache = ScanCache::open_at(&store, &markers);
    cache.put(entry(keep.clone(), "k"));
    cache.put(entry(gone.clone(), "g"));
    cache.flush().unwrap();
    drop(cache);

    std::fs::remove_file(&gone).unwrap();
    let mut cache = ScanCache::open_at(&store, &markers);
    assert_eq!(cache.snapshot().len(), 2);
    cache.flush().unwrap();
    assert_eq!(cache.snapshot().len(), 1);
    drop(cache);

    let cache = ScanCache::open_at(&store, &markers);
    assert!(cache.lookup(&keep, "k").is_some());
    assert!(cache.lookup(&gone, "g").is_none());
}

#[test]
fn invalidate_removes_everything() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = dir.path().join("cache.db");
    let file = source_file(&dir, "a.py");
    let markers = DetectorMarkers::default();

    let mut cache = ScanCache::open_at(&store, &markers);
    cache.put(entry(file.clone(), "f1"));
    cache.flush().unwrap();
    cache.invalidate().unwrap();
    assert!(cache.snapshot().is_empty());
    drop(cache);

    let cache = ScanCache::open_at(&store, &markers);
    assert!(cache.lookup(&file, "f1").is_none());
}

#[test]
fn disabled_cache_is_a_no_op() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = source_file(&dir, "a.py");

    let mut cache = ScanCache::disabled();
    assert!(!cache.is_enabled());
    cache.put(entry(file.clone(), "f1"));
    assert_eq!(cache.flush().unwrap(), 0);
    assert!(cache.lookup(&file, "f1").is_none());
    cache.invalidate().unwrap();
}

#[test]
fn unopenable_store_runs_cold_with_an_issue() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = dir.path().join("missing-dir").join("cache.db");
    let mut cache = ScanCache::open_at(&store, &DetectorMarkers::default());
    assert!(cache.snapshot().is_empty());
    assert_eq!(cache.take_issues().len(), 1);
    assert_eq!(cache.flush().unwrap(), 0);
}

#[test]
fn hit_rate_counts_lookups() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = dir.path().join("cache.db");
    let file = source_file(&dir, "a.py");
    let markers = DetectorMarkers::default();

    let mut cache = ScanCache::open_at(&store, &markers);
    cache.put(entry(file.clone(), "f1"));
    cache.flush().unwrap();

    let snapshot = cache.snapshot();
    assert!(snapshot.lookup(&file, "f1").is_some());
    assert!(snapshot.lookup(&file, "stale").is_none());
    assert_eq!(snapshot.lookups(), 2);
    assert_eq!(snapshot.hits(), 1);
    assert!((snapshot.hit_rate() - 0.5).abs() < f64::EPSILON);
}
