//! Orchestrator output types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::CacheEntry;
use crate::detectors::DetectionResult;
use crate::scanner::ScanIssue;

/// How the per-file work was executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Serial,
    Parallel,
}

/// Execution details. Never serialized, so serial and parallel runs of the
/// same tree serialize identically.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionStats {
    pub mode: ExecutionMode,
    pub workers: usize,
    pub duration: Duration,
}

/// The merged outcome of one discovery call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanResult {
    /// Files with at least one model, sorted by relative path.
    pub results: Vec<DetectionResult>,
    /// Import paths of `results`, same order, de-duplicated.
    pub modules: Vec<String>,
    /// Candidate files handed to the orchestrator.
    pub files_scanned: usize,
    pub cache_hits: usize,
    pub parse_errors: usize,
    /// Number of non-fatal issues recorded.
    pub warnings: usize,
    /// Non-fatal problems, sorted by path.
    pub issues: Vec<ScanIssue>,
    #[serde(skip)]
    pub execution: ExecutionStats,
}

impl ScanResult {
    pub fn cache_hit_rate(&self) -> f64 {
        if self.files_scanned == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.files_scanned as f64
        }
    }
}

/// Per-file output of the fan-out phase.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// One result per scanned file, sorted by relative path.
    pub results: Vec<DetectionResult>,
    /// Freshly computed results to stage in the cache.
    pub entries: Vec<CacheEntry>,
    pub issues: Vec<ScanIssue>,
    pub cache_hits: usize,
    pub mode: ExecutionMode,
    pub workers: usize,
}

/// What one candidate produced.
#[derive(Debug, Clone, Default)]
pub(crate) struct FileOutcome {
    pub result: Option<DetectionResult>,
    pub entry: Option<CacheEntry>,
    pub cache_hit: bool,
    pub issue: Option<ScanIssue>,
}

impl FileOutcome {
    pub fn hit(result: DetectionResult) -> Self {
        Self {
            result: Some(result),
            cache_hit: true,
            ..Default::default()
        }
    }

    pub fn computed(result: DetectionResult, entry: CacheEntry) -> Self {
        Self {
            result: Some(result),
            entry: Some(entry),
            ..Default::default()
        }
    }

    pub fn failed(issue: ScanIssue) -> Self {
        Self {
            issue: Some(issue),
            ..Default::default()
        }
    }
}
