//! Scanner data types: CandidateFile, ScanIssue, WalkOutput.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A file selected for scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Absolute path; the cache key.
    pub path: PathBuf,
    /// `/`-separated path relative to the base path; the sort key.
    pub relative_path: String,
    /// BLAKE3 hex of the bytes at walk time.
    pub fingerprint: String,
    pub mtime_secs: i64,
    pub mtime_nanos: u32,
    pub file_size: u64,
}

/// Which stage produced a non-fatal issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Walk,
    Parse,
    Cache,
    Worker,
}

/// A file-level problem that was recorded instead of failing the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanIssue {
    /// Relative path where known, otherwise the path as reported.
    pub path: String,
    pub kind: IssueKind,
    pub message: String,
}

impl ScanIssue {
    pub fn new(path: impl Into<String>, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }
}

/// Output of the walk phase.
#[derive(Debug, Clone, Default)]
pub struct WalkOutput {
    /// Candidates sorted by relative path.
    pub candidates: Vec<CandidateFile>,
    pub issues: Vec<ScanIssue>,
}
