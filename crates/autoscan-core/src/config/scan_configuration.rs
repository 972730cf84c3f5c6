//! The resolved, immutable configuration of one scan invocation.

use std::path::PathBuf;
use std::time::Duration;

use super::DetectorMarkers;
use crate::constants::{
    CACHE_FILE_NAME, DEFAULT_EXCLUDE_PATTERNS, DEFAULT_INCLUDE_PATTERNS, DEFAULT_MAX_FILE_SIZE,
    DEFAULT_PARALLEL_THRESHOLD, DEFAULT_WORKERS,
};

/// Everything a scan needs, with every layer already merged.
///
/// Built once per invocation and only borrowed afterwards.
#[derive(Debug, Clone)]
pub struct ScanConfiguration {
    /// Root of the scanned tree.
    pub base_path: PathBuf,
    /// Ordered include globs, relative to `base_path`.
    pub include_patterns: Vec<String>,
    /// Ordered exclude globs, relative to `base_path`. Always win over includes.
    pub exclude_patterns: Vec<String>,
    /// Honour `<base_path>/.gitignore`.
    pub respect_gitignore: bool,
    /// Use the persistent scan cache.
    pub cache_enabled: bool,
    /// Cache store location. `None` = `<base_path>/.autoscan-cache.db`.
    pub cache_path: Option<PathBuf>,
    /// `Some(true)`/`Some(false)` force a mode; `None` picks by `parallel_threshold`.
    pub parallel: Option<bool>,
    /// Candidate count at which auto mode goes parallel.
    pub parallel_threshold: usize,
    /// Worker count for parallel mode (0 = hardware parallelism).
    pub workers: usize,
    /// Load every discovered module after the scan.
    pub strict: bool,
    /// Files above this size are skipped with a warning.
    pub max_file_size: u64,
    /// Abort the scan once this much time has elapsed.
    pub deadline: Option<Duration>,
    /// Log every matched class and the rules that fired.
    pub verbose: bool,
    /// Marker names used by the model detector.
    pub markers: DetectorMarkers,
}

impl ScanConfiguration {
    /// Defaults for scanning `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            include_patterns: DEFAULT_INCLUDE_PATTERNS.iter().map(|s| s.to_string()).collect(),
            exclude_patterns: DEFAULT_EXCLUDE_PATTERNS.iter().map(|s| s.to_string()).collect(),
            respect_gitignore: true,
            cache_enabled: true,
            cache_path: None,
            parallel: None,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            workers: DEFAULT_WORKERS,
            strict: false,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            deadline: None,
            verbose: false,
            markers: DetectorMarkers::default(),
        }
    }

    /// Replace the include globs.
    pub fn with_includes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Append exclude globs to the current list (defaults stay in place).
    pub fn with_excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for pattern in patterns {
            let pattern = pattern.into();
            if !self.exclude_patterns.contains(&pattern) {
                self.exclude_patterns.push(pattern);
            }
        }
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    pub fn with_parallel(mut self, parallel: Option<bool>) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_markers(mut self, markers: DetectorMarkers) -> Self {
        self.markers = markers;
        self
    }

    /// Where the cache store lives for this configuration.
    pub fn cache_store_path(&self) -> PathBuf {
        self.cache_path
            .clone()
            .unwrap_or_else(|| self.base_path.join(CACHE_FILE_NAME))
    }

    /// Worker count to use in parallel mode.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

impl Default for ScanConfiguration {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_environment_and_migration_dirs() {
        let config = ScanConfiguration::new("/project");
        assert_eq!(config.include_patterns, vec!["**/*.py".to_string()]);
        assert!(config.exclude_patterns.iter().any(|p| p == "**/venv/**"));
        assert!(config.exclude_patterns.iter().any(|p| p == "**/migrations/**"));
        assert_eq!(config.parallel, None);
        assert_eq!(config.parallel_threshold, 100);
        assert!(config.cache_enabled);
        assert!(!config.strict);
    }

    #[test]
    fn extra_excludes_are_appended_once() {
        let config = ScanConfiguration::new("/project")
            .with_excludes(["**/scripts/**", "**/scripts/**", "**/venv/**"]);
        let count = config
            .exclude_patterns
            .iter()
            .filter(|p| p.as_str() == "**/scripts/**")
            .count();
        assert_eq!(count, 1);
        assert_eq!(config.exclude_patterns.last().map(String::as_str), Some("**/scripts/**"));
    }

    #[test]
    fn cache_path_defaults_under_base() {
        let config = ScanConfiguration::new("/project");
        assert_eq!(config.cache_store_path(), PathBuf::from("/project/.autoscan-cache.db"));
        let config = config.with_cache_path("/tmp/cache.db");
        assert_eq!(config.cache_store_path(), PathBuf::from("/tmp/cache.db"));
    }

    #[test]
    fn effective_workers_is_never_zero() {
        assert!(ScanConfiguration::new(".").effective_workers() >= 1);
        assert_eq!(ScanConfiguration::new(".").with_workers(3).effective_workers(), 3);
    }
}
