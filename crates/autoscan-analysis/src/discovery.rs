//! Discovery entry point: walk, scan, merge, flush, optionally validate.

use std::time::Instant;

use autoscan_core::config::ScanConfiguration;
use autoscan_core::errors::error_code::{self, AutoscanErrorCode};
use autoscan_core::errors::{ConfigError, ScanError, ValidationError};
use autoscan_core::tracing::metrics;
use autoscan_core::types::FxHashSet;

use crate::cache::ScanCache;
use crate::detectors::DetectionResult;
use crate::orchestrator::{ExecutionStats, ScanOrchestrator, ScanOutcome, ScanResult};
use crate::scanner::{IssueKind, ScanCancellation, ScanIssue, TreeWalker};
use crate::validator::{ModuleLoader, PythonImportLoader, StrictValidator};

/// The only ways a discovery call fails. File-level problems are issues.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("discovery cancelled")]
    Cancelled,

    #[error(transparent)]
    Scan(ScanError),

    #[error(
        "strict validation failed for {} module(s): {}",
        .failures.len(),
        summarize(.failures)
    )]
    StrictValidation {
        failures: Vec<ValidationError>,
        /// The complete scan, valid modules included.
        result: Box<ScanResult>,
    },
}

impl DiscoveryError {
    /// The scan carried by a strict-validation failure.
    pub fn scan_result(&self) -> Option<&ScanResult> {
        match self {
            Self::StrictValidation { result, .. } => Some(result),
            _ => None,
        }
    }
}

impl From<ScanError> for DiscoveryError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::Cancelled => Self::Cancelled,
            other => Self::Scan(other),
        }
    }
}

impl AutoscanErrorCode for DiscoveryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(err) => err.error_code(),
            Self::Cancelled => error_code::CANCELLED,
            Self::Scan(err) => err.error_code(),
            Self::StrictValidation { .. } => error_code::MODULE_LOAD_FAILED,
        }
    }
}

fn summarize(failures: &[ValidationError]) -> String {
    failures
        .iter()
        .map(ValidationError::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Run discovery with default collaborators.
pub fn discover(config: &ScanConfiguration) -> Result<ScanResult, DiscoveryError> {
    Discovery::new(config.clone()).run()
}

/// A configured discovery call.
pub struct Discovery {
    config: ScanConfiguration,
    loader: Option<Box<dyn ModuleLoader>>,
    cancellation: ScanCancellation,
}

impl Discovery {
    pub fn new(config: ScanConfiguration) -> Self {
        Self {
            config,
            loader: None,
            cancellation: ScanCancellation::new(),
        }
    }

    /// Loader used in strict mode. Defaults to `PythonImportLoader` rooted at the base path.
    pub fn with_loader(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Token checked between files; cancelling it aborts the call.
    pub fn with_cancellation(mut self, cancellation: ScanCancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn config(&self) -> &ScanConfiguration {
        &self.config
    }

    pub fn run(&self) -> Result<ScanResult, DiscoveryError> {
        let start = Instant::now();
        let cancellation = match self.config.deadline {
            Some(deadline) => self.cancellation.with_deadline(start + deadline),
            None => self.cancellation.clone(),
        };

        let walker = TreeWalker::new(&self.config)?;
        let walk = walker.walk(&cancellation)?;
        let discovery_ms = start.elapsed().as_millis() as u64;

        let mut cache = ScanCache::open(&self.config);
        let orchestrator = ScanOrchestrator::new(&self.config, cancellation);
        let ScanOutcome {
            results,
            entries,
            issues: scan_issues,
            cache_hits,
            mode,
            workers,
        } = orchestrator.run(&walk.candidates, cache.snapshot())?;
        let cache_hit_rate = cache.snapshot().hit_rate();

        let mut issues = walk.issues;
        issues.extend(cache.take_issues());
        for entry in entries {
            cache.put(entry);
        }
        if let Err(err) = cache.flush() {
            tracing::warn!(error = %err, "cache flush failed");
            issues.push(ScanIssue::new(
                self.config.cache_store_path().to_string_lossy(),
                IssueKind::Cache,
                err.coded_string(),
            ));
        }
        issues.extend(scan_issues);
        issues.extend(results.iter().filter_map(parse_issue));
        issues.sort_by(|a, b| (&a.path, a.kind).cmp(&(&b.path, b.kind)));

        let parse_errors = results.iter().filter(|r| r.has_parse_error()).count();
        let results: Vec<DetectionResult> = results.into_iter().filter(|r| r.has_matches()).collect();
        let modules = module_paths(&results);

        let result = ScanResult {
            files_scanned: walk.candidates.len(),
            cache_hits,
            parse_errors,
            warnings: issues.len(),
            modules,
            results,
            issues,
            execution: ExecutionStats {
                mode,
                workers,
                duration: start.elapsed(),
            },
        };

        tracing::info!(
            { metrics::FILES_SCANNED } = result.files_scanned,
            { metrics::CACHE_HITS } = result.cache_hits,
            { metrics::CACHE_HIT_RATE } = cache_hit_rate,
            { metrics::PARSE_ERRORS } = result.parse_errors,
            { metrics::WORKERS } = workers,
            { metrics::DISCOVERY_DURATION } = discovery_ms,
            models = result.modules.len(),
            "discovery complete"
        );

        if self.config.strict {
            return self.validate(result);
        }
        Ok(result)
    }

    fn validate(&self, result: ScanResult) -> Result<ScanResult, DiscoveryError> {
        let fallback;
        let loader: &dyn ModuleLoader = match self.loader.as_deref() {
            Some(loader) => loader,
            None => {
                fallback = PythonImportLoader::new(self.config.base_path.clone());
                &fallback
            }
        };

        let failures = StrictValidator::new(loader).validate(&result.modules);
        if failures.is_empty() {
            Ok(result)
        } else {
            Err(DiscoveryError::StrictValidation {
                failures,
                result: Box::new(result),
            })
        }
    }
}

fn parse_issue(result: &DetectionResult) -> Option<ScanIssue> {
    result
        .parse_error
        .as_ref()
        .map(|message| ScanIssue::new(result.path.as_str(), IssueKind::Parse, message.as_str()))
}

/// Import path for a relative file path: `pkg/models/user.py` -> `pkg.models.user`,
/// `pkg/__init__.py` -> `pkg`. `None` for non-Python files and a top-level `__init__.py`.
pub fn module_path(relative: &str) -> Option<String> {
    let stem = relative.strip_suffix(".py")?;
    let mut parts: Vec<&str> = stem.split('/').filter(|part| !part.is_empty()).collect();
    if parts.last() == Some(&"__init__") {
        parts.pop();
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("."))
}

fn module_paths(results: &[DetectionResult]) -> Vec<String> {
    let mut seen = FxHashSet::default();
    results
        .iter()
        .filter_map(|result| module_path(&result.path))
        .filter(|module| seen.insert(module.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_paths_from_relative_files() {
        assert_eq!(module_path("pkg/models/user.py").as_deref(), Some("pkg.models.user"));
        assert_eq!(module_path("pkg/__init__.py").as_deref(), Some("pkg"));
        assert_eq!(module_path("app.py").as_deref(), Some("app"));
        assert_eq!(module_path("__init__.py"), None);
        assert_eq!(module_path("pkg/schema.sql"), None);
    }

    #[test]
    fn module_list_is_deduplicated_in_order() {
        let results = vec![
            DetectionResult::empty("b/models.py"),
            DetectionResult::empty("a/models.py"),
            DetectionResult::empty("b/models.py"),
        ];
        assert_eq!(module_paths(&results), vec!["b.models", "a.models"]);
    }

    #[test]
    fn strict_error_names_every_module() {
        let err = DiscoveryError::StrictValidation {
            failures: vec![
                ValidationError::LoadFailed {
                    module: "app.models.post".into(),
                    cause: "ImportError".into(),
                },
                ValidationError::LoadFailed {
                    module: "app.models.tag".into(),
                    cause: "SyntaxError".into(),
                },
            ],
            result: Box::default(),
        };
        let message = err.to_string();
        assert!(message.contains("2 module(s)"));
        assert!(message.contains("app.models.post"));
        assert!(message.contains("app.models.tag"));
        assert_eq!(err.error_code(), error_code::MODULE_LOAD_FAILED);
        assert!(err.scan_result().is_some());
    }

    #[test]
    fn cancelled_scan_error_maps_to_cancelled() {
        assert!(matches!(
            DiscoveryError::from(ScanError::Cancelled),
            DiscoveryError::Cancelled
        ));
    }
}
