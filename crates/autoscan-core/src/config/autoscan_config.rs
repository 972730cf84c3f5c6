//! Layered autoscan configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{DetectorConfig, LogLevel, ScanConfiguration};
use crate::constants::{
    CONFIG_SEARCH_DEPTH, PROJECT_ROOT_MARKERS, PYPROJECT_FILE, PYPROJECT_TOOL_KEY, YAML_CONFIG_FILE,
};
use crate::errors::ConfigError;

/// One configuration layer. Every field is optional so layers can be merged.
///
/// Resolution order (highest priority first):
/// 1. Call-site overrides (passed to `load`)
/// 2. `pyproject.toml` `[tool.alembic-autoscan]`
/// 3. `.alembic-autoscan.yaml`
/// 4. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AutoscanConfig {
    /// Root directory to scan. Default: the nearest project root above the
    /// start directory, or the start directory itself.
    pub base_path: Option<String>,
    /// Files or directories marking a project root.
    /// Default: `pyproject.toml`, `setup.py`, `setup.cfg`, `.git`.
    pub project_root_markers: Option<Vec<String>>,
    /// Include globs. Default: `["**/*.py"]`.
    pub include_patterns: Option<Vec<String>>,
    /// Exclude globs, appended to the built-in excludes.
    pub exclude_patterns: Option<Vec<String>>,
    /// Keep the built-in excludes. Default: true.
    pub use_default_excludes: Option<bool>,
    /// Honour `.gitignore`. Default: true.
    pub respect_gitignore: Option<bool>,
    /// One of trace, debug, info, warning, error. Default: warning.
    pub log_level: Option<String>,
    /// Use the persistent scan cache. Default: true.
    pub cache_enabled: Option<bool>,
    /// Force parallel on/off. Default: unset (auto).
    pub parallel_enabled: Option<bool>,
    /// Candidate count that switches auto mode to parallel. Default: 100.
    pub parallel_threshold: Option<usize>,
    /// Load every discovered module after scanning. Default: false.
    pub strict_mode: Option<bool>,
    /// Worker count in parallel mode (0 = auto). Default: 0.
    pub workers: Option<usize>,
    /// Maximum file size in bytes. Default: 10MB.
    pub max_file_size: Option<u64>,
    /// Detector marker overrides.
    pub detector: DetectorConfig,
}

impl AutoscanConfig {
    /// Load configuration searching upwards from `start` for config files.
    ///
    /// `config_file` names an explicit YAML file that replaces the upward
    /// search for `.alembic-autoscan.yaml`. Broken config files are logged
    /// and skipped; an explicit file that does not exist is an error.
    pub fn load(
        start: &Path,
        config_file: Option<&Path>,
        overrides: Option<&AutoscanConfig>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 3 (lowest file priority): YAML
        let yaml_path = match config_file {
            Some(path) if path.exists() => Some(path.to_path_buf()),
            Some(path) => {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            }
            None => find_config_file(start, YAML_CONFIG_FILE),
        };
        if let Some(path) = yaml_path {
            match Self::from_yaml_file(&path) {
                Ok(layer) => {
                    tracing::debug!(path = %path.display(), "loaded YAML config");
                    config.merge(&layer);
                }
                Err(e) => tracing::warn!(error = %e, "skipping YAML config"),
            }
        }

        // Layer 2: project manifest
        if let Some(path) = find_config_file(start, PYPROJECT_FILE) {
            match Self::from_pyproject_file(&path) {
                Ok(Some(layer)) => {
                    tracing::debug!(path = %path.display(), "loaded pyproject config");
                    config.merge(&layer);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "skipping pyproject config"),
            }
        }

        // Layer 1 (highest priority): call site
        if let Some(overrides) = overrides {
            config.merge(overrides);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML layer from a string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Parse the `[tool.alembic-autoscan]` table out of a pyproject document.
    /// Returns `None` when the table is absent.
    pub fn from_pyproject(toml_str: &str) -> Result<Option<Self>, ConfigError> {
        let document: toml::Table = toml_str.parse().map_err(|e: toml::de::Error| {
            ConfigError::ParseError {
                path: "<string>".to_string(),
                message: e.to_string(),
            }
        })?;

        let Some(section) = document
            .get("tool")
            .and_then(|tool| tool.get(PYPROJECT_TOOL_KEY))
        else {
            return Ok(None);
        };

        let layer: AutoscanConfig =
            section
                .clone()
                .try_into()
                .map_err(|e: toml::de::Error| ConfigError::ParseError {
                    path: format!("[tool.{PYPROJECT_TOOL_KEY}]"),
                    message: e.to_string(),
                })?;
        Ok(Some(layer))
    }

    fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = read_config(path)?;
        Self::from_yaml(&content).map_err(|e| with_path(e, path))
    }

    fn from_pyproject_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        let content = read_config(path)?;
        Self::from_pyproject(&content).map_err(|e| with_path(e, path))
    }

    /// Merge `other` into `self`; values set in `other` win.
    pub fn merge(&mut self, other: &AutoscanConfig) {
        if other.base_path.is_some() {
            self.base_path = other.base_path.clone();
        }
        if other.project_root_markers.is_some() {
            self.project_root_markers = other.project_root_markers.clone();
        }
        if other.include_patterns.is_some() {
            self.include_patterns = other.include_patterns.clone();
        }
        if other.exclude_patterns.is_some() {
            self.exclude_patterns = other.exclude_patterns.clone();
        }
        if other.use_default_excludes.is_some() {
            self.use_default_excludes = other.use_default_excludes;
        }
        if other.respect_gitignore.is_some() {
            self.respect_gitignore = other.respect_gitignore;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level.clone();
        }
        if other.cache_enabled.is_some() {
            self.cache_enabled = other.cache_enabled;
        }
        if other.parallel_enabled.is_some() {
            self.parallel_enabled = other.parallel_enabled;
        }
        if other.parallel_threshold.is_some() {
            self.parallel_threshold = other.parallel_threshold;
        }
        if other.strict_mode.is_some() {
            self.strict_mode = other.strict_mode;
        }
        if other.workers.is_some() {
            self.workers = other.workers;
        }
        if other.max_file_size.is_some() {
            self.max_file_size = other.max_file_size;
        }
        self.detector.merge(&other.detector);
    }

    /// Validate the merged values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref level) = self.log_level {
            level.parse::<LogLevel>()?;
        }
        if self.parallel_threshold == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "parallel_threshold".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }
        if self.max_file_size == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "max_file_size".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if let Some(ref markers) = self.project_root_markers {
            if markers.is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: "project_root_markers".to_string(),
                    message: "must contain at least one marker".to_string(),
                });
            }
        }
        if let Some(ref includes) = self.include_patterns {
            if includes.is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: "include_patterns".to_string(),
                    message: "must contain at least one pattern".to_string(),
                });
            }
        }
        if let Some(ref keyword) = self.detector.table_keyword {
            if keyword.trim().is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: "detector.table_keyword".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Returns the effective log level, defaulting to warning.
    pub fn effective_log_level(&self) -> LogLevel {
        self.log_level
            .as_deref()
            .and_then(|l| l.parse().ok())
            .unwrap_or_default()
    }

    /// Project root markers in effect.
    pub fn effective_project_root_markers(&self) -> Vec<String> {
        self.project_root_markers.clone().unwrap_or_else(|| {
            PROJECT_ROOT_MARKERS.iter().map(|m| m.to_string()).collect()
        })
    }

    /// Resolve into the immutable per-scan configuration.
    /// A relative `base_path` is resolved against `start`; an unset one
    /// becomes the project root found from `start`.
    pub fn to_scan_configuration(&self, start: &Path) -> ScanConfiguration {
        let base = match self.base_path.as_deref() {
            Some(path) if Path::new(path).is_absolute() => PathBuf::from(path),
            Some(path) => start.join(path),
            None => find_project_root(start, &self.effective_project_root_markers()),
        };

        let mut config = ScanConfiguration::new(base);
        if let Some(ref includes) = self.include_patterns {
            config.include_patterns = includes.clone();
        }
        if !self.use_default_excludes.unwrap_or(true) {
            config.exclude_patterns.clear();
        }
        if let Some(ref excludes) = self.exclude_patterns {
            // User patterns first, then the built-ins.
            let mut merged = excludes.clone();
            for pattern in config.exclude_patterns.drain(..) {
                if !merged.contains(&pattern) {
                    merged.push(pattern);
                }
            }
            config.exclude_patterns = merged;
        }
        config.respect_gitignore = self.respect_gitignore.unwrap_or(true);
        config.cache_enabled = self.cache_enabled.unwrap_or(true);
        config.parallel = self.parallel_enabled;
        if let Some(threshold) = self.parallel_threshold {
            config.parallel_threshold = threshold;
        }
        config.strict = self.strict_mode.unwrap_or(false);
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(max) = self.max_file_size {
            config.max_file_size = max;
        }
        config.verbose = self.effective_log_level() <= LogLevel::Info;
        config.markers = self.detector.resolve();
        config
    }

    /// Serialize the config back to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

/// Find `filename` in `start` or one of its ancestors.
fn find_config_file(start: &Path, filename: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .take(CONFIG_SEARCH_DEPTH)
        .map(|dir| dir.join(filename))
        .find(|candidate| candidate.is_file())
}

/// The nearest directory at or above `start` containing one of `markers`.
/// Falls back to `start` when no ancestor has a marker.
pub fn find_project_root(start: &Path, markers: &[String]) -> PathBuf {
    let root = start
        .ancestors()
        .find(|dir| markers.iter().any(|marker| dir.join(marker).exists()));
    match root {
        Some(dir) => {
            tracing::debug!(root = %dir.display(), "project root found");
            dir.to_path_buf()
        }
        None => start.to_path_buf(),
    }
}

fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.display().to_string(),
    })
}

fn with_path(error: ConfigError, path: &Path) -> ConfigError {
    match error {
        ConfigError::ParseError { message, .. } => ConfigError::ParseError {
            path: path.display().to_string(),
            message,
        },
        other => other,
    }
}
