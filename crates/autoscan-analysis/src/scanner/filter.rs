//! Include/exclude/gitignore evaluation on relative paths.
//!
//! Exclusion always wins over inclusion. `*` and `?` never cross a `/`;
//! `**` spans any number of segments. A directory can be judged from its own
//! relative path, which lets the walker prune it before descending.

use std::path::Path;

use autoscan_core::config::ScanConfiguration;
use autoscan_core::errors::ConfigError;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::gitignore::{Gitignore, GitignoreBuilder};

/// Compiled path filter for one scan.
#[derive(Debug, Clone)]
pub struct PathFilter {
    includes: GlobSet,
    excludes: GlobSet,
    /// Prefixes of `<prefix>/**` excludes; a directory matching one is pruned.
    excluded_dirs: GlobSet,
    gitignore: Option<Gitignore>,
}

impl PathFilter {
    /// Compile the filter for `config`, reading `<base>/.gitignore` when enabled.
    pub fn from_config(config: &ScanConfiguration) -> Result<Self, ConfigError> {
        let gitignore = if config.respect_gitignore {
            load_gitignore(&config.base_path)
        } else {
            None
        };
        Self::with_gitignore(&config.include_patterns, &config.exclude_patterns, gitignore)
    }

    /// Compile include and exclude globs without gitignore rules.
    pub fn new(includes: &[String], excludes: &[String]) -> Result<Self, ConfigError> {
        Self::with_gitignore(includes, excludes, None)
    }

    /// Compile include and exclude globs plus an already-built gitignore matcher.
    pub fn with_gitignore(
        includes: &[String],
        excludes: &[String],
        gitignore: Option<Gitignore>,
    ) -> Result<Self, ConfigError> {
        let dir_prefixes: Vec<String> = excludes
            .iter()
            .filter_map(|pattern| pattern.strip_suffix("/**"))
            .filter(|prefix| !prefix.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            includes: build_globset(includes)?,
            excludes: build_globset(excludes)?,
            excluded_dirs: build_globset(&dir_prefixes)?,
            gitignore,
        })
    }

    /// True when the file at `relative` (`/`-separated) should be scanned.
    ///
    /// Checks every ancestor directory too, so the answer agrees with what a
    /// pruning walk would visit.
    pub fn is_included(&self, relative: &str) -> bool {
        if !self.includes.is_match(relative) {
            return false;
        }
        if self.excludes.is_match(relative) || self.is_gitignored(relative, false) {
            return false;
        }
        !ancestors(relative).any(|dir| self.is_dir_excluded(dir))
    }

    /// True when the directory at `relative` must not be descended into.
    pub fn is_dir_excluded(&self, relative: &str) -> bool {
        if relative.is_empty() {
            return false;
        }
        self.excludes.is_match(relative)
            || self.excluded_dirs.is_match(relative)
            || self.is_gitignored(relative, true)
    }

    fn is_gitignored(&self, relative: &str, is_dir: bool) -> bool {
        self.gitignore
            .as_ref()
            .is_some_and(|gi| gi.matched(Path::new(relative), is_dir).is_ignore())
    }
}

/// Proper ancestor directories of a relative path, outermost first.
fn ancestors(relative: &str) -> impl Iterator<Item = &str> {
    relative
        .match_indices('/')
        .map(move |(index, _)| &relative[..index])
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| ConfigError::InvalidGlob {
                pattern: pattern.clone(),
                message: e.kind().to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| ConfigError::InvalidGlob {
        pattern: patterns.join(", "),
        message: e.to_string(),
    })
}

/// Load `<base>/.gitignore`. Unparseable lines are logged and skipped.
fn load_gitignore(base: &Path) -> Option<Gitignore> {
    let path = base.join(".gitignore");
    if !path.is_file() {
        return None;
    }
    let mut builder = GitignoreBuilder::new(base);
    if let Some(err) = builder.add(&path) {
        tracing::warn!(path = %path.display(), error = %err, "partially invalid .gitignore");
    }
    match builder.build() {
        Ok(gitignore) => Some(gitignore),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable .gitignore");
            None
        }
    }
}
