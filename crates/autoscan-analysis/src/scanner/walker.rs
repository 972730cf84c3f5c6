//! Sequential tree walker with directory pruning.

use std::path::{Path, PathBuf};
use std::time::{Instant, UNIX_EPOCH};

use autoscan_core::config::ScanConfiguration;
use autoscan_core::constants::CACHE_FILE_NAME;
use autoscan_core::errors::{ConfigError, ScanError};
use walkdir::WalkDir;

use super::cancellation::ScanCancellation;
use super::filter::PathFilter;
use super::hasher::fingerprint;
use super::types::{CandidateFile, IssueKind, ScanIssue, WalkOutput};

/// Enumerates candidate files under a base path.
pub struct TreeWalker {
    base: PathBuf,
    filter: PathFilter,
    max_file_size: u64,
    cache_file_name: String,
}

impl TreeWalker {
    /// Resolve the base path and compile the filter.
    ///
    /// Fails with `BasePathNotFound` when the base is not a directory and
    /// with `InvalidGlob` when a pattern does not compile.
    pub fn new(config: &ScanConfiguration) -> Result<Self, ConfigError> {
        let base = std::fs::canonicalize(&config.base_path)
            .ok()
            .filter(|path| path.is_dir())
            .ok_or_else(|| ConfigError::BasePathNotFound {
                path: config.base_path.clone(),
            })?;

        let cache_file_name = config
            .cache_store_path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| CACHE_FILE_NAME.to_string());

        Ok(Self {
            filter: PathFilter::from_config(config)?,
            base,
            max_file_size: config.max_file_size,
            cache_file_name,
        })
    }

    /// The canonical base path.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Walk the tree. Candidates come back sorted by relative path.
    ///
    /// Only cancellation fails the walk; every other problem becomes an issue.
    pub fn walk(&self, cancellation: &ScanCancellation) -> Result<WalkOutput, ScanError> {
        let start = Instant::now();
        let mut output = WalkOutput::default();

        let entries = WalkDir::new(&self.base)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !self.filter.is_dir_excluded(&self.relative(entry.path()))
            });

        for entry in entries {
            if cancellation.is_cancelled() {
                return Err(ScanError::Cancelled);
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    output.issues.push(self.walk_issue(err));
                    continue;
                }
            };
            if !entry.file_type().is_file() || self.is_cache_file(entry.path()) {
                continue;
            }

            let relative = self.relative(entry.path());
            if !self.filter.is_included(&relative) {
                continue;
            }

            match self.candidate(entry.path(), relative.clone()) {
                Ok(candidate) => output.candidates.push(candidate),
                Err(err) => {
                    tracing::warn!(path = %relative, error = %err, "skipping file");
                    output
                        .issues
                        .push(ScanIssue::new(relative, IssueKind::Walk, err.to_string()));
                }
            }
        }

        output
            .candidates
            .sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        output.issues.sort_by(|a, b| a.path.cmp(&b.path));

        tracing::debug!(
            candidates = output.candidates.len(),
            issues = output.issues.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "walk complete"
        );
        Ok(output)
    }

    fn candidate(&self, path: &Path, relative_path: String) -> Result<CandidateFile, ScanError> {
        let metadata = std::fs::metadata(path).map_err(|e| ScanError::from_io(path, e))?;
        let file_size = metadata.len();
        if file_size > self.max_file_size {
            return Err(ScanError::MaxFileSizeExceeded {
                path: path.to_path_buf(),
                size: file_size,
                max: self.max_file_size,
            });
        }

        let content = std::fs::read(path).map_err(|e| ScanError::from_io(path, e))?;
        let (mtime_secs, mtime_nanos) = metadata
            .modified()
            .ok()
            .and_then(|mtime| mtime.duration_since(UNIX_EPOCH).ok())
            .map(|d| (d.as_secs() as i64, d.subsec_nanos()))
            .unwrap_or((0, 0));

        Ok(CandidateFile {
            path: path.to_path_buf(),
            relative_path,
            fingerprint: fingerprint(&content),
            mtime_secs,
            mtime_nanos,
            file_size,
        })
    }

    fn walk_issue(&self, err: walkdir::Error) -> ScanIssue {
        let path = err
            .path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.base.clone());
        let scan_error = if err.loop_ancestor().is_some() {
            ScanError::SymlinkLoop { path: path.clone() }
        } else {
            match err.into_io_error() {
                Some(io) => ScanError::from_io(&path, io),
                None => ScanError::IoError {
                    path: path.clone(),
                    source: std::io::Error::other("walk failed"),
                },
            }
        };
        let relative = self.relative(&path);
        tracing::warn!(path = %relative, error = %scan_error, "walk error");
        ScanIssue::new(relative, IssueKind::Walk, scan_error.to_string())
    }

    /// The cache store and its WAL/SHM siblings are never candidates.
    fn is_cache_file(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| name.to_string_lossy().starts_with(&self.cache_file_name))
            .unwrap_or(false)
    }

    /// `/`-separated path relative to the base.
    fn relative(&self, path: &Path) -> String {
        let stripped = path.strip_prefix(&self.base).unwrap_or(path);
        stripped
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn missing_base_is_config_error() {
        let config = ScanConfiguration::new("/definitely/not/here");
        assert!(matches!(
            TreeWalker::new(&config),
            Err(ConfigError::BasePathNotFound { .. })
        ));
    }

    #[test]
    fn candidates_sorted_and_excluded_dirs_pruned() {
        let dir = tempfile::TempDir::new().unwrap();
        write(dir.path(), "pkg/z.py", "z = 1\n");
        write(dir.path(), "pkg/a.py", "a = 1\n");
        write(dir.path(), "venv/lib/x.py", "x = 1\n");
        write(dir.path(), "notes.txt", "hi\n");

        let walker = TreeWalker::new(&ScanConfiguration::new(dir.path())).unwrap();
        let output = walker.walk(&ScanCancellation::new()).unwrap();
        let paths: Vec<&str> = output
            .candidates
            .iter()
            .map(|c| c.relative_path.as_str())
            .collect();
        assert_eq!(paths, vec!["pkg/a.py", "pkg/z.py"]);
        assert!(output.issues.is_empty());
        assert_eq!(output.candidates[0].fingerprint, fingerprint(b"a = 1\n"));
    }

    #[test]
    fn oversize_file_is_walk_issue() {
        let dir = tempfile::TempDir::new().unwrap();
        write(dir.path(), "big.py", &"x = 1\n".repeat(100));
        write(dir.path(), "small.py", "x = 1\n");

        let mut config = ScanConfiguration::new(dir.path());
        config.max_file_size = 64;
        let output = TreeWalker::new(&config)
            .unwrap()
            .walk(&ScanCancellation::new())
            .unwrap();
        assert_eq!(output.candidates.len(), 1);
        assert_eq!(output.issues.len(), 1);
        assert_eq!(output.issues[0].path, "big.py");
        assert_eq!(output.issues[0].kind, IssueKind::Walk);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_cycle_and_dangling_link_are_walk_issues() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::TempDir::new().unwrap();
        write(dir.path(), "pkg/a.py", "a = 1\n");
        symlink(dir.path().join("pkg"), dir.path().join("pkg/loop")).unwrap();
        symlink(dir.path().join("pkg/gone.py"), dir.path().join("pkg/broken.py")).unwrap();

        let walker = TreeWalker::new(&ScanConfiguration::new(dir.path())).unwrap();
        let output = walker.walk(&ScanCancellation::new()).unwrap();

        let paths: Vec<&str> = output
            .candidates
            .iter()
            .map(|c| c.relative_path.as_str())
            .collect();
        assert_eq!(paths, vec!["pkg/a.py"]);

        let issues: Vec<&str> = output.issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(issues, vec!["pkg/broken.py", "pkg/loop"]);
        assert!(output.issues.iter().all(|i| i.kind == IssueKind::Walk));
        assert!(output.issues[1].message.contains("Symlink cycle"));
    }

    #[test]
    fn cancelled_walk_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        write(dir.path(), "a.py", "a = 1\n");
        let token = ScanCancellation::new();
        token.cancel();
        let walker = TreeWalker::new(&ScanConfiguration::new(dir.path())).unwrap();
        assert!(matches!(walker.walk(&token), Err(ScanError::Cancelled)));
    }
}
