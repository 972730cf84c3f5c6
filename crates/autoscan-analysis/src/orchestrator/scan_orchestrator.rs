//! Serial and parallel scan execution.
//!
//! Parallel mode splits the path-sorted candidate list into contiguous
//! chunks and runs them on a local rayon pool. Workers only read the cache
//! snapshot; new entries come back with the results and are written by the
//! caller after the join.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use autoscan_core::config::ScanConfiguration;
use autoscan_core::errors::ScanError;
use autoscan_core::tracing::metrics;
use rayon::prelude::*;

use super::types::{ExecutionMode, FileOutcome, ScanOutcome};
use crate::cache::{CacheEntry, CacheSnapshot};
use crate::detectors::ModelDetector;
use crate::scanner::hasher::fingerprint;
use crate::scanner::{CandidateFile, IssueKind, ScanCancellation, ScanIssue};

/// Chunks per worker; more chunks than workers evens out uneven files.
const CHUNKS_PER_WORKER: usize = 4;

/// Explicit setting wins; otherwise parallel iff `count >= threshold`.
pub fn choose_mode(parallel: Option<bool>, threshold: usize, count: usize) -> ExecutionMode {
    match parallel {
        Some(true) => ExecutionMode::Parallel,
        Some(false) => ExecutionMode::Serial,
        None if count >= threshold => ExecutionMode::Parallel,
        None => ExecutionMode::Serial,
    }
}

/// Runs lookup -> parse -> detect over a candidate list.
pub struct ScanOrchestrator<'a> {
    config: &'a ScanConfiguration,
    detector: ModelDetector,
    cancellation: ScanCancellation,
}

impl<'a> ScanOrchestrator<'a> {
    pub fn new(config: &'a ScanConfiguration, cancellation: ScanCancellation) -> Self {
        Self {
            config,
            detector: ModelDetector::new(config.markers.clone()).with_verbose(config.verbose),
            cancellation,
        }
    }

    /// The mode `run` will use for `count` candidates.
    pub fn execution_mode(&self, count: usize) -> ExecutionMode {
        choose_mode(self.config.parallel, self.config.parallel_threshold, count)
    }

    /// Scan every candidate. Fails only on cancellation.
    pub fn run(
        &self,
        candidates: &[CandidateFile],
        snapshot: &CacheSnapshot,
    ) -> Result<ScanOutcome, ScanError> {
        let start = Instant::now();
        let scan = |candidate: &CandidateFile| self.scan_file(candidate, snapshot);

        let (outcomes, mode, workers) = match self.execution_mode(candidates.len()) {
            ExecutionMode::Serial => (
                run_chunk(0, candidates, &self.cancellation, &scan)?,
                ExecutionMode::Serial,
                1,
            ),
            ExecutionMode::Parallel => {
                let workers = self.config.effective_workers();
                match build_pool(workers) {
                    Ok(pool) => (
                        fan_out(&pool, workers, candidates, &self.cancellation, &scan)?,
                        ExecutionMode::Parallel,
                        workers,
                    ),
                    Err(err) => {
                        tracing::warn!(error = %err, "worker pool unavailable, scanning serially");
                        (
                            run_chunk(0, candidates, &self.cancellation, &scan)?,
                            ExecutionMode::Serial,
                            1,
                        )
                    }
                }
            }
        };

        let outcome = merge(outcomes, mode, workers);
        tracing::debug!(
            mode = ?mode,
            { metrics::WORKERS } = workers,
            { metrics::FILES_SCANNED } = candidates.len(),
            { metrics::CACHE_HITS } = outcome.cache_hits,
            { metrics::SCAN_DURATION } = start.elapsed().as_millis() as u64,
            "scan phase complete"
        );
        Ok(outcome)
    }

    fn scan_file(&self, candidate: &CandidateFile, snapshot: &CacheSnapshot) -> FileOutcome {
        if let Some(mut result) = snapshot.lookup(&candidate.path, &candidate.fingerprint) {
            result.relocate(&candidate.relative_path);
            return FileOutcome::hit(result);
        }

        let bytes = match std::fs::read(&candidate.path) {
            Ok(bytes) => bytes,
            Err(err) => {
                let err = ScanError::from_io(&candidate.path, err);
                tracing::warn!(path = %candidate.relative_path, error = %err, "file vanished or unreadable");
                return FileOutcome::failed(ScanIssue::new(
                    candidate.relative_path.as_str(),
                    IssueKind::Walk,
                    err.to_string(),
                ));
            }
        };

        let result = self.detector.detect(&candidate.relative_path, &bytes);
        let entry = CacheEntry {
            path: candidate.path.clone(),
            fingerprint: fingerprint(&bytes),
            mtime_secs: candidate.mtime_secs,
            mtime_nanos: candidate.mtime_nanos,
            file_size: bytes.len() as u64,
            result: result.clone(),
        };
        FileOutcome::computed(result, entry)
    }
}

fn build_pool(workers: usize) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("autoscan-worker-{i}"))
        .build()
}

/// Dispatch contiguous chunks to `pool` and join. Chunk order is preserved.
pub(crate) fn fan_out<F>(
    pool: &rayon::ThreadPool,
    workers: usize,
    candidates: &[CandidateFile],
    cancellation: &ScanCancellation,
    scan: &F,
) -> Result<Vec<FileOutcome>, ScanError>
where
    F: Fn(&CandidateFile) -> FileOutcome + Sync,
{
    if candidates.is_empty() {
        return Ok(Vec::new());
    }
    let chunk_size = candidates
        .len()
        .div_ceil(workers.max(1) * CHUNKS_PER_WORKER)
        .max(1);

    let chunks: Vec<Result<Vec<FileOutcome>, ScanError>> = pool.install(|| {
        candidates
            .par_chunks(chunk_size)
            .enumerate()
            .map(|(index, chunk)| run_chunk(index, chunk, cancellation, scan))
            .collect()
    });

    let mut outcomes = Vec::with_capacity(candidates.len());
    for chunk in chunks {
        outcomes.extend(chunk?);
    }
    Ok(outcomes)
}

/// Scan one chunk, checking cancellation before each file. A panic is
/// contained to the chunk: every file in it becomes a `Worker` issue.
pub(crate) fn run_chunk<F>(
    index: usize,
    chunk: &[CandidateFile],
    cancellation: &ScanCancellation,
    scan: &F,
) -> Result<Vec<FileOutcome>, ScanError>
where
    F: Fn(&CandidateFile) -> FileOutcome,
{
    let attempt = catch_unwind(AssertUnwindSafe(|| {
        let mut outcomes = Vec::with_capacity(chunk.len());
        for candidate in chunk {
            if cancellation.is_cancelled() {
                return Err(ScanError::Cancelled);
            }
            outcomes.push(scan(candidate));
        }
        Ok(outcomes)
    }));

    match attempt {
        Ok(outcomes) => outcomes,
        Err(payload) => {
            let err = ScanError::WorkerFailed {
                chunk: index,
                message: panic_message(payload.as_ref()),
            };
            tracing::error!(chunk = index, files = chunk.len(), error = %err, "worker failed");
            Ok(chunk
                .iter()
                .map(|candidate| {
                    FileOutcome::failed(ScanIssue::new(
                        candidate.relative_path.as_str(),
                        IssueKind::Worker,
                        err.to_string(),
                    ))
                })
                .collect())
        }
    }
}

fn merge(outcomes: Vec<FileOutcome>, mode: ExecutionMode, workers: usize) -> ScanOutcome {
    let mut merged = ScanOutcome {
        mode,
        workers,
        ..Default::default()
    };
    for outcome in outcomes {
        if outcome.cache_hit {
            merged.cache_hits += 1;
        }
        merged.results.extend(outcome.result);
        merged.entries.extend(outcome.entry);
        merged.issues.extend(outcome.issue);
    }
    merged.results.sort_by(|a, b| a.path.cmp(&b.path));
    merged.issues.sort_by(|a, b| a.path.cmp(&b.path));
    merged
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::detectors::DetectionResult;

    fn candidates(names: &[&str]) -> Vec<CandidateFile> {
        names
            .iter()
            .map(|name| CandidateFile {
                path: PathBuf::from("/virtual").join(name),
                relative_path: name.to_string(),
                fingerprint: fingerprint(name.as_bytes()),
                mtime_secs: 0,
                mtime_nanos: 0,
                file_size: 0,
            })
            .collect()
    }

    fn echo(candidate: &CandidateFile) -> FileOutcome {
        FileOutcome::hit(DetectionResult::empty(candidate.relative_path.as_str()))
    }

    #[test]
    fn mode_selection() {
        assert_eq!(choose_mode(None, 100, 99), ExecutionMode::Serial);
        assert_eq!(choose_mode(None, 100, 100), ExecutionMode::Parallel);
        assert_eq!(choose_mode(Some(false), 100, 5000), ExecutionMode::Serial);
        assert_eq!(choose_mode(Some(true), 100, 1), ExecutionMode::Parallel);
    }

    #[test]
    fn fan_out_preserves_order() {
        let names: Vec<String> = (0..37).map(|i| format!("pkg/m{i:03}.py")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let files = candidates(&refs);
        let pool = build_pool(4).unwrap();

        let outcomes = fan_out(&pool, 4, &files, &ScanCancellation::new(), &echo).unwrap();
        let paths: Vec<String> = outcomes
            .into_iter()
            .map(|o| o.result.unwrap().path)
            .collect();
        assert_eq!(paths, names);
    }

    #[test]
    fn panicking_chunk_is_isolated() {
        let names: Vec<String> = (0..16).map(|i| format!("m{i:02}.py")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let files = candidates(&refs);
        let pool = build_pool(2).unwrap();

        let explode = |candidate: &CandidateFile| {
            if candidate.relative_path == "m05.py" {
                panic!("detector blew up");
            }
            echo(candidate)
        };
        let merged = merge(
            fan_out(&pool, 2, &files, &ScanCancellation::new(), &explode).unwrap(),
            ExecutionMode::Parallel,
            2,
        );

        // 16 files over 8 chunks of 2: only m04/m05 are lost.
        assert_eq!(merged.results.len(), 14);
        assert_eq!(merged.issues.len(), 2);
        assert!(merged.issues.iter().all(|i| i.kind == IssueKind::Worker));
        assert_eq!(merged.issues[0].path, "m04.py");
        assert!(merged.issues[1].message.contains("detector blew up"));
    }

    #[test]
    fn cancellation_stops_the_chunk() {
        let files = candidates(&["a.py", "b.py"]);
        let token = ScanCancellation::new();
        token.cancel();
        assert!(matches!(
            run_chunk(0, &files, &token, &echo),
            Err(ScanError::Cancelled)
        ));
    }
}
