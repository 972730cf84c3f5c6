//! Cancellation support for scan operations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A cancellation handle for scan operations.
///
/// Wraps an `AtomicBool` shared across threads, plus an optional deadline.
/// The walker and every worker check `is_cancelled()` between files.
#[derive(Debug, Clone)]
pub struct ScanCancellation {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl ScanCancellation {
    /// Create a new cancellation handle (not cancelled, no deadline).
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: None,
        }
    }

    /// A handle sharing this flag that also trips once `deadline` passes.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            flag: Arc::clone(&self.flag),
            deadline: Some(deadline),
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// True once cancellation was requested or the deadline has passed.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Reset the cancellation flag (for reuse).
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl Default for ScanCancellation {
    fn default() -> Self {
        Self::new()
    }
}
