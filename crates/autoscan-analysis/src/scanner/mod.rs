//! Scanner subsystem: path filtering, tree walking, fingerprinting, cancellation.
//!
//! The walker is the entry point of every scan. It prunes excluded
//! directories before descending, fingerprints each candidate, and reports
//! unreadable entries as issues instead of failing.

pub mod cancellation;
pub mod filter;
pub mod hasher;
pub mod types;
pub mod walker;

pub use cancellation::ScanCancellation;
pub use filter::PathFilter;
pub use types::{CandidateFile, IssueKind, ScanIssue, WalkOutput};
pub use walker::TreeWalker;
