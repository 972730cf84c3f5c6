//! Scan orchestration: serial or chunked parallel fan-out, deterministic merge.

pub mod scan_orchestrator;
pub mod types;

pub use scan_orchestrator::{choose_mode, ScanOrchestrator};
pub use types::{ExecutionMode, ExecutionStats, ScanOutcome, ScanResult};
