//! autoscan-analysis: the model discovery engine.
//!
//! Walks a source tree, parses every candidate Python file with tree-sitter
//! (nothing is ever executed), classifies class definitions as ORM models
//! with configurable structural heuristics, and merges per-file results into
//! a deterministic list of importable module paths.

pub mod cache;
pub mod detectors;
pub mod discovery;
pub mod orchestrator;
pub mod parsers;
pub mod scanner;
pub mod validator;

pub use discovery::{discover, module_path, Discovery, DiscoveryError};
pub use orchestrator::{ExecutionMode, ScanResult};
