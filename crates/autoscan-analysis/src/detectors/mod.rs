//! Model detection: structural heuristics over class definitions.

pub mod model_detector;
pub mod types;

pub use model_detector::ModelDetector;
pub use types::{ClassMatch, DetectionResult, DetectionRule};
