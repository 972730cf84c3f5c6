//! Strict-mode errors: a discovered module failed to load.

use super::error_code::{self, AutoscanErrorCode};

/// A single module that could not be loaded during strict validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("module {module} failed to load: {cause}")]
    LoadFailed { module: String, cause: String },

    #[error("module loader unavailable for {module}: {cause}")]
    LoaderUnavailable { module: String, cause: String },
}

impl ValidationError {
    /// The module this failure is about.
    pub fn module(&self) -> &str {
        match self {
            Self::LoadFailed { module, .. } | Self::LoaderUnavailable { module, .. } => module,
        }
    }
}

impl AutoscanErrorCode for ValidationError {
    fn error_code(&self) -> &'static str {
        error_code::MODULE_LOAD_FAILED
    }
}
