//! Strict mode: confirm every discovered module actually loads.
//!
//! This is the only place project code may run, and only on request.

pub mod loader;

pub use loader::{ModuleLoader, PythonImportLoader};

use autoscan_core::errors::ValidationError;

/// Loads each module exactly once and collects every failure.
pub struct StrictValidator<'a> {
    loader: &'a dyn ModuleLoader,
}

impl<'a> StrictValidator<'a> {
    pub fn new(loader: &'a dyn ModuleLoader) -> Self {
        Self { loader }
    }

    /// Failures in module order. Empty means every module loaded.
    pub fn validate(&self, modules: &[String]) -> Vec<ValidationError> {
        let mut failures = Vec::new();
        for module in modules {
            match self.loader.load(module) {
                Ok(()) => tracing::debug!(module = module.as_str(), "module loaded"),
                Err(err) => {
                    tracing::error!(module = module.as_str(), error = %err, "module failed to load");
                    failures.push(err);
                }
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct RecordingLoader {
        broken: &'static str,
        calls: Mutex<Vec<String>>,
    }

    impl ModuleLoader for RecordingLoader {
        fn load(&self, module: &str) -> Result<(), ValidationError> {
            self.calls.lock().unwrap().push(module.to_string());
            if module == self.broken {
                Err(ValidationError::LoadFailed {
                    module: module.to_string(),
                    cause: "ImportError: cannot import name 'Missing'".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn every_module_loaded_once_and_failures_collected() {
        let loader = RecordingLoader {
            broken: "app.models.post",
            calls: Mutex::new(Vec::new()),
        };
        let modules = vec![
            "app.models.post".to_string(),
            "app.models.user".to_string(),
        ];
        let failures = StrictValidator::new(&loader).validate(&modules);

        assert_eq!(*loader.calls.lock().unwrap(), modules);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].module(), "app.models.post");
    }
}
