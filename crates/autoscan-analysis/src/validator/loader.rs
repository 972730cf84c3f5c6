//! Module loaders.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

use autoscan_core::errors::ValidationError;

/// Loads one module by its dotted import path.
pub trait ModuleLoader: Send + Sync {
    fn load(&self, module: &str) -> Result<(), ValidationError>;
}

const IMPORT_SCRIPT: &str = "import importlib, sys; importlib.import_module(sys.argv[1])";

/// Imports modules with a Python interpreter subprocess, with the scan base
/// prepended to `PYTHONPATH`.
#[derive(Debug, Clone)]
pub struct PythonImportLoader {
    interpreter: PathBuf,
    search_root: PathBuf,
}

impl PythonImportLoader {
    /// Use `python3` from `PATH`.
    pub fn new(search_root: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: PathBuf::from("python3"),
            search_root: search_root.into(),
        }
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<PathBuf>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    fn python_path(&self) -> OsString {
        let existing = std::env::var_os("PYTHONPATH").unwrap_or_default();
        let paths = std::iter::once(self.search_root.clone()).chain(std::env::split_paths(&existing));
        std::env::join_paths(paths).unwrap_or_else(|_| self.search_root.clone().into_os_string())
    }
}

impl ModuleLoader for PythonImportLoader {
    fn load(&self, module: &str) -> Result<(), ValidationError> {
        let output = Command::new(&self.interpreter)
            .arg("-c")
            .arg(IMPORT_SCRIPT)
            .arg(module)
            .env("PYTHONPATH", self.python_path())
            .current_dir(&self.search_root)
            .output()
            .map_err(|e| ValidationError::LoaderUnavailable {
                module: module.to_string(),
                cause: format!("{}: {e}", self.interpreter.display()),
            })?;

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let cause = last_line(&stderr)
            .map(str::to_string)
            .unwrap_or_else(|| format!("interpreter exited with {}", output.status));
        Err(ValidationError::LoadFailed {
            module: module.to_string(),
            cause,
        })
    }
}

/// Last non-empty line, which for a Python traceback is the exception.
fn last_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).rfind(|line| !line.is_empty())
}
