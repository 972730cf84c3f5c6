//! Shared constants for the autoscan engine.

/// Autoscan version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default include pattern: every Python source file.
pub const DEFAULT_INCLUDE_PATTERNS: &[&str] = &["**/*.py"];

/// Directories that never hold importable model modules.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    // Virtual environments
    "**/venv/**",
    "**/env/**",
    "**/.venv/**",
    "**/site-packages/**",
    // Tests
    "**/tests/**",
    "**/test/**",
    // Migration output
    "**/migrations/**",
    "**/alembic/**",
    // Caches and VCS
    "**/__pycache__/**",
    "**/.git/**",
    "**/.mypy_cache/**",
    "**/.pytest_cache/**",
    // Editors
    "**/.idea/**",
    "**/.vscode/**",
    // Build output
    "**/node_modules/**",
    "**/build/**",
    "**/dist/**",
];

/// Default candidate count at which auto mode switches to parallel scanning.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 100;

/// Files larger than this are skipped with a walk warning (10MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default number of workers (0 = available hardware parallelism).
pub const DEFAULT_WORKERS: usize = 0;

/// Cache store file name, created under the base path.
pub const CACHE_FILE_NAME: &str = ".autoscan-cache.db";

/// Bumped whenever the cached DetectionResult layout changes.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Dedicated YAML config file name.
pub const YAML_CONFIG_FILE: &str = ".alembic-autoscan.yaml";

/// Project manifest holding the `[tool.alembic-autoscan]` table.
pub const PYPROJECT_FILE: &str = "pyproject.toml";

/// Table name under `[tool]` in the project manifest.
pub const PYPROJECT_TOOL_KEY: &str = "alembic-autoscan";

/// Files or directories whose presence marks a project root.
pub const PROJECT_ROOT_MARKERS: &[&str] = &["pyproject.toml", "setup.py", "setup.cfg", ".git"];

/// How many directories upwards config files are searched for.
pub const CONFIG_SEARCH_DEPTH: usize = 10;

/// Environment variable overriding the configured log level.
pub const LOG_ENV_VAR: &str = "AUTOSCAN_LOG";
