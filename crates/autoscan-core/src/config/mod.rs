//! Configuration system for autoscan.
//! Layered resolution: call site > pyproject.toml > YAML file > defaults.

pub mod autoscan_config;
pub mod detector_config;
pub mod log_level;
pub mod scan_configuration;

pub use autoscan_config::{find_project_root, AutoscanConfig};
pub use detector_config::{DetectorConfig, DetectorMarkers};
pub use log_level::LogLevel;
pub use scan_configuration::ScanConfiguration;
