//! Tests for the layered configuration system.

use std::path::Path;

use autoscan_core::config::{find_project_root, AutoscanConfig, LogLevel};
use autoscan_core::errors::ConfigError;

fn tempdir() -> tempfile::TempDir {
    tempfile::TempDir::new().unwrap()
}

#[test]
fn test_defaults_without_config_files() {
    let dir = tempdir();
    let config = AutoscanConfig::load(dir.path(), None, None).unwrap();

    assert_eq!(config, AutoscanConfig::default());
    assert_eq!(config.effective_log_level(), LogLevel::Warning);

    let scan = config.to_scan_configuration(dir.path());
    assert_eq!(scan.base_path, dir.path());
    assert_eq!(scan.include_patterns, vec!["**/*.py".to_string()]);
    assert_eq!(scan.parallel, None);
    assert_eq!(scan.parallel_threshold, 100);
    assert!(scan.cache_enabled);
    assert!(!scan.verbose);
}

#[test]
fn test_pyproject_overrides_yaml() {
    let dir = tempdir();
    std::fs::write(
        dir.path().join(".alembic-autoscan.yaml"),
        "base_path: src\nparallel_threshold: 20\ncache_enabled: false\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("pyproject.toml"),
        r#"
[project]
name = "app"

[tool.alembic-autoscan]
parallel_threshold = 50
log_level = "INFO"
"#,
    )
    .unwrap();

    let config = AutoscanConfig::load(dir.path(), None, None).unwrap();

    // pyproject wins over YAML where both are set
    assert_eq!(config.parallel_threshold, Some(50));
    // YAML-only values survive
    assert_eq!(config.base_path.as_deref(), Some("src"));
    assert_eq!(config.cache_enabled, Some(false));
    assert_eq!(config.effective_log_level(), LogLevel::Info);
    assert!(config.to_scan_configuration(dir.path()).verbose);
}

#[test]
fn test_call_site_overrides_everything() {
    let dir = tempdir();
    std::fs::write(
        dir.path().join("pyproject.toml"),
        "[tool.alembic-autoscan]\nparallel_enabled = false\ninclude_patterns = [\"app/**/*.py\"]\n",
    )
    .unwrap();

    let overrides = AutoscanConfig {
        parallel_enabled: Some(true),
        ..Default::default()
    };
    let config = AutoscanConfig::load(dir.path(), None, Some(&overrides)).unwrap();

    assert_eq!(config.parallel_enabled, Some(true));
    assert_eq!(config.include_patterns, Some(vec!["app/**/*.py".to_string()]));
}

#[test]
fn test_config_found_in_parent_directory() {
    let dir = tempdir();
    let nested = dir.path().join("services").join("api");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::write(
        dir.path().join(".alembic-autoscan.yaml"),
        "exclude_patterns:\n  - \"**/scripts/**\"\n",
    )
    .unwrap();

    let config = AutoscanConfig::load(&nested, None, None).unwrap();
    assert_eq!(config.exclude_patterns, Some(vec!["**/scripts/**".to_string()]));
}

#[test]
fn test_broken_yaml_is_skipped() {
    let dir = tempdir();
    std::fs::write(dir.path().join(".alembic-autoscan.yaml"), "base_path: [unclosed\n").unwrap();

    let config = AutoscanConfig::load(dir.path(), None, None).unwrap();
    assert_eq!(config.base_path, None);
}

#[test]
fn test_explicit_missing_config_file_is_an_error() {
    let dir = tempdir();
    let result = AutoscanConfig::load(dir.path(), Some(Path::new("/nonexistent/autoscan.yaml")), None);
    assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
}

#[test]
fn test_invalid_values_fail_validation() {
    let zero_threshold = AutoscanConfig {
        parallel_threshold: Some(0),
        ..Default::default()
    };
    assert!(matches!(
        zero_threshold.validate(),
        Err(ConfigError::ValidationFailed { ref field, .. }) if field == "parallel_threshold"
    ));

    let bad_level = AutoscanConfig {
        log_level: Some("chatty".into()),
        ..Default::default()
    };
    assert!(matches!(bad_level.validate(), Err(ConfigError::InvalidValue { .. })));

    let no_includes = AutoscanConfig {
        include_patterns: Some(vec![]),
        ..Default::default()
    };
    assert!(no_includes.validate().is_err());
}

#[test]
fn test_pyproject_without_tool_table() {
    let layer = AutoscanConfig::from_pyproject("[project]\nname = \"x\"\n").unwrap();
    assert!(layer.is_none());
}

#[test]
fn test_user_excludes_prepend_defaults() {
    let config = AutoscanConfig {
        exclude_patterns: Some(vec!["**/legacy/**".into()]),
        ..Default::default()
    };
    let scan = config.to_scan_configuration(Path::new("/project"));
    assert_eq!(scan.exclude_patterns[0], "**/legacy/**");
    assert!(scan.exclude_patterns.iter().any(|p| p == "**/venv/**"));

    let config = AutoscanConfig {
        exclude_patterns: Some(vec!["**/legacy/**".into()]),
        use_default_excludes: Some(false),
        ..Default::default()
    };
    let scan = config.to_scan_configuration(Path::new("/project"));
    assert_eq!(scan.exclude_patterns, vec!["**/legacy/**".to_string()]);
}

#[test]
fn test_detector_table_resolves_markers() {
    let yaml = r#"
detector:
  declarative_bases: ["OrmBase"]
  table_keyword: "persisted"
"#;
    let config = AutoscanConfig::from_yaml(yaml).unwrap();
    let scan = config.to_scan_configuration(Path::new("/project"));
    assert_eq!(scan.markers.declarative_bases, vec!["OrmBase".to_string()]);
    assert_eq!(scan.markers.table_keyword, "persisted");
    // Untouched markers keep their defaults
    assert_eq!(scan.markers.abstract_attribute, "__abstract__");
}

#[test]
fn test_yaml_roundtrip() {
    let config = AutoscanConfig {
        base_path: Some("app".into()),
        parallel_enabled: Some(false),
        ..Default::default()
    };
    let yaml = config.to_yaml().unwrap();
    let parsed = AutoscanConfig::from_yaml(&yaml).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_project_root_found_from_nested_directory() {
    let dir = tempdir();
    std::fs::write(dir.path().join("setup.cfg"), "[metadata]\n").unwrap();
    let nested = dir.path().join("migrations").join("versions");
    std::fs::create_dir_all(&nested).unwrap();

    let markers = AutoscanConfig::default().effective_project_root_markers();
    assert_eq!(find_project_root(&nested, &markers), dir.path());

    let scan = AutoscanConfig::default().to_scan_configuration(&nested);
    assert_eq!(scan.base_path, dir.path());
}

#[test]
fn test_project_root_git_directory_and_nearest_wins() {
    let dir = tempdir();
    std::fs::create_dir(dir.path().join(".git")).unwrap();
    let service = dir.path().join("services").join("billing");
    std::fs::create_dir_all(service.join("app")).unwrap();
    std::fs::write(service.join("pyproject.toml"), "[project]\nname = \"billing\"\n").unwrap();

    let markers = AutoscanConfig::default().effective_project_root_markers();
    assert_eq!(find_project_root(&service.join("app"), &markers), service);
    assert_eq!(find_project_root(&dir.path().join("services"), &markers), dir.path());
}

#[test]
fn test_project_root_falls_back_to_start() {
    let dir = tempdir();
    let start = dir.path().join("work");
    std::fs::create_dir(&start).unwrap();
    let markers = vec!["autoscan-root-marker-that-does-not-exist".to_string()];
    assert_eq!(find_project_root(&start, &markers), start);
}

#[test]
fn test_explicit_base_path_skips_project_root() {
    let dir = tempdir();
    std::fs::write(dir.path().join("pyproject.toml"), "[project]\nname = \"app\"\n").unwrap();
    let nested = dir.path().join("tools");
    std::fs::create_dir(&nested).unwrap();

    let config = AutoscanConfig {
        base_path: Some(".".into()),
        ..Default::default()
    };
    assert_eq!(config.to_scan_configuration(&nested).base_path, nested.join("."));
}

#[test]
fn test_custom_project_root_markers() {
    let dir = tempdir();
    std::fs::write(dir.path().join("alembic.ini"), "[alembic]\n").unwrap();
    let nested = dir.path().join("app");
    std::fs::create_dir(&nested).unwrap();

    let config = AutoscanConfig::from_yaml("project_root_markers: [alembic.ini]\n").unwrap();
    assert_eq!(config.to_scan_configuration(&nested).base_path, dir.path());

    let empty = AutoscanConfig {
        project_root_markers: Some(Vec::new()),
        ..Default::default()
    };
    assert!(matches!(
        empty.validate(),
        Err(ConfigError::ValidationFailed { ref field, .. }) if field == "project_root_markers"
    ));
}
