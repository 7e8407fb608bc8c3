use ontology_core::config::{
    ConfigError, ParallelConfig, DEFAULT_EXCLUDE_DIRS, DEFAULT_MAX_FILE_SIZE,
    DEFAULT_MIN_PARALLEL_FILES,
};
use ontology_core::{Config, Language};
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.scan.max_file_size, DEFAULT_MAX_FILE_SIZE);
    assert_eq!(config.scan.languages, Language::ALL.to_vec());
    assert_eq!(config.parallel.min_files, DEFAULT_MIN_PARALLEL_FILES);
    assert!(config.scan.exclude_dirs.contains(&"node_modules".to_string()));
    assert_eq!(config.scan.exclude_dirs.len(), DEFAULT_EXCLUDE_DIRS.len());
}

#[test]
fn test_config_to_toml() {
    let toml_str = Config::default_config_string();
    assert!(toml_str.contains("[scan]"));
    assert!(toml_str.contains("[parallel]"));
    assert!(toml_str.contains("[output]"));
}

#[test]
fn test_config_from_toml() {
    let toml_str = r#"
[scan]
languages = ["go", "python"]
max_file_size = 200000

[parallel]
enabled = false
workers = 3

[output]
pretty = true
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.scan.languages, vec![Language::Go, Language::Python]);
    assert_eq!(config.scan.max_file_size, 200000);
    assert!(!config.parallel.enabled);
    assert_eq!(config.parallel.worker_count(), 3);
    assert!(config.output.pretty);
    // Unset sections keep their defaults.
    assert_eq!(config.parallel.min_files, DEFAULT_MIN_PARALLEL_FILES);
}

#[test]
fn test_config_from_file_rejects_invalid() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ontology.toml");

    std::fs::write(&path, "[scan]\nlanguages = []\n").unwrap();
    assert!(matches!(Config::from_file(&path), Err(ConfigError::Invalid(_))));

    std::fs::write(&path, "[scan\n").unwrap();
    assert!(matches!(Config::from_file(&path), Err(ConfigError::ParseError(_))));

    let missing = temp.path().join("missing.toml");
    assert!(matches!(Config::from_file(&missing), Err(ConfigError::ReadError(_))));
}

#[test]
fn test_worker_count_never_zero() {
    let parallel = ParallelConfig::default();
    assert!(parallel.worker_count() >= 1);
}
