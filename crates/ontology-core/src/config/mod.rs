//! Configuration management for ontology extraction.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `ontology.toml` file
//! 3. User config `~/.config/ontology/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::language::Language;

mod defaults;

pub use defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which files are scanned.
    pub scan: ScanConfig,

    /// Worker pool settings.
    pub parallel: ParallelConfig,

    /// Output shape.
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./ontology.toml` (project local)
    /// 2. `~/.config/ontology/config.toml` (user config)
    /// 3. Falls back to defaults
    ///
    /// Environment overrides apply in every case.
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new(PROJECT_CONFIG_FILE).exists() {
            return Self::from_file(PROJECT_CONFIG_FILE);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(USER_CONFIG_DIR).join(USER_CONFIG_FILE);
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(languages) = std::env::var("ONTOLOGY_LANGUAGES") {
            self.scan.languages = parse_language_list(&languages)?;
        }
        if let Ok(size) = std::env::var("ONTOLOGY_MAX_FILE_SIZE") {
            if let Ok(n) = size.parse() {
                self.scan.max_file_size = n;
            }
        }

        if let Ok(enabled) = std::env::var("ONTOLOGY_PARALLEL") {
            self.parallel.enabled = matches!(
                enabled.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        if let Ok(workers) = std::env::var("ONTOLOGY_WORKERS") {
            if let Ok(n) = workers.parse() {
                self.parallel.workers = Some(n);
            }
        }
        if let Ok(min_files) = std::env::var("ONTOLOGY_MIN_PARALLEL_FILES") {
            if let Ok(n) = min_files.parse() {
                self.parallel.min_files = n;
            }
        }

        Ok(())
    }

    /// Reject settings the pipeline cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.languages.is_empty() {
            return Err(ConfigError::Invalid(
                "scan.languages must name at least one language".to_string(),
            ));
        }
        if self.parallel.workers == Some(0) {
            return Err(ConfigError::Invalid(
                "parallel.workers must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn parse_language_list(list: &str) -> Result<Vec<Language>, ConfigError> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<Language>().map_err(ConfigError::Invalid))
        .collect()
}

/// Scan configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Language ecosystems to analyze.
    pub languages: Vec<Language>,

    /// Directory names excluded at any depth.
    pub exclude_dirs: Vec<String>,

    /// File name globs excluded at any depth.
    pub exclude_patterns: Vec<String>,

    /// Maximum size of a single file (in bytes).
    pub max_file_size: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            languages: Language::ALL.to_vec(),
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
            exclude_patterns: DEFAULT_EXCLUDE_PATTERNS.iter().map(|s| s.to_string()).collect(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Use the worker pool for large languages.
    pub enabled: bool,

    /// Worker count; defaults to available parallelism minus one.
    pub workers: Option<usize>,

    /// Files per language needed before the pool is used.
    pub min_files: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_PARALLEL_ENABLED,
            workers: None,
            min_files: DEFAULT_MIN_PARALLEL_FILES,
        }
    }
}

impl ParallelConfig {
    /// Effective worker count: configured, or cores minus one, never zero.
    pub fn worker_count(&self) -> usize {
        self.workers
            .unwrap_or_else(|| num_cpus::get().saturating_sub(1))
            .max(1)
    }
}

/// Output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Emit the legacy bare array of files instead of the document.
    pub legacy_array: bool,

    /// Pretty-print JSON.
    pub pretty: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scan.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert_eq!(config.scan.languages.len(), 6);
        assert!(config.parallel.enabled);
        assert!(!config.output.legacy_array);
    }

    #[test]
    fn test_config_to_toml() {
        let toml_str = Config::default_config_string();
        assert!(toml_str.contains("[scan]"));
        assert!(toml_str.contains("[parallel]"));
        assert!(toml_str.contains("[output]"));
    }

    #[test]
    fn test_worker_count_never_zero() {
        let config = ParallelConfig {
            workers: Some(1),
            ..Default::default()
        };
        assert_eq!(config.worker_count(), 1);
        assert!(ParallelConfig::default().worker_count() >= 1);
    }

    #[test]
    fn test_parse_language_list() {
        let langs = parse_language_list("go, csharp,apex").unwrap();
        assert_eq!(langs, vec![Language::Go, Language::CSharp, Language::Apex]);
        assert!(parse_language_list("go,fortran").is_err());
    }
}
