//! Ontology extraction error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// Convenience alias used across the crate.
pub type Result<T, E = OntologyError> = std::result::Result<T, E>;

/// Errors that abort a whole extraction run.
///
/// Per-file problems never surface here; they are collected as
/// [`crate::pipeline::FileFailure`] values and the run continues.
#[derive(Debug, Error)]
pub enum OntologyError {
    /// The repository root does not exist or is not a directory.
    #[error("Repository not found: {}", .0.display())]
    RepositoryNotFound(PathBuf),

    /// No file with a recognized extension was found.
    #[error("No recognized source files under {}", .0.display())]
    NoRecognizedFiles(PathBuf),

    /// File parsing error.
    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    /// IO error.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid ignore glob.
    #[error("Invalid ignore pattern: {0}")]
    Pattern(String),

    /// The blocking extraction task could not be joined.
    #[error("Worker error: {0}")]
    Worker(String),
}

impl OntologyError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OntologyError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<ignore::Error> for OntologyError {
    fn from(err: ignore::Error) -> Self {
        OntologyError::Pattern(err.to_string())
    }
}
