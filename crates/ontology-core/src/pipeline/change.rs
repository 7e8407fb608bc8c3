//! Incremental change filter keyed by content hash.

use std::collections::HashMap;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::Result;
use crate::resolve::posix_path;

/// Drops files whose SHA-256 matches the hash recorded by a previous run.
///
/// With no prior map (or an empty one) every file counts as changed.
#[derive(Debug, Clone, Default)]
pub struct ChangeFilter {
    prior: HashMap<String, String>,
}

impl ChangeFilter {
    pub fn new(prior: HashMap<String, String>) -> Self {
        let prior = prior
            .into_iter()
            .map(|(path, hash)| (posix_path(&path), hash.to_ascii_lowercase()))
            .collect();
        Self { prior }
    }

    /// Read a `{"path": "sha256hex"}` JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        let prior: HashMap<String, String> = serde_json::from_str(json)?;
        Ok(Self::new(prior))
    }

    pub fn is_active(&self) -> bool {
        !self.prior.is_empty()
    }

    /// Compute SHA256 hash of content for change detection.
    pub fn hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Whether a file with this current hash must be processed.
    pub fn is_changed(&self, path: &str, hash: &str) -> bool {
        self.prior.get(path).map_or(true, |prior| prior != hash)
    }

    /// Paths under `root` that changed. A file that cannot be read is kept.
    pub fn filter(&self, root: &Path, paths: Vec<String>) -> Vec<String> {
        if !self.is_active() {
            return paths;
        }
        let before = paths.len();
        let kept: Vec<String> = paths
            .into_iter()
            .filter(|path| match std::fs::read_to_string(root.join(path)) {
                Ok(content) => self.is_changed(path, &Self::hash(&content)),
                Err(_) => true,
            })
            .collect();
        debug!(before, after = kept.len(), "Change filter applied");
        kept
    }
}
