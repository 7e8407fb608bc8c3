//! Repository walk: which files exist, and which of them get parsed.

use std::collections::BTreeMap;
use std::path::Path;

use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use tracing::{debug, info};

use crate::config::ScanConfig;
use crate::error::Result;
use crate::language::Language;
use crate::resolve::relative_posix;

/// Result of walking a repository.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Every walked file, any extension, sorted.
    pub known: Vec<String>,
    /// Files per enabled language, sorted.
    pub by_language: BTreeMap<Language, Vec<String>>,
    /// Recognized files skipped for exceeding `max_file_size`.
    pub oversize: Vec<(Language, String)>,
}

impl Discovery {
    pub fn source_count(&self) -> usize {
        self.by_language.values().map(Vec::len).sum()
    }
}

/// Walk `root`, honouring `.gitignore` and the configured excludes.
pub fn discover(root: &Path, scan: &ScanConfig) -> Result<Discovery> {
    let mut overrides = OverrideBuilder::new(root);
    for dir in &scan.exclude_dirs {
        overrides.add(&format!("!{}/", dir))?;
    }
    for pattern in &scan.exclude_patterns {
        overrides.add(&format!("!{}", pattern))?;
    }

    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .require_git(false)
        .overrides(overrides.build()?)
        .build();

    let mut discovery = Discovery::default();
    for entry in walker.flatten() {
        let path = entry.path();
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let Some(relative) = relative_posix(root, path) else {
            continue;
        };

        if let Some(language) = Language::from_path(&relative) {
            if scan.languages.contains(&language) {
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                if size > scan.max_file_size {
                    info!(path = %relative, size, "Skipping file over size limit");
                    discovery.oversize.push((language, relative.clone()));
                } else {
                    discovery
                        .by_language
                        .entry(language)
                        .or_default()
                        .push(relative.clone());
                }
            }
        }
        discovery.known.push(relative);
    }

    discovery.known.sort();
    for files in discovery.by_language.values_mut() {
        files.sort();
    }

    debug!(
        root = %root.display(),
        files = discovery.known.len(),
        sources = discovery.source_count(),
        "Repository walked"
    );
    Ok(discovery)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_discover_applies_excludes() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "main.go", "package main\n");
        write(root, "api/types.pb.go", "package api\n");
        write(root, "web/src/app.ts", "export {}\n");
        write(root, "web/node_modules/lib/index.js", "module.exports = {}\n");
        write(root, "web/tsconfig.json", "{}\n");
        write(root, "vendor/x/x.go", "package x\n");

        let discovery = discover(root, &ScanConfig::default()).unwrap();

        assert_eq!(discovery.by_language[&Language::Go], vec!["main.go"]);
        assert_eq!(discovery.by_language[&Language::TypeScript], vec!["web/src/app.ts"]);
        assert!(discovery.known.contains(&"web/tsconfig.json".to_string()));
        assert!(!discovery.known.iter().any(|p| p.contains("node_modules")));
    }

    #[test]
    fn test_discover_filters_languages_and_size() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "a.py", "x = 1\n");
        write(root, "big.py", &"x = 1\n".repeat(100));
        write(root, "A.java", "class A {}\n");

        let scan = ScanConfig {
            languages: vec![Language::Python],
            max_file_size: 50,
            ..Default::default()
        };
        let discovery = discover(root, &scan).unwrap();

        assert_eq!(discovery.by_language.len(), 1);
        assert_eq!(discovery.by_language[&Language::Python], vec!["a.py"]);
        assert_eq!(discovery.oversize, vec![(Language::Python, "big.py".to_string())]);
        assert_eq!(discovery.known.len(), 3);
    }
}
