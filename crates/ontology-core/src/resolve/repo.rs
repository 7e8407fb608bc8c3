//! The set of files a run knows about, and path helpers.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Repository file view shared by the index, resolver and merge engine.
///
/// `known` holds every walked path (any extension), so relative-import
/// existence checks work for files that are not parsed. In diff mode the
/// changed files live in `overlay` and `known` is the caller's skeleton.
#[derive(Debug, Clone, Default)]
pub struct RepoFiles {
    root: Option<PathBuf>,
    known: BTreeSet<String>,
    overlay: HashMap<String, String>,
}

impl RepoFiles {
    /// Files on disk under `root`, listed by repository-relative path.
    pub fn on_disk(root: impl Into<PathBuf>, paths: impl IntoIterator<Item = String>) -> Self {
        Self {
            root: Some(root.into()),
            known: paths.into_iter().map(|p| posix_path(&p)).collect(),
            overlay: HashMap::new(),
        }
    }

    /// In-memory sources plus a skeleton of paths that exist elsewhere.
    pub fn in_memory(
        sources: impl IntoIterator<Item = (String, String)>,
        skeleton: impl IntoIterator<Item = String>,
    ) -> Self {
        let overlay: HashMap<String, String> = sources
            .into_iter()
            .map(|(path, text)| (posix_path(&path), text))
            .collect();
        let mut known: BTreeSet<String> = skeleton.into_iter().map(|p| posix_path(&p)).collect();
        known.extend(overlay.keys().cloned());
        Self {
            root: None,
            known,
            overlay,
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn exists(&self, path: &str) -> bool {
        self.known.contains(path)
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// All known paths, sorted.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.known.iter().map(String::as_str)
    }

    /// Read a file's text; `None` when it is neither in memory nor readable.
    pub fn read(&self, path: &str) -> Option<String> {
        if let Some(text) = self.overlay.get(path) {
            return Some(text.clone());
        }
        let root = self.root.as_ref()?;
        std::fs::read_to_string(root.join(path)).ok()
    }

    /// Files directly inside `dir` with one of `extensions`, sorted by name.
    pub fn files_in_dir<'a>(
        &'a self,
        dir: &'a str,
        extensions: &'a [&'a str],
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.known
            .iter()
            .map(String::as_str)
            .filter(move |p| parent_dir(p) == dir)
            .filter(move |p| {
                extension(p).is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            })
    }

    /// Files with the given base name anywhere in the repository.
    pub fn named<'a>(&'a self, file_name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.known
            .iter()
            .map(String::as_str)
            .filter(move |p| base_name(p) == file_name)
    }
}

/// Normalize to a forward-slashed relative path without `./`.
pub fn posix_path(path: &str) -> String {
    let slashed = path.replace('\\', "/");
    let mut trimmed = slashed.as_str();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    trimmed.trim_start_matches('/').to_string()
}

/// Repository-relative POSIX path of `path` under `root`.
pub fn relative_posix(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = rel.iter().filter_map(|c| c.to_str()).collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Directory part of a POSIX path; empty for files at the root.
pub fn parent_dir(path: &str) -> &str {
    path.rfind('/').map_or("", |i| &path[..i])
}

pub fn base_name(path: &str) -> &str {
    path.rfind('/').map_or(path, |i| &path[i + 1..])
}

pub fn extension(path: &str) -> Option<&str> {
    let name = base_name(path);
    name.rfind('.').filter(|&i| i > 0).map(|i| &name[i + 1..])
}

/// Join `rel` onto `dir`, folding `.` and `..`. `None` when `..` climbs
/// above the repository root.
pub fn join_normalized(dir: &str, rel: &str) -> Option<String> {
    let mut parts: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in rel.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            s => parts.push(s),
        }
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posix_path() {
        assert_eq!(posix_path("src\\app\\main.ts"), "src/app/main.ts");
        assert_eq!(posix_path("./pkg/a.go"), "pkg/a.go");
        assert_eq!(posix_path("a.py"), "a.py");
    }

    #[test]
    fn test_join_normalized() {
        assert_eq!(join_normalized("src/app", "../utils").as_deref(), Some("src/utils"));
        assert_eq!(join_normalized("src", "./utils").as_deref(), Some("src/utils"));
        assert_eq!(join_normalized("", "a/b").as_deref(), Some("a/b"));
        assert_eq!(join_normalized("src", "../../x"), None);
    }

    #[test]
    fn test_path_parts() {
        assert_eq!(parent_dir("pkg/a.go"), "pkg");
        assert_eq!(parent_dir("main.go"), "");
        assert_eq!(base_name("pkg/a.go"), "a.go");
        assert_eq!(extension("web/app.test.tsx"), Some("tsx"));
        assert_eq!(extension(".gitignore"), None);
    }

    #[test]
    fn test_in_memory_view() {
        let repo = RepoFiles::in_memory(
            vec![("src\\index.ts".to_string(), "x".to_string())],
            vec!["src/utils.ts".to_string(), "pkg/b.go".to_string(), "pkg/a.go".to_string()],
        );
        assert!(repo.exists("src/index.ts"));
        assert!(repo.exists("src/utils.ts"));
        assert_eq!(repo.read("src/index.ts").as_deref(), Some("x"));
        assert_eq!(repo.read("src/utils.ts"), None);

        let go: Vec<&str> = repo.files_in_dir("pkg", &["go"]).collect();
        assert_eq!(go, vec!["pkg/a.go", "pkg/b.go"]);
    }
}
