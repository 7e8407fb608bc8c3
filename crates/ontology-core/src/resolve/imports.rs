//! Import resolution, one strategy per module system.
//!
//! A relative specifier that names no existing file is `unresolved`; any
//! other miss is `external`. Both end up in `externalImports`.

use super::index::{python_module, ReferenceIndex};
use super::repo::{join_normalized, parent_dir};
use crate::language::Language;
use crate::model::ImportRef;

/// Extensions tried, in order, for an extensionless JS/TS specifier.
pub const TS_CANDIDATE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

/// Resolve one import of the file at `from`.
pub fn resolve_import(index: &ReferenceIndex, from: &str, import: &mut ImportRef) {
    let relative = is_relative(index.language(), &import.source);
    let targets = match index.language() {
        Language::TypeScript => resolve_module_specifier(index, from, &import.source)
            .into_iter()
            .collect(),
        Language::Python => resolve_python(index, from, import),
        Language::Go => resolve_go(index, &import.source),
        Language::Java => resolve_java(index, import),
        Language::CSharp => resolve_csharp(index, import),
        Language::Apex => Vec::new(),
    };

    if !targets.is_empty() {
        import.resolve_local(targets);
    } else if relative {
        import.mark_unresolved();
    } else {
        import.mark_external();
    }
}

fn is_relative(language: Language, source: &str) -> bool {
    match language {
        Language::TypeScript => source.starts_with('.') || source.starts_with('/'),
        Language::Python => source.starts_with('.'),
        _ => false,
    }
}

/// A JS/TS specifier: relative, root-absolute, or through tsconfig aliases.
fn resolve_module_specifier(index: &ReferenceIndex, from: &str, source: &str) -> Option<String> {
    if source.starts_with('.') || source.starts_with('/') {
        let base = if source.starts_with('/') {
            join_normalized("", source)?
        } else {
            join_normalized(parent_dir(from), source)?
        };
        return find_script(index, &base);
    }

    index
        .ts_paths()?
        .candidates(source)
        .iter()
        .find_map(|base| find_script(index, base))
}

/// The file a module base names: exact, `.js` written for a `.ts` source,
/// each candidate extension, then `index.*`.
fn find_script(index: &ReferenceIndex, base: &str) -> Option<String> {
    let repo = index.repo();
    if repo.exists(base) {
        return Some(base.to_string());
    }

    // ESM TypeScript imports `./x.js` for `./x.ts`.
    for (written, actual) in [(".js", ".ts"), (".js", ".tsx"), (".jsx", ".tsx"), (".mjs", ".mts")] {
        if let Some(stem) = base.strip_suffix(written) {
            let candidate = format!("{}{}", stem, actual);
            if repo.exists(&candidate) {
                return Some(candidate);
            }
        }
    }

    TS_CANDIDATE_EXTENSIONS
        .iter()
        .map(|ext| format!("{}.{}", base, ext))
        .chain(
            TS_CANDIDATE_EXTENSIONS
                .iter()
                .map(|ext| format!("{}/index.{}", base, ext)),
        )
        .find(|candidate| repo.exists(candidate))
}

/// Module file (or package `__init__.py`) plus any imported names that are
/// submodules of it.
fn resolve_python(index: &ReferenceIndex, from: &str, import: &ImportRef) -> Vec<String> {
    let source = import.source.as_str();
    let dots = source.chars().take_while(|&c| c == '.').count();
    let module = &source[dots..];
    let module_path = module.replace('.', "/");

    let bases: Vec<String> = if dots > 0 {
        let mut dir = parent_dir(from).to_string();
        for _ in 1..dots {
            match join_normalized(&dir, "..") {
                Some(up) => dir = up,
                None => return Vec::new(),
            }
        }
        join_normalized(&dir, &module_path).into_iter().collect()
    } else {
        // The importing file's own root first, then `src/`.
        let own_root = python_module(from)
            .strip_prefix("src.")
            .map(|_| "src".to_string());
        let mut roots = vec![String::new()];
        roots.extend(own_root);
        if !roots.iter().any(|r| r == "src") {
            roots.push("src".to_string());
        }
        roots
            .iter()
            .filter_map(|root| join_normalized(root, &module_path))
            .collect()
    };

    let repo = index.repo();
    for base in &bases {
        let mut targets = Vec::new();
        if !module.is_empty() {
            let file = format!("{}.py", base);
            if repo.exists(&file) {
                targets.push(file);
            }
        }
        let package = join_normalized(base, "__init__.py").unwrap_or_default();
        if targets.is_empty() && repo.exists(&package) {
            targets.push(package);
        }
        for binding in &import.bindings {
            let Some(symbol) = binding.symbol.as_deref() else {
                continue;
            };
            let Some(submodule) = join_normalized(base, &format!("{}.py", symbol)) else {
                continue;
            };
            if repo.exists(&submodule) && !targets.contains(&submodule) {
                targets.push(submodule);
            }
        }
        if !targets.is_empty() {
            return targets;
        }
    }
    Vec::new()
}

/// Every `.go` file of the package directory, sorted by file name.
fn resolve_go(index: &ReferenceIndex, source: &str) -> Vec<String> {
    let repo = index.repo();
    for module in index.go_modules() {
        let rel = if source == module.path {
            ""
        } else {
            match source.strip_prefix(&format!("{}/", module.path)) {
                Some(rel) => rel,
                None => continue,
            }
        };
        let Some(dir) = join_normalized(&module.dir, rel) else {
            continue;
        };
        let files: Vec<String> = repo
            .files_in_dir(&dir, &["go"])
            .filter(|p| !p.ends_with("_test.go"))
            .map(str::to_string)
            .collect();
        if !files.is_empty() {
            return files;
        }
    }
    Vec::new()
}

fn resolve_java(index: &ReferenceIndex, import: &ImportRef) -> Vec<String> {
    let source = import.source.as_str();
    if let Some(package) = source.strip_suffix(".*") {
        // `import static a.b.C.*` pulls in one class.
        if import.is_static {
            return index
                .class_by_fqcn(package)
                .map(|c| vec![c.path.clone()])
                .unwrap_or_default();
        }
        return index.files_in_namespace(package).to_vec();
    }

    if let Some(class) = index.class_by_fqcn(source) {
        return vec![class.path.clone()];
    }
    if import.is_static {
        if let Some((owner, _member)) = source.rsplit_once('.') {
            if let Some(class) = index.class_by_fqcn(owner) {
                return vec![class.path.clone()];
            }
        }
    }
    Vec::new()
}

fn resolve_csharp(index: &ReferenceIndex, import: &ImportRef) -> Vec<String> {
    let source = import.source.as_str();
    if import.is_static || !import.bindings.is_empty() {
        if let Some(class) = index.class_by_fqcn(source) {
            return vec![class.path.clone()];
        }
    }
    if import.is_static {
        return Vec::new();
    }
    index.files_in_namespace(source).to_vec()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::{ClassKind, ClassNode, ImportBinding, ImportKind, Visibility};
    use crate::parser::ParseResult;
    use crate::resolve::{ReferenceIndex, RepoFiles};

    fn index(language: Language, paths: &[&str], results: &[ParseResult]) -> ReferenceIndex {
        let repo = Arc::new(RepoFiles::in_memory(
            Vec::new(),
            paths.iter().map(|p| p.to_string()),
        ));
        let mut builder = ReferenceIndex::builder(language, repo);
        for result in results {
            builder.add(result);
        }
        builder.finish()
    }

    fn resolve(index: &ReferenceIndex, from: &str, import: ImportRef) -> ImportRef {
        let mut import = import;
        resolve_import(index, from, &mut import);
        import
    }

    #[test]
    fn test_ts_relative_candidates() {
        let idx = index(
            Language::TypeScript,
            &["src/index.ts", "src/utils.ts", "src/lib/index.tsx", "src/esm.ts"],
            &[],
        );
        let utils = resolve(&idx, "src/index.ts", ImportRef::new("./utils"));
        assert_eq!(utils.kind, ImportKind::Local);
        assert_eq!(utils.path.as_deref(), Some("src/utils.ts"));

        let lib = resolve(&idx, "src/index.ts", ImportRef::new("./lib"));
        assert_eq!(lib.path.as_deref(), Some("src/lib/index.tsx"));

        let esm = resolve(&idx, "src/index.ts", ImportRef::new("./esm.js"));
        assert_eq!(esm.path.as_deref(), Some("src/esm.ts"));

        let missing = resolve(&idx, "src/index.ts", ImportRef::new("./gone"));
        assert_eq!(missing.kind, ImportKind::Unresolved);

        let react = resolve(&idx, "src/index.ts", ImportRef::new("react"));
        assert_eq!(react.kind, ImportKind::External);
        assert_eq!(react.path, None);
    }

    #[test]
    fn test_python_modules() {
        let idx = index(
            Language::Python,
            &[
                "app/main.py",
                "app/services/__init__.py",
                "app/services/users.py",
                "app/util.py",
                "src/lib/core.py",
            ],
            &[],
        );

        let rel = resolve(&idx, "app/main.py", ImportRef::new(".util"));
        assert_eq!(rel.path.as_deref(), Some("app/util.py"));

        let parent = resolve(&idx, "app/services/users.py", ImportRef::new("..util"));
        assert_eq!(parent.path.as_deref(), Some("app/util.py"));

        let package = resolve(
            &idx,
            "app/main.py",
            ImportRef::new("app.services")
                .with_binding(ImportBinding::symbol("users", "users")),
        );
        assert_eq!(
            package.targets,
            vec!["app/services/__init__.py", "app/services/users.py"]
        );

        let src_root = resolve(&idx, "app/main.py", ImportRef::new("lib.core"));
        assert_eq!(src_root.path.as_deref(), Some("src/lib/core.py"));

        let missing = resolve(&idx, "app/main.py", ImportRef::new(".nope"));
        assert_eq!(missing.kind, ImportKind::Unresolved);
        let requests = resolve(&idx, "app/main.py", ImportRef::new("requests"));
        assert_eq!(requests.kind, ImportKind::External);
    }

    #[test]
    fn test_go_package_first_file() {
        let repo = Arc::new(RepoFiles::in_memory(
            vec![("go.mod".to_string(), "module example.com/app\n".to_string())],
            ["pkg/b.go", "pkg/a.go", "pkg/a_test.go", "main.go"]
                .iter()
                .map(|p| p.to_string()),
        ));
        let idx = ReferenceIndex::builder(Language::Go, repo).finish();

        let pkg = resolve(&idx, "main.go", ImportRef::new("example.com/app/pkg"));
        assert_eq!(pkg.path.as_deref(), Some("pkg/a.go"));
        assert_eq!(pkg.targets, vec!["pkg/a.go", "pkg/b.go"]);

        let fmt = resolve(&idx, "main.go", ImportRef::new("fmt"));
        assert_eq!(fmt.kind, ImportKind::External);
    }

    #[test]
    fn test_java_fqcn_and_wildcard() {
        let mut a = ParseResult::new("src/main/java/com/acme/model/User.java");
        a.namespace = Some("com.acme.model".to_string());
        let mut user = ClassNode::new("User", ClassKind::Class, Visibility::Public);
        user.qualified_name = "com.acme.model.User".to_string();
        a.add_class(user);
        let path = a.file_path.clone();
        let idx = index(Language::Java, &[path.as_str()], &[a]);

        let single = resolve(&idx, "X.java", ImportRef::new("com.acme.model.User"));
        assert_eq!(single.path.as_deref(), Some("src/main/java/com/acme/model/User.java"));

        let wildcard = resolve(&idx, "X.java", ImportRef::new("com.acme.model.*").wildcard());
        assert_eq!(wildcard.kind, ImportKind::Local);

        let mut static_member = ImportRef::new("com.acme.model.User.create");
        static_member.is_static = true;
        let static_member = resolve(&idx, "X.java", static_member);
        assert_eq!(static_member.kind, ImportKind::Local);

        let list = resolve(&idx, "X.java", ImportRef::new("java.util.List"));
        assert_eq!(list.kind, ImportKind::External);
    }
}
