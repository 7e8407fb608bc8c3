//! Per-language reference index.
//!
//! Built once from every file of a language before any resolution and
//! read-only afterwards, so workers share it behind an `Arc`.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::debug;

use super::repo::{base_name, join_normalized, parent_dir, RepoFiles};
use crate::language::Language;
use crate::model::{ClassKind, FunctionKind};
use crate::parser::ParseResult;

static GO_MODULE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*module\s+(\S+)").ok());

/// Source roots stripped when a Java file declares no package.
const JAVA_SOURCE_ROOTS: &[&str] = &[
    "src/main/java/",
    "src/test/java/",
    "src/main/kotlin/",
    "src/",
];

/// A declared class, interface, struct, enum, record or trigger.
#[derive(Debug, Clone)]
pub struct ClassEntry {
    pub name: String,
    pub qualified_name: String,
    pub path: String,
    pub kind: ClassKind,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub methods: Vec<String>,
}

/// Where a function or method name is declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSite {
    /// Owning class, `None` for free functions.
    pub class_name: Option<String>,
    pub path: String,
    pub is_static: bool,
}

/// A `go.mod` and the directory it governs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoModule {
    pub dir: String,
    pub path: String,
}

/// `compilerOptions.baseUrl` and `paths` from `tsconfig.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TsPaths {
    /// Repository-relative directory aliases are resolved against.
    pub base_url: Option<String>,
    /// `(pattern, replacements)`; `*` is the wildcard.
    pub aliases: Vec<(String, Vec<String>)>,
}

impl TsPaths {
    /// Parse a tsconfig/jsconfig body located in `dir`.
    pub fn parse(dir: &str, text: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(text)
            .or_else(|_| serde_json::from_str(&strip_json_comments(text)))
            .ok()?;
        let options = value.get("compilerOptions")?;

        let base_url = options
            .get("baseUrl")
            .and_then(|v| v.as_str())
            .and_then(|b| join_normalized(dir, b));
        let aliases: Vec<(String, Vec<String>)> = options
            .get("paths")
            .and_then(|v| v.as_object())
            .map(|paths| {
                paths
                    .iter()
                    .map(|(pattern, targets)| {
                        let targets: Vec<String> = targets
                            .as_array()
                            .map(|a| a.iter().filter_map(|t| t.as_str().map(str::to_string)).collect())
                            .unwrap_or_default();
                        (pattern.clone(), targets)
                    })
                    .collect()
            })
            .unwrap_or_default();

        if base_url.is_none() && aliases.is_empty() {
            return None;
        }
        Some(Self { base_url, aliases })
    }

    /// Repository-relative bases an import specifier may map to.
    pub fn candidates(&self, specifier: &str) -> Vec<String> {
        let base = self.base_url.as_deref().unwrap_or("");
        let mut out = Vec::new();
        for (pattern, targets) in &self.aliases {
            let captured = match pattern.split_once('*') {
                Some((prefix, suffix)) => specifier
                    .strip_prefix(prefix)
                    .and_then(|rest| rest.strip_suffix(suffix)),
                None => (pattern == specifier).then_some(""),
            };
            let Some(captured) = captured else {
                continue;
            };
            for target in targets {
                if let Some(path) = join_normalized(base, &target.replace('*', captured)) {
                    out.push(path);
                }
            }
        }
        if self.base_url.is_some() {
            if let Some(path) = join_normalized(base, specifier) {
                out.push(path);
            }
        }
        out
    }
}

/// Drop `//` and `/* */` comments outside strings, and trailing commas.
fn strip_json_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = ' ';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }

    // `,}` and `,]`
    let mut cleaned = String::with_capacity(out.len());
    let chars: Vec<char> = out.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c == ',' {
            let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        cleaned.push(c);
    }
    cleaned
}

/// Module path declared by a `go.mod` body.
pub fn go_module_path(text: &str) -> Option<String> {
    GO_MODULE
        .as_ref()?
        .captures(text)
        .map(|c| c[1].trim_matches('"').to_string())
}

/// Dotted Python module of a file: `pkg/sub/__init__.py` is `pkg.sub`.
pub fn python_module(path: &str) -> String {
    let stem = path.strip_suffix(".py").unwrap_or(path);
    let stem = stem.strip_suffix("/__init__").unwrap_or(stem);
    if stem == "__init__" {
        return String::new();
    }
    stem.replace('/', ".")
}

/// Lookup tables for one language.
#[derive(Debug)]
pub struct ReferenceIndex {
    language: Language,
    repo: Arc<RepoFiles>,
    /// Indexed files in scan order.
    files: Vec<String>,
    positions: HashMap<String, usize>,
    namespaces: HashMap<String, String>,
    classes: Vec<ClassEntry>,
    class_index: HashMap<String, Vec<usize>>,
    fqcn_index: HashMap<String, usize>,
    method_index: HashMap<String, Vec<MethodSite>>,
    /// C# only: class -> member -> declared type.
    var_type_index: HashMap<String, HashMap<String, String>>,
    namespace_index: HashMap<String, Vec<String>>,
    go_modules: Vec<GoModule>,
    ts_paths: Option<TsPaths>,
}

impl ReferenceIndex {
    pub fn builder(language: Language, repo: Arc<RepoFiles>) -> IndexBuilder {
        IndexBuilder::new(language, repo)
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn repo(&self) -> &RepoFiles {
        &self.repo
    }

    /// Lookup key for a name under the language's case rule.
    pub fn key(&self, name: &str) -> String {
        if self.language.is_case_insensitive() {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }

    pub fn same_name(&self, a: &str, b: &str) -> bool {
        if self.language.is_case_insensitive() {
            a.eq_ignore_ascii_case(b)
        } else {
            a == b
        }
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn contains_file(&self, path: &str) -> bool {
        self.positions.contains_key(path)
    }

    /// Scan-order position; unknown files sort last.
    pub fn position(&self, path: &str) -> usize {
        self.positions.get(path).copied().unwrap_or(usize::MAX)
    }

    pub fn namespace_of(&self, path: &str) -> Option<&str> {
        self.namespaces.get(path).map(String::as_str)
    }

    pub fn files_in_namespace(&self, namespace: &str) -> &[String] {
        self.namespace_index
            .get(&self.key(namespace))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn classes_named(&self, name: &str) -> impl Iterator<Item = &ClassEntry> {
        self.class_index
            .get(&self.key(name))
            .into_iter()
            .flatten()
            .map(|&i| &self.classes[i])
    }

    pub fn class_by_fqcn(&self, qualified: &str) -> Option<&ClassEntry> {
        self.fqcn_index
            .get(&self.key(qualified))
            .map(|&i| &self.classes[i])
    }

    /// Every declaration of `class`, the entry itself first. C# `partial`
    /// types contribute one entry per file.
    pub fn parts_of<'s>(&'s self, class: &'s ClassEntry) -> impl Iterator<Item = &'s ClassEntry> {
        std::iter::once(class).chain(self.classes_named(&class.name).filter(move |c| {
            c.path != class.path && self.same_name(&c.qualified_name, &class.qualified_name)
        }))
    }

    /// Whether `path` can declare members of `class`: one of its own files,
    /// or for Go any file of the same package.
    pub fn declares_members_of(&self, class: &ClassEntry, path: &str) -> bool {
        if self.language == Language::Go {
            return path == class.path
                || self
                    .namespace_of(path)
                    .is_some_and(|ns| self.namespace_of(&class.path) == Some(ns));
        }
        self.parts_of(class).any(|c| c.path == path)
    }

    pub fn method_sites(&self, name: &str) -> &[MethodSite] {
        self.method_index
            .get(&self.key(name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Declared type of a class member (C# fields, properties).
    pub fn member_type(&self, class: &str, member: &str) -> Option<&str> {
        self.var_type_index
            .get(&self.key(class))?
            .get(member)
            .map(String::as_str)
    }

    pub fn go_modules(&self) -> &[GoModule] {
        &self.go_modules
    }

    pub fn ts_paths(&self) -> Option<&TsPaths> {
        self.ts_paths.as_ref()
    }
}

/// Accumulates parse results into a [`ReferenceIndex`].
pub struct IndexBuilder {
    index: ReferenceIndex,
}

impl IndexBuilder {
    fn new(language: Language, repo: Arc<RepoFiles>) -> Self {
        let go_modules = if language == Language::Go {
            load_go_modules(&repo)
        } else {
            Vec::new()
        };
        let ts_paths = if language == Language::TypeScript {
            load_ts_paths(&repo)
        } else {
            None
        };

        Self {
            index: ReferenceIndex {
                language,
                repo,
                files: Vec::new(),
                positions: HashMap::new(),
                namespaces: HashMap::new(),
                classes: Vec::new(),
                class_index: HashMap::new(),
                fqcn_index: HashMap::new(),
                method_index: HashMap::new(),
                var_type_index: HashMap::new(),
                namespace_index: HashMap::new(),
                go_modules,
                ts_paths,
            },
        }
    }

    /// Register a file that failed to parse; it can still be an import
    /// target but declares nothing.
    pub fn add_path(&mut self, path: &str) {
        let index = &mut self.index;
        if index.positions.contains_key(path) {
            return;
        }
        index.positions.insert(path.to_string(), index.files.len());
        index.files.push(path.to_string());
    }

    pub fn add(&mut self, result: &ParseResult) {
        let path = result.file_path.as_str();
        self.add_path(path);

        let namespace = self.namespace_for(result);
        let mut fq_prefixes: Vec<String> = Vec::new();
        if let Some(ns) = &namespace {
            let key = self.index.key(ns);
            let files = self.index.namespace_index.entry(key).or_default();
            if !files.iter().any(|f| f == path) {
                files.push(path.to_string());
            }
            self.index.namespaces.insert(path.to_string(), ns.clone());
            if self.index.language == Language::Go {
                fq_prefixes.push(ns.clone());
            }
        }
        if self.index.language == Language::Python {
            let module = python_module(path);
            if let Some(stripped) = module.strip_prefix("src.") {
                fq_prefixes.push(stripped.to_string());
            }
            fq_prefixes.insert(0, module);
        }

        for class in &result.classes {
            let slot = self.index.classes.len();
            let entry = ClassEntry {
                name: class.name.clone(),
                qualified_name: class.qualified_name.clone(),
                path: path.to_string(),
                kind: class.kind,
                superclass: class.superclass.clone(),
                interfaces: class.interfaces.clone(),
                methods: class.methods.clone(),
            };

            let name_key = self.index.key(&class.name);
            self.index.class_index.entry(name_key).or_default().push(slot);

            let mut qualified = vec![class.qualified_name.clone()];
            for prefix in fq_prefixes.iter().filter(|p| !p.is_empty()) {
                // Go qualifies by package name; swap it for the import path.
                let local = match self.index.language {
                    Language::Go => class.name.as_str(),
                    _ => class.qualified_name.as_str(),
                };
                qualified.push(format!("{}.{}", prefix, local));
            }
            for fq in qualified {
                let key = self.index.key(&fq);
                self.index.fqcn_index.entry(key).or_insert(slot);
            }

            if self.index.language == Language::CSharp {
                let class_key = self.index.key(&class.name);
                let members = self.index.var_type_index.entry(class_key).or_default();
                for property in &class.properties {
                    if let Some(ty) = &property.type_name {
                        members.entry(property.name.clone()).or_insert_with(|| ty.clone());
                    }
                }
            }

            self.index.classes.push(entry);
        }

        for function in &result.functions {
            let site = MethodSite {
                class_name: function.class_name.clone(),
                path: path.to_string(),
                is_static: matches!(function.kind, FunctionKind::Static | FunctionKind::Free),
            };
            let key = self.index.key(&function.name);
            self.index.method_index.entry(key).or_default().push(site);
        }
    }

    pub fn finish(self) -> ReferenceIndex {
        debug!(
            language = %self.index.language,
            files = self.index.files.len(),
            classes = self.index.classes.len(),
            names = self.index.method_index.len(),
            "Reference index built"
        );
        self.index
    }

    fn namespace_for(&self, result: &ParseResult) -> Option<String> {
        let path = result.file_path.as_str();
        match self.index.language {
            Language::Go => Some(go_package_path(&self.index.go_modules, parent_dir(path))),
            Language::Java => result
                .namespace
                .clone()
                .or_else(|| Some(java_inferred_package(path)))
                .filter(|ns| !ns.is_empty()),
            Language::CSharp => result.namespace.clone(),
            Language::Python => {
                let module = python_module(path);
                let package = if base_name(path) == "__init__.py" {
                    module
                } else {
                    module.rsplit_once('.').map(|(p, _)| p.to_string()).unwrap_or_default()
                };
                Some(package)
            }
            Language::TypeScript | Language::Apex => None,
        }
    }
}

/// Import path of the package in `dir`: the governing module path plus the
/// directory below it, or the bare directory without a `go.mod`.
pub fn go_package_path(modules: &[GoModule], dir: &str) -> String {
    let governing = modules
        .iter()
        .filter(|m| m.dir.is_empty() || dir == m.dir || dir.starts_with(&format!("{}/", m.dir)))
        .max_by_key(|m| m.dir.len());
    match governing {
        Some(module) => {
            let rel = dir
                .strip_prefix(module.dir.as_str())
                .unwrap_or(dir)
                .trim_start_matches('/');
            if rel.is_empty() {
                module.path.clone()
            } else {
                format!("{}/{}", module.path, rel)
            }
        }
        None => dir.to_string(),
    }
}

fn java_inferred_package(path: &str) -> String {
    let dir = parent_dir(path);
    let trimmed = JAVA_SOURCE_ROOTS
        .iter()
        .find_map(|root| {
            let root = root.trim_end_matches('/');
            if dir == root {
                Some("")
            } else {
                dir.find(&format!("{}/", root))
                    .map(|i| &dir[i + root.len() + 1..])
            }
        })
        .unwrap_or(dir);
    trimmed.replace('/', ".")
}

fn load_go_modules(repo: &RepoFiles) -> Vec<GoModule> {
    repo.named("go.mod")
        .filter_map(|path| {
            let text = repo.read(path)?;
            Some(GoModule {
                dir: parent_dir(path).to_string(),
                path: go_module_path(&text)?,
            })
        })
        .collect()
}

fn load_ts_paths(repo: &RepoFiles) -> Option<TsPaths> {
    ["tsconfig.json", "jsconfig.json"]
        .iter()
        .filter(|name| repo.exists(name))
        .find_map(|name| TsPaths::parse("", &repo.read(name)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassNode, FunctionNode, PropertyNode, Visibility};

    fn repo(paths: &[&str]) -> Arc<RepoFiles> {
        Arc::new(RepoFiles::in_memory(
            Vec::new(),
            paths.iter().map(|p| p.to_string()),
        ))
    }

    #[test]
    fn test_python_module() {
        assert_eq!(python_module("pkg/sub/mod.py"), "pkg.sub.mod");
        assert_eq!(python_module("pkg/__init__.py"), "pkg");
        assert_eq!(python_module("main.py"), "main");
    }

    #[test]
    fn test_go_package_path() {
        let modules = vec![GoModule {
            dir: String::new(),
            path: "github.com/acme/app".to_string(),
        }];
        assert_eq!(go_package_path(&modules, "pkg/store"), "github.com/acme/app/pkg/store");
        assert_eq!(go_package_path(&modules, ""), "github.com/acme/app");
        assert_eq!(go_package_path(&[], "pkg"), "pkg");
        assert_eq!(
            go_module_path("// x\nmodule github.com/acme/app\n\ngo 1.22\n").as_deref(),
            Some("github.com/acme/app")
        );
    }

    #[test]
    fn test_java_inferred_package() {
        assert_eq!(java_inferred_package("app/src/main/java/com/acme/A.java"), "com.acme");
        assert_eq!(java_inferred_package("src/com/acme/A.java"), "com.acme");
        assert_eq!(java_inferred_package("A.java"), "");
    }

    #[test]
    fn test_ts_paths() {
        let text = r#"{
            // comment
            "compilerOptions": {
                "baseUrl": "./src",
                "paths": { "@app/*": ["app/*"], "config": ["config/index"], },
            }
        }"#;
        let paths = TsPaths::parse("", text).unwrap();
        assert_eq!(paths.base_url.as_deref(), Some("src"));
        assert_eq!(paths.candidates("@app/users"), vec!["src/app/users", "src/@app/users"]);
        assert_eq!(paths.candidates("config"), vec!["src/config/index", "src/config"]);
    }

    #[test]
    fn test_csharp_index_tables() {
        let mut result = ParseResult::new("Data/UserRepository.cs");
        result.namespace = Some("MyApp.Data".to_string());
        let mut class = ClassNode::new("UserRepository", ClassKind::Class, Visibility::Public);
        class.qualified_name = "MyApp.Data.UserRepository".to_string();
        class.add_method("Save");
        class
            .properties
            .push(PropertyNode::new("_db", Visibility::Private).with_type(Some("Db".into())));
        result.add_class(class);
        result.add_function(
            FunctionNode::new("Save", FunctionKind::Instance, Visibility::Public)
                .with_class(Some("UserRepository")),
        );

        let mut builder = ReferenceIndex::builder(Language::CSharp, repo(&["Data/UserRepository.cs"]));
        builder.add(&result);
        let index = builder.finish();

        assert_eq!(index.classes_named("UserRepository").count(), 1);
        assert!(index.class_by_fqcn("MyApp.Data.UserRepository").is_some());
        assert_eq!(index.method_sites("Save")[0].class_name.as_deref(), Some("UserRepository"));
        assert_eq!(index.member_type("UserRepository", "_db"), Some("Db"));
        assert_eq!(index.files_in_namespace("MyApp.Data"), ["Data/UserRepository.cs"]);
    }

    #[test]
    fn test_apex_keys_are_case_insensitive() {
        let mut result = ParseResult::new("classes/AccountService.cls");
        let mut class = ClassNode::new("AccountService", ClassKind::Class, Visibility::Public);
        class.add_method("run");
        result.add_class(class);
        result.add_function(
            FunctionNode::new("run", FunctionKind::Static, Visibility::Public)
                .with_class(Some("AccountService")),
        );

        let mut builder = ReferenceIndex::builder(Language::Apex, repo(&["classes/AccountService.cls"]));
        builder.add(&result);
        let index = builder.finish();

        assert_eq!(index.classes_named("accountservice").count(), 1);
        assert_eq!(index.method_sites("RUN").len(), 1);
        assert!(index.same_name("Run", "run"));
    }
}
