//! Call and import resolution against a [`ReferenceIndex`].
//!
//! Calls go through a fixed order and stop at the first step that reaches a
//! verdict:
//!
//! 1. qualified: the receiver or the bare name is bound by an import, or the
//!    receiver is a fully qualified type
//! 2. the receiver's type, when the extractor or the index knows it
//! 3. the receiver read as a class name
//! 4. the bare method name, ranked by proximity to the caller
//!
//! A step that proves the callee lives outside the repository ends the
//! search with `None`.

use std::collections::HashSet;

use super::imports::resolve_import;
use super::index::{ClassEntry, ReferenceIndex};
use super::repo::parent_dir;
use super::types::normalize_type_name;
use crate::language::Language;
use crate::model::{CallSite, ImportBinding, ImportKind, ImportRef};
use crate::parser::ParseResult;

/// Receivers naming the enclosing instance or class.
const SELF_RECEIVERS: &[&str] = &["this", "self", "cls"];
/// Receivers naming the superclass.
const SUPER_RECEIVERS: &[&str] = &["super", "base", "super()"];

/// Outcome of one resolution step.
#[derive(Debug, PartialEq, Eq)]
enum Lookup {
    Found(String),
    /// The callee is known to be outside the repository.
    External,
    /// This step has no opinion.
    Skip,
}

/// What the resolver knows about the caller.
#[derive(Debug, Clone, Copy)]
pub struct CallScope<'a> {
    pub path: &'a str,
    pub namespace: Option<&'a str>,
    pub class_name: Option<&'a str>,
    pub imports: &'a [ImportRef],
}

/// Resolves the references of one file at a time.
pub struct Resolver<'a> {
    index: &'a ReferenceIndex,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a ReferenceIndex) -> Self {
        Self { index }
    }

    /// Resolve every import, then every call, of a parsed file in place.
    pub fn resolve(&self, result: &mut ParseResult) {
        let ParseResult {
            file_path,
            namespace,
            imports,
            functions,
            ..
        } = result;

        let path: &str = file_path.as_str();
        for import in imports.iter_mut() {
            resolve_import(self.index, path, import);
        }

        let imports: &[ImportRef] = imports.as_slice();
        let namespace = self.index.namespace_of(path).or(namespace.as_deref());
        for function in functions.iter_mut() {
            let scope = CallScope {
                path,
                namespace,
                class_name: function.class_name.as_deref(),
                imports,
            };
            for call in function.calls.iter_mut() {
                call.path = self.resolve_call(&scope, call);
            }
        }
    }

    /// Path of the file declaring the callee, or `None`.
    pub fn resolve_call(&self, scope: &CallScope, call: &CallSite) -> Option<String> {
        let steps: [fn(&Self, &CallScope, &CallSite) -> Lookup; 3] = [
            Self::qualified,
            Self::by_receiver_type,
            Self::by_receiver_class,
        ];
        for step in steps {
            match step(self, scope, call) {
                Lookup::Found(path) => return Some(path),
                Lookup::External => return None,
                Lookup::Skip => {}
            }
        }
        self.unscoped(scope, call)
    }

    // ------------------------------------------------------------------
    // Step 1
    // ------------------------------------------------------------------

    fn qualified(&self, scope: &CallScope, call: &CallSite) -> Lookup {
        match call.receiver.as_deref() {
            Some(receiver) => self.qualified_receiver(scope, receiver, &call.name),
            None => self.imported_name(scope, &call.name),
        }
    }

    fn qualified_receiver(&self, scope: &CallScope, receiver: &str, name: &str) -> Lookup {
        if let Some((import, binding)) = binding_for(scope.imports, receiver) {
            if import.kind != ImportKind::Local {
                return Lookup::External;
            }
            let rest = receiver
                .strip_prefix(binding.local.as_str())
                .and_then(|r| r.strip_prefix('.'))
                .filter(|r| !r.is_empty());

            return match (&binding.symbol, rest) {
                // `mod.Class.method()`
                (None, Some(rest)) => match self.class_in(&import.targets, last_segment(rest)) {
                    Some(class) => Lookup::Found(self.member_or_class(class, name)),
                    None => Lookup::Skip,
                },
                (None, None) => self.declaring_target(import, name),
                (Some(symbol), _) => match self.class_in(&import.targets, symbol) {
                    Some(class) => Lookup::Found(self.member_or_class(class, name)),
                    None => self.declaring_target(import, name),
                },
            };
        }

        if receiver.contains('.') {
            if let Some(class) = self.index.class_by_fqcn(receiver) {
                return Lookup::Found(self.member_or_class(class, name));
            }
        }
        Lookup::Skip
    }

    fn imported_name(&self, scope: &CallScope, name: &str) -> Lookup {
        for import in scope.imports {
            let Some(binding) = import
                .bindings
                .iter()
                .find(|b| b.symbol.is_some() && self.index.same_name(&b.local, name))
            else {
                continue;
            };
            if import.kind != ImportKind::Local {
                return Lookup::External;
            }
            let symbol = binding.symbol.as_deref().unwrap_or(name);
            return match self.declaring_target(import, symbol) {
                Lookup::Skip => Lookup::External,
                found => found,
            };
        }

        // Static and wildcard imports bring members in without naming them.
        for import in scope.imports.iter().filter(|i| i.kind == ImportKind::Local) {
            if import.is_static {
                let single = !import.wildcard
                    && import
                        .source
                        .rsplit('.')
                        .next()
                        .is_some_and(|member| self.index.same_name(member, name));
                if single {
                    if let Some(target) = import.targets.first() {
                        return Lookup::Found(target.clone());
                    }
                }
                let owner = import.source.trim_end_matches(".*");
                if let Some(class) = self.index.class_by_fqcn(owner) {
                    if let Some(path) = self.method_in_chain(class, name, &mut HashSet::new()) {
                        return Lookup::Found(path);
                    }
                }
            } else if import.wildcard
                && matches!(self.index.language(), Language::Python | Language::Go)
            {
                if let Some(path) = self.free_function_in(&import.targets, name) {
                    return Lookup::Found(path);
                }
            }
        }
        Lookup::Skip
    }

    /// Target of an import that declares `name`, else the first parsed
    /// target.
    fn declaring_target(&self, import: &ImportRef, name: &str) -> Lookup {
        if let Some(path) = self.free_function_in(&import.targets, name) {
            return Lookup::Found(path);
        }
        if let Some(class) = self.class_in(&import.targets, name) {
            return Lookup::Found(class.path.clone());
        }
        match import.targets.iter().find(|t| self.index.contains_file(t)) {
            Some(first) => Lookup::Found(first.clone()),
            None => Lookup::Skip,
        }
    }

    // ------------------------------------------------------------------
    // Step 2
    // ------------------------------------------------------------------

    fn by_receiver_type(&self, scope: &CallScope, call: &CallSite) -> Lookup {
        let Some(receiver) = call.receiver.as_deref() else {
            return Lookup::Skip;
        };

        let class = if let Some(hint) = call.receiver_type.as_deref() {
            let Some(ty) = normalize_type_name(hint) else {
                return Lookup::Skip;
            };
            match self.find_class(scope, &ty) {
                Some(class) => class,
                None => return Lookup::External,
            }
        } else if SELF_RECEIVERS.iter().any(|s| self.index.same_name(s, receiver)) {
            match self.own_class(scope) {
                Some(class) => class,
                None => return Lookup::Skip,
            }
        } else if SUPER_RECEIVERS.iter().any(|s| self.index.same_name(s, receiver)) {
            let superclass = self
                .own_class(scope)
                .and_then(|own| own.superclass.as_deref())
                .and_then(normalize_type_name);
            let Some(superclass) = superclass else {
                return Lookup::External;
            };
            match self.find_class(scope, &superclass) {
                Some(class) => class,
                None => return Lookup::External,
            }
        } else {
            let member_type = scope
                .class_name
                .and_then(|owner| self.index.member_type(owner, receiver))
                .and_then(normalize_type_name);
            let Some(ty) = member_type else {
                return Lookup::Skip;
            };
            match self.find_class(scope, &ty) {
                Some(class) => class,
                None => return Lookup::External,
            }
        };

        match self.method_in_chain(class, &call.name, &mut HashSet::new()) {
            Some(path) => Lookup::Found(path),
            None => Lookup::External,
        }
    }

    // ------------------------------------------------------------------
    // Step 3
    // ------------------------------------------------------------------

    fn by_receiver_class(&self, scope: &CallScope, call: &CallSite) -> Lookup {
        let Some(receiver) = call.receiver.as_deref() else {
            return Lookup::Skip;
        };
        if !is_identifier_path(receiver) {
            return Lookup::Skip;
        }
        match self.find_class(scope, receiver) {
            Some(class) => Lookup::Found(self.member_or_class(class, &call.name)),
            None => Lookup::Skip,
        }
    }

    // ------------------------------------------------------------------
    // Step 4
    // ------------------------------------------------------------------

    fn unscoped(&self, scope: &CallScope, call: &CallSite) -> Option<String> {
        let sites = self.index.method_sites(&call.name);

        if call.receiver.is_some() {
            return sites
                .iter()
                .filter(|s| s.class_name.is_some())
                .min_by_key(|s| self.rank(scope, &s.path))
                .map(|s| s.path.clone());
        }

        if let Some(own) = self.own_class(scope) {
            if let Some(path) = self.method_in_chain(own, &call.name, &mut HashSet::new()) {
                return Some(path);
            }
        }

        let caller_dir = parent_dir(scope.path);
        let free = sites
            .iter()
            .filter(|s| s.class_name.is_none())
            .filter(|s| self.index.language() != Language::Go || parent_dir(&s.path) == caller_dir)
            .min_by_key(|s| self.rank(scope, &s.path));
        if let Some(site) = free {
            return Some(site.path.clone());
        }

        // `Foo()` / `new Foo()` constructs a class.
        self.index
            .classes_named(&call.name)
            .filter(|c| self.index.language() != Language::Go || parent_dir(&c.path) == caller_dir)
            .min_by_key(|c| self.rank(scope, &c.path))
            .map(|c| c.path.clone())
    }

    // ------------------------------------------------------------------
    // Class and member lookup
    // ------------------------------------------------------------------

    /// Proximity of `path` to the caller: same file, same namespace or
    /// directory, imported, anything else; ties by scan order.
    fn rank(&self, scope: &CallScope, path: &str) -> (u8, usize) {
        let tier = if path == scope.path {
            0
        } else if self.same_package(scope, path) {
            1
        } else if scope.imports.iter().any(|i| i.targets.iter().any(|t| t == path)) {
            2
        } else {
            3
        };
        (tier, self.index.position(path))
    }

    fn same_package(&self, scope: &CallScope, path: &str) -> bool {
        match (scope.namespace, self.index.namespace_of(path)) {
            (Some(a), Some(b)) => self.index.same_name(a, b),
            _ => parent_dir(scope.path) == parent_dir(path),
        }
    }

    fn own_class(&self, scope: &CallScope) -> Option<&'a ClassEntry> {
        let name = scope.class_name?;
        let index = self.index;
        index
            .classes_named(name)
            .find(|c| c.path == scope.path)
            .or_else(|| index.classes_named(name).min_by_key(|c| index.position(&c.path)))
    }

    /// Resolve a type name as written in the caller to a repository class.
    fn find_class(&self, scope: &CallScope, type_name: &str) -> Option<&'a ClassEntry> {
        let index = self.index;

        // Imported by name: `import { Repo } from "./repo"`, `from m import Repo`.
        let (head, tail) = match type_name.split_once('.') {
            Some((head, tail)) => (head, Some(tail)),
            None => (type_name, None),
        };
        if let Some((import, binding)) = binding_for(scope.imports, head) {
            if import.kind != ImportKind::Local {
                return None;
            }
            let wanted = match (tail, &binding.symbol) {
                (Some(tail), _) => last_segment(tail),
                (None, Some(symbol)) => symbol.as_str(),
                (None, None) => return None,
            };
            if let Some(class) = self.class_in(&import.targets, wanted) {
                return Some(class);
            }
        }

        if tail.is_some() {
            if let Some(class) = index.class_by_fqcn(type_name) {
                return Some(class);
            }
        }
        if let Some(ns) = scope.namespace {
            if let Some(class) = index.class_by_fqcn(&format!("{}.{}", ns, type_name)) {
                return Some(class);
            }
        }

        let simple = last_segment(type_name);
        index
            .classes_named(simple)
            .min_by_key(|c| self.rank(scope, &c.path))
    }

    /// Class `name` declared in one of `targets`.
    fn class_in(&self, targets: &[String], name: &str) -> Option<&'a ClassEntry> {
        let index = self.index;
        index
            .classes_named(name)
            .filter(|c| targets.iter().any(|t| t == &c.path))
            .min_by_key(|c| targets.iter().position(|t| t == &c.path))
    }

    fn free_function_in(&self, targets: &[String], name: &str) -> Option<String> {
        let sites = self.index.method_sites(name);
        targets
            .iter()
            .find(|t| sites.iter().any(|s| s.class_name.is_none() && &s.path == *t))
            .cloned()
    }

    /// File declaring `name` on the class, else the class's own file.
    fn member_or_class(&self, class: &ClassEntry, name: &str) -> String {
        self.method_in_chain(class, name, &mut HashSet::new())
            .unwrap_or_else(|| class.path.clone())
    }

    /// Walk the class, then its superclass chain and interfaces.
    fn method_in_chain(
        &self,
        class: &ClassEntry,
        name: &str,
        visited: &mut HashSet<(String, String)>,
    ) -> Option<String> {
        if !visited.insert((class.path.clone(), class.qualified_name.clone())) {
            return None;
        }

        let declared = self
            .index
            .method_sites(name)
            .iter()
            .filter(|s| {
                s.class_name
                    .as_deref()
                    .is_some_and(|owner| self.index.same_name(owner, &class.name))
            })
            .filter(|s| self.index.declares_members_of(class, &s.path))
            .min_by_key(|s| s.path != class.path);
        if let Some(site) = declared {
            return Some(site.path.clone());
        }
        if let Some(part) = self
            .index
            .parts_of(class)
            .find(|c| c.methods.iter().any(|m| self.index.same_name(m, name)))
        {
            return Some(part.path.clone());
        }

        let scope = CallScope {
            path: &class.path,
            namespace: self.index.namespace_of(&class.path),
            class_name: None,
            imports: &[],
        };
        let parents: Vec<&String> = self
            .index
            .parts_of(class)
            .flat_map(|c| c.superclass.iter().chain(c.interfaces.iter()))
            .collect();
        for parent in parents {
            let Some(parent) = normalize_type_name(parent) else {
                continue;
            };
            if let Some(entry) = self.find_class(&scope, &parent) {
                if let Some(path) = self.method_in_chain(entry, name, visited) {
                    return Some(path);
                }
            }
        }
        None
    }
}

/// The import binding a receiver expression starts with.
fn binding_for<'i>(imports: &'i [ImportRef], receiver: &str) -> Option<(&'i ImportRef, &'i ImportBinding)> {
    imports.iter().find_map(|import| {
        import
            .bindings
            .iter()
            .find(|b| {
                receiver == b.local
                    || receiver
                        .strip_prefix(b.local.as_str())
                        .is_some_and(|rest| rest.starts_with('.'))
            })
            .map(|b| (import, b))
    })
}

fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// `a`, `a.B` but not `a().b` or `items[0]`.
fn is_identifier_path(text: &str) -> bool {
    !text.is_empty()
        && text
            .split('.')
            .all(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$'))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::parser::{AnalyzerRegistry, LanguageAnalyzer};
    use crate::resolve::RepoFiles;

    /// Parse, index and resolve an in-memory repository of one language.
    fn resolve_all(language: Language, files: &[(&str, &str)]) -> Vec<ParseResult> {
        let registry = AnalyzerRegistry::new();
        let repo = Arc::new(RepoFiles::in_memory(
            files.iter().map(|(p, t)| (p.to_string(), t.to_string())),
            Vec::new(),
        ));
        let analyzer = registry.for_language(language).unwrap();
        let mut results: Vec<ParseResult> = files
            .iter()
            .filter(|(p, _)| analyzer.can_parse(p.rsplit('.').next().unwrap_or("")))
            .map(|(p, t)| analyzer.parse_file(p, t).unwrap())
            .collect();

        let mut builder = ReferenceIndex::builder(language, repo);
        for result in &results {
            builder.add(result);
        }
        let index = builder.finish();
        let resolver = Resolver::new(&index);
        for result in &mut results {
            resolver.resolve(result);
        }
        results
    }

    fn call_path<'r>(results: &'r [ParseResult], function: &str, call: &str) -> Option<&'r str> {
        results
            .iter()
            .flat_map(|r| &r.functions)
            .filter(|f| f.name == function)
            .flat_map(|f| &f.calls)
            .find(|c| c.name == call)
            .and_then(|c| c.path.as_deref())
    }

    #[test]
    fn test_go_same_package_call() {
        let results = resolve_all(
            Language::Go,
            &[
                ("go.mod", "module example.com/app\n"),
                ("pkg/a.go", "package pkg\n\nfunc Foo() { bar() }\n"),
                ("pkg/b.go", "package pkg\n\nfunc bar() {}\n"),
                ("other/c.go", "package other\n\nfunc bar() {}\n"),
            ],
        );
        assert_eq!(call_path(&results, "Foo", "bar"), Some("pkg/b.go"));
    }

    #[test]
    fn test_go_method_declared_apart_from_struct() {
        let results = resolve_all(
            Language::Go,
            &[
                ("go.mod", "module example.com/app\n"),
                ("store/repo.go", "package store\n\ntype Repo struct{}\n"),
                ("store/repo_save.go", "package store\n\nfunc (r *Repo) Save() {}\n"),
                (
                    "store/run.go",
                    "package store\n\nfunc Run() {\n\trepo := &Repo{}\n\trepo.Save()\n}\n",
                ),
                ("other/repo.go", "package other\n\ntype Repo struct{}\n\nfunc (r Repo) Save() {}\n"),
            ],
        );
        assert_eq!(call_path(&results, "Run", "Save"), Some("store/repo_save.go"));
    }

    #[test]
    fn test_csharp_partial_class_method_in_other_file() {
        let results = resolve_all(
            Language::CSharp,
            &[
                (
                    "Data/Repo.cs",
                    "namespace App.Data {\n  public partial class Repo : Base {\n    public int Count;\n  }\n}\n",
                ),
                (
                    "Data/Repo.Save.cs",
                    "namespace App.Data {\n  public partial class Repo {\n    public void Save() {}\n  }\n}\n",
                ),
                (
                    "Data/Base.cs",
                    "namespace App.Data {\n  public class Base {\n    public void Close() {}\n  }\n}\n",
                ),
                (
                    "Services/Worker.cs",
                    "using App.Data;\nnamespace App.Services {\n  public class Worker {\n    public void Run() {\n      var repo = new Repo();\n      repo.Save();\n      repo.Close();\n    }\n  }\n}\n",
                ),
            ],
        );
        assert_eq!(call_path(&results, "Run", "Save"), Some("Data/Repo.Save.cs"));
        assert_eq!(call_path(&results, "Run", "Close"), Some("Data/Base.cs"));
    }

    #[test]
    fn test_go_package_call_prefers_declaring_file() {
        let results = resolve_all(
            Language::Go,
            &[
                ("go.mod", "module example.com/app\n"),
                (
                    "main.go",
                    "package main\n\nimport (\n\t\"fmt\"\n\t\"example.com/app/store\"\n)\n\nfunc main() {\n\tstore.Open()\n\tfmt.Println()\n}\n",
                ),
                ("store/a.go", "package store\n\ntype DB struct{}\n"),
                ("store/open.go", "package store\n\nfunc Open() *DB { return nil }\n"),
            ],
        );
        assert_eq!(call_path(&results, "main", "Open"), Some("store/open.go"));
        assert_eq!(call_path(&results, "main", "Println"), None);
        assert_eq!(results[0].imports[1].path.as_deref(), Some("store/a.go"));
    }

    #[test]
    fn test_csharp_var_type_prefers_declaring_class() {
        let results = resolve_all(
            Language::CSharp,
            &[
                (
                    "Services/UserService.cs",
                    "namespace App.Services {\n  public class UserService {\n    public void Register() {\n      var repo = new UserRepository();\n      repo.Save();\n    }\n  }\n}\n",
                ),
                (
                    "Audit/AuditLog.cs",
                    "namespace App.Audit {\n  public class AuditLog {\n    public void Save() {}\n  }\n}\n",
                ),
                (
                    "Data/UserRepository.cs",
                    "namespace App.Data {\n  public class UserRepository {\n    public void Save() {}\n  }\n}\n",
                ),
            ],
        );
        assert_eq!(call_path(&results, "Register", "Save"), Some("Data/UserRepository.cs"));
        assert_eq!(
            call_path(&results, "Register", "UserRepository"),
            Some("Data/UserRepository.cs")
        );
    }

    #[test]
    fn test_undeclared_call_is_null() {
        let results = resolve_all(
            Language::Python,
            &[("app/main.py", "def run():\n    doesNotExist()\n")],
        );
        let run = &results[0].functions[0];
        assert_eq!(run.calls[0].name, "doesNotExist");
        assert_eq!(run.calls[0].path, None);
    }

    #[test]
    fn test_ts_imported_function() {
        let results = resolve_all(
            Language::TypeScript,
            &[
                (
                    "src/index.ts",
                    "import { helper } from \"./utils\";\nimport axios from \"axios\";\n\nexport function main() {\n  helper();\n  axios.get(\"/\");\n}\n",
                ),
                ("src/utils.ts", "export function helper() {}\n"),
                ("src/other.ts", "export function get() {}\n"),
            ],
        );
        assert_eq!(call_path(&results, "main", "helper"), Some("src/utils.ts"));
        assert_eq!(call_path(&results, "main", "get"), None);
    }

    #[test]
    fn test_python_self_member_and_inherited_method() {
        let results = resolve_all(
            Language::Python,
            &[
                (
                    "app/base.py",
                    "class Base:\n    def close(self):\n        pass\n",
                ),
                (
                    "app/repo.py",
                    "from app.base import Base\n\nclass Repo(Base):\n    def save(self):\n        pass\n",
                ),
                (
                    "app/service.py",
                    "from app.repo import Repo\n\nclass Service:\n    def __init__(self):\n        self.repo = Repo()\n\n    def run(self):\n        self.repo.save()\n        self.repo.close()\n        self.stop()\n\n    def stop(self):\n        pass\n",
                ),
            ],
        );
        assert_eq!(call_path(&results, "run", "save"), Some("app/repo.py"));
        assert_eq!(call_path(&results, "run", "close"), Some("app/base.py"));
        assert_eq!(call_path(&results, "run", "stop"), Some("app/service.py"));
        assert_eq!(call_path(&results, "__init__", "Repo"), Some("app/repo.py"));
    }

    #[test]
    fn test_java_static_class_call_and_superclass_chain() {
        let results = resolve_all(
            Language::Java,
            &[
                (
                    "src/main/java/com/acme/util/Strings.java",
                    "package com.acme.util;\npublic class Strings {\n  public static String trim(String s) { return s; }\n}\n",
                ),
                (
                    "src/main/java/com/acme/BaseService.java",
                    "package com.acme;\npublic abstract class BaseService {\n  protected void log(String m) {}\n}\n",
                ),
                (
                    "src/main/java/com/acme/UserService.java",
                    "package com.acme;\nimport com.acme.util.Strings;\npublic class UserService extends BaseService {\n  void create(String n) {\n    Strings.trim(n);\n    log(n);\n    this.log(n);\n  }\n}\n",
                ),
            ],
        );
        let base = "src/main/java/com/acme/BaseService.java";
        assert_eq!(
            call_path(&results, "create", "trim"),
            Some("src/main/java/com/acme/util/Strings.java")
        );
        let create = results
            .iter()
            .flat_map(|r| &r.functions)
            .find(|f| f.name == "create")
            .unwrap();
        assert_eq!(create.calls[1].path.as_deref(), Some(base));
        assert_eq!(create.calls[2].path.as_deref(), Some(base));
    }

    #[test]
    fn test_apex_case_insensitive_class_call() {
        let results = resolve_all(
            Language::Apex,
            &[
                (
                    "classes/AccountHandler.cls",
                    "public class AccountHandler {\n  public static void Run() {}\n}\n",
                ),
                (
                    "triggers/AccountTrigger.trigger",
                    "trigger AccountTrigger on Account (before insert) {\n  accounthandler.run();\n}\n",
                ),
            ],
        );
        assert_eq!(
            call_path(&results, "AccountTrigger", "run"),
            Some("classes/AccountHandler.cls")
        );
    }

    #[test]
    fn test_is_identifier_path() {
        assert!(is_identifier_path("Strings"));
        assert!(is_identifier_path("models.User"));
        assert!(!is_identifier_path("get().x"));
        assert!(!is_identifier_path("items[0]"));
    }
}
