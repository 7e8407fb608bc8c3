use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use ontology_core::{
    ChangeFilter, Config, FailureStage, FileNode, ImportKind, OntologyBuilder, OntologyDocument, OntologyError,
    SourceText, Visibility,
};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A small repository touching every language the scenarios need.
fn polyglot_repo() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    write(root, "go.mod", "module example.com/app\n\ngo 1.22\n\nrequire github.com/google/uuid v1.6.0\n");
    write(root, "pkg/a.go", "package pkg\n\nfunc Foo() {\n\tbar()\n}\n");
    write(root, "pkg/b.go", "package pkg\n\nfunc bar() {}\n\nfunc Bar() {}\n");

    write(
        root,
        "web/src/index.ts",
        "import { helper } from \"./utils\";\nimport axios from \"axios\";\n\nexport function main() {\n  helper();\n  axios.get(\"/\");\n}\n",
    );
    write(root, "web/src/utils.ts", "export function helper() {}\n");
    write(root, "web/package.json", r#"{"dependencies":{"axios":"^1.6.0"}}"#);

    write(
        root,
        "dotnet/Services/UserService.cs",
        "namespace App.Services {\n  public class UserService {\n    int attempts;\n    public void Register() {\n      var repo = new UserRepository();\n      repo.Save();\n    }\n  }\n}\n",
    );
    write(
        root,
        "dotnet/Audit/AuditLog.cs",
        "namespace App.Audit {\n  public class AuditLog {\n    public void Save() {}\n  }\n}\n",
    );
    write(
        root,
        "dotnet/Data/UserRepository.cs",
        "namespace App.Data {\n  public class UserRepository {\n    public void Save() {}\n  }\n}\n",
    );

    write(root, "scripts/run.py", "def run():\n    doesNotExist()\n");

    write(
        root,
        "java/src/main/java/com/acme/Counter.java",
        "package com.acme;\n\nclass Counter {\n  int count;\n  void increment() { count++; }\n}\n",
    );

    write(root, "web/node_modules/axios/index.js", "module.exports = {};\n");
    write(root, "README.md", "# demo\n");
    temp
}

fn sequential() -> Config {
    let mut config = Config::default();
    config.parallel.enabled = false;
    config
}

fn file<'d>(document: &'d OntologyDocument, path: &str) -> &'d FileNode {
    document
        .file(path)
        .unwrap_or_else(|| panic!("{} missing from document", path))
}

fn call_path<'d>(file: &'d FileNode, function: &str, call: &str) -> Option<&'d str> {
    file.functions
        .iter()
        .filter(|f| f.name == function)
        .flat_map(|f| &f.calls)
        .find(|c| c.name == call)
        .and_then(|c| c.path.as_deref())
}

#[test]
fn test_go_same_package_call() {
    let temp = polyglot_repo();
    let document = OntologyBuilder::new(sequential()).build(temp.path()).unwrap();

    let a = file(&document, "pkg/a.go");
    assert_eq!(call_path(a, "Foo", "bar"), Some("pkg/b.go"));

    let b = file(&document, "pkg/b.go");
    let visibility: HashMap<&str, Visibility> = b
        .functions
        .iter()
        .map(|f| (f.name.as_str(), f.visibility))
        .collect();
    assert_eq!(visibility["bar"], Visibility::Private);
    assert_eq!(visibility["Bar"], Visibility::Public);
}

#[test]
fn test_ts_relative_import_lands_in_import_files() {
    let temp = polyglot_repo();
    let document = OntologyBuilder::new(sequential()).build(temp.path()).unwrap();

    let index = file(&document, "web/src/index.ts");
    assert_eq!(index.language, "typescript");
    assert!(index.import_files.contains(&"web/src/utils.ts".to_string()));
    assert_eq!(index.external_imports, vec!["axios"]);
    assert_eq!(index.imports[1].kind, ImportKind::External);
    assert_eq!(call_path(index, "main", "helper"), Some("web/src/utils.ts"));
    assert!(document.file("web/node_modules/axios/index.js").is_none());
}

#[test]
fn test_csharp_inferred_receiver_type() {
    let temp = polyglot_repo();
    let document = OntologyBuilder::new(sequential()).build(temp.path()).unwrap();

    let service = file(&document, "dotnet/Services/UserService.cs");
    assert_eq!(
        call_path(service, "Register", "Save"),
        Some("dotnet/Data/UserRepository.cs")
    );
    let attempts = service.classes[0]
        .properties
        .iter()
        .find(|p| p.name == "attempts")
        .unwrap();
    assert_eq!(attempts.visibility, Visibility::Private);
}

#[test]
fn test_unresolvable_call_has_null_path() {
    let temp = polyglot_repo();
    let document = OntologyBuilder::new(sequential()).build(temp.path()).unwrap();

    let run = file(&document, "scripts/run.py");
    let call = &run.functions[0].calls[0];
    assert_eq!(call.name, "doesNotExist");
    assert_eq!(call.path, None);

    let json = document.to_json(&Default::default()).unwrap();
    assert!(json.contains(r#"{"name":"doesNotExist","path":null}"#));
}

#[test]
fn test_java_default_visibility_is_package() {
    let temp = polyglot_repo();
    let document = OntologyBuilder::new(sequential()).build(temp.path()).unwrap();

    let counter = file(&document, "java/src/main/java/com/acme/Counter.java");
    let class = &counter.classes[0];
    assert_eq!(class.visibility, Visibility::Package);
    assert_eq!(class.properties[0].visibility, Visibility::Package);
    assert_eq!(counter.functions[0].visibility, Visibility::Package);
}

#[test]
fn test_document_metadata() {
    let temp = polyglot_repo();
    let document = OntologyBuilder::new(sequential())
        .with_name("polyglot")
        .build(temp.path())
        .unwrap();
    let meta = &document.project_meta_data;

    assert_eq!(meta.name, "polyglot");
    assert_eq!(meta.total_files, 9);
    assert_eq!(meta.total_files, document.files.len());
    assert_eq!(meta.languages["go"].files, 2);
    assert_eq!(meta.languages["csharp"].classes, 3);
    let lines: usize = document.files.iter().map(|f| f.lines).sum();
    assert_eq!(meta.total_lines, lines);

    let tools: Vec<&str> = meta.build_tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tools, vec!["go", "npm"]);
    assert!(meta.dependencies.iter().any(|d| d.name == "axios" && d.ecosystem == "npm"));
}

#[test]
fn test_paths_are_relative_and_calls_point_at_files() {
    let temp = polyglot_repo();
    let document = OntologyBuilder::new(sequential()).build(temp.path()).unwrap();

    let paths: HashSet<&str> = document.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths.len(), document.files.len());
    for path in &paths {
        assert!(!path.starts_with('/'));
        assert!(!path.contains('\\'));
    }

    for file in &document.files {
        for call in file.functions.iter().flat_map(|f| &f.calls) {
            if let Some(target) = &call.path {
                assert!(paths.contains(target.as_str()), "{} -> {}", file.path, target);
            }
        }
        for target in &file.import_files {
            assert!(paths.contains(target.as_str()), "{} imports {}", file.path, target);
        }
    }
}

#[test]
fn test_reprocessing_is_idempotent() {
    let temp = polyglot_repo();
    let builder = OntologyBuilder::new(sequential());
    let first = builder.build(temp.path()).unwrap();
    let second = builder.build(temp.path()).unwrap();
    assert_eq!(first.files, second.files);

    let reread = OntologyDocument::from_json(&first.to_json(&Default::default()).unwrap()).unwrap();
    assert_eq!(reread.files.len(), first.files.len());
    assert!(reread.pending_enrichment().count() > 0);
}

#[test]
fn test_worker_pool_matches_sequential() {
    let temp = polyglot_repo();
    let sequential_doc = OntologyBuilder::new(sequential()).build(temp.path()).unwrap();

    let mut config = Config::default();
    config.parallel.enabled = true;
    config.parallel.workers = Some(3);
    config.parallel.min_files = 1;
    let parallel_doc = OntologyBuilder::new(config).build(temp.path()).unwrap();

    assert_eq!(sequential_doc.files, parallel_doc.files);
}

#[test]
fn test_prior_hashes_skip_unchanged_files() {
    let temp = polyglot_repo();
    let first = OntologyBuilder::new(sequential()).run(temp.path()).unwrap();
    assert_eq!(first.hashes.len(), 9);

    let prior: HashMap<String, String> = first.hashes.clone().into_iter().collect();
    let saved = serde_json::to_string(&first.hashes).unwrap();
    let unchanged = OntologyBuilder::new(sequential())
        .with_change_filter(ChangeFilter::from_json(&saved).unwrap())
        .run(temp.path())
        .unwrap();
    assert!(unchanged.document.files.is_empty());
    assert_eq!(unchanged.document.project_meta_data.languages["go"].unchanged_files, 2);

    write(temp.path(), "pkg/a.go", "package pkg\n\nfunc Foo() {\n\tbar()\n\tBar()\n}\n");
    let partial = OntologyBuilder::new(sequential())
        .with_prior_hashes(prior)
        .run(temp.path())
        .unwrap();
    let paths: Vec<&str> = partial.document.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["pkg/a.go"]);
    // Unchanged files are still indexed, so the call resolves.
    assert_eq!(call_path(&partial.document.files[0], "Foo", "bar"), Some("pkg/b.go"));
    assert_ne!(partial.hashes["pkg/a.go"], first.hashes["pkg/a.go"]);
}

#[test]
fn test_incremental_calls_point_at_indexed_files() {
    let temp = polyglot_repo();
    let full = OntologyBuilder::new(sequential()).run(temp.path()).unwrap();
    let prior: HashMap<String, String> = full.hashes.clone().into_iter().collect();

    write(temp.path(), "pkg/a.go", "package pkg\n\nfunc Foo() {\n\tbar()\n\tBar()\n}\n");
    let partial = OntologyBuilder::new(sequential())
        .with_prior_hashes(prior)
        .run(temp.path())
        .unwrap();

    let present: HashSet<&str> = partial.document.files.iter().map(|f| f.path.as_str()).collect();
    let targets: Vec<&str> = partial
        .document
        .files
        .iter()
        .flat_map(|f| &f.functions)
        .flat_map(|f| &f.calls)
        .filter_map(|c| c.path.as_deref())
        .collect();
    assert_eq!(targets, vec!["pkg/b.go", "pkg/b.go"]);
    for target in targets {
        assert!(partial.hashes.contains_key(target));
        assert!(!present.contains(target));
    }
}

#[test]
fn test_oversize_files_are_reported() {
    let temp = polyglot_repo();
    write(temp.path(), "scripts/huge.py", &"x = 1\n".repeat(400));

    let mut config = sequential();
    config.scan.max_file_size = 1024;
    let output = OntologyBuilder::new(config).run(temp.path()).unwrap();

    assert!(output.document.file("scripts/huge.py").is_none());
    let failure = output
        .failures
        .iter()
        .find(|f| f.path == "scripts/huge.py")
        .unwrap();
    assert_eq!(failure.stage, FailureStage::Oversize);
    assert_eq!(output.document.project_meta_data.languages["python"].failed_files, 1);
}

#[test]
fn test_build_from_sources_normalizes_paths() {
    let builder = OntologyBuilder::new(sequential());
    let sources = vec![SourceText::new(
        "web\\src\\index.ts",
        "import { helper } from \"./utils\";\n\nexport function main() {\n  helper();\n}\n",
    )];
    let skeleton = vec![
        "web\\src\\index.ts".to_string(),
        "web\\src\\utils.ts".to_string(),
    ];

    let output = builder.build_from_sources("diff", sources, skeleton).unwrap();
    let document = &output.document;

    assert_eq!(document.files.len(), 1);
    let index = &document.files[0];
    assert_eq!(index.path, "web/src/index.ts");
    assert_eq!(index.import_files, vec!["web/src/utils.ts"]);
    assert!(output.hashes.contains_key("web/src/index.ts"));
}

#[test]
fn test_fatal_errors() {
    let builder = OntologyBuilder::new(sequential());

    let missing = builder.build("/definitely/not/a/repo");
    assert!(matches!(missing, Err(OntologyError::RepositoryNotFound(_))));

    let temp = TempDir::new().unwrap();
    write(temp.path(), "README.md", "# nothing to parse\n");
    let empty = builder.build(temp.path());
    assert!(matches!(empty, Err(OntologyError::NoRecognizedFiles(_))));

    let mut config = Config::default();
    config.scan.languages.clear();
    let invalid = OntologyBuilder::new(config).build(temp.path());
    assert!(matches!(invalid, Err(OntologyError::Config(_))));
}

#[test]
fn test_language_selection() {
    let temp = polyglot_repo();
    let mut config = sequential();
    config.scan.languages = vec![ontology_core::Language::Python];
    let document = OntologyBuilder::new(config).build(temp.path()).unwrap();

    assert_eq!(document.files.len(), 1);
    assert_eq!(document.files[0].path, "scripts/run.py");
}

#[tokio::test]
async fn test_build_async() {
    let temp = polyglot_repo();
    let output = OntologyBuilder::new(sequential())
        .build_async(temp.path().to_path_buf())
        .await
        .unwrap();
    assert_eq!(output.document.files.len(), 9);
    assert!(output.failures.is_empty());
}
