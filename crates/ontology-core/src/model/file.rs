//! File nodes and their imports.

use serde::{Deserialize, Serialize};

use super::entity::{ClassNode, FunctionNode};
use super::Enrichment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    /// Resolved to a file inside the repository.
    Local,
    /// A package or namespace from outside the repository.
    External,
    /// Looked local (relative path) but no such file exists.
    #[default]
    Unresolved,
}

/// A name an import statement introduces into the importing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    /// Name as written at the use site (`h` in `import { helper as h }`).
    pub local: String,
    /// Symbol imported from the target, `None` when the binding names the
    /// module or package itself.
    pub symbol: Option<String>,
}

impl ImportBinding {
    pub fn module(local: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            symbol: None,
        }
    }

    pub fn symbol(local: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            symbol: Some(symbol.into()),
        }
    }
}

/// One import statement (or one imported module of a multi-import).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRef {
    /// Raw source text: module specifier, package path or namespace.
    pub source: String,
    pub kind: ImportKind,
    pub path: Option<String>,
    #[serde(skip)]
    pub bindings: Vec<ImportBinding>,
    /// Every file the import pulls in (a Go package or Java wildcard spans
    /// several); `path` is the first of them.
    #[serde(skip)]
    pub targets: Vec<String>,
    /// Java `.*`, Python `*`, C# namespace `using`.
    #[serde(skip)]
    pub wildcard: bool,
    /// Java/C# static import of a type's members.
    #[serde(skip)]
    pub is_static: bool,
}

impl ImportRef {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            kind: ImportKind::Unresolved,
            path: None,
            bindings: Vec::new(),
            targets: Vec::new(),
            wildcard: false,
            is_static: false,
        }
    }

    pub fn with_binding(mut self, binding: ImportBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    pub fn wildcard(mut self) -> Self {
        self.wildcard = true;
        self
    }

    /// Mark the import as resolved to one or more repository files.
    pub fn resolve_local(&mut self, targets: Vec<String>) {
        self.path = targets.first().cloned();
        self.kind = if self.path.is_some() {
            ImportKind::Local
        } else {
            ImportKind::External
        };
        self.targets = targets;
    }

    pub fn mark_external(&mut self) {
        self.kind = ImportKind::External;
        self.path = None;
        self.targets.clear();
    }

    pub fn mark_unresolved(&mut self) {
        self.kind = ImportKind::Unresolved;
        self.path = None;
        self.targets.clear();
    }
}

/// A source file and everything extracted from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    /// Repository-relative path with forward slashes; the unique key.
    pub path: String,
    pub language: String,
    pub lines: usize,
    #[serde(default)]
    pub imports: Vec<ImportRef>,
    #[serde(default)]
    pub import_files: Vec<String>,
    #[serde(default)]
    pub external_imports: Vec<String>,
    #[serde(default)]
    pub classes: Vec<ClassNode>,
    #[serde(default)]
    pub functions: Vec<FunctionNode>,
    #[serde(flatten)]
    pub enrichment: Enrichment,
}

impl FileNode {
    pub fn new(path: impl Into<String>, language: impl Into<String>, lines: usize) -> Self {
        Self {
            path: path.into(),
            language: language.into(),
            lines,
            imports: Vec::new(),
            import_files: Vec::new(),
            external_imports: Vec::new(),
            classes: Vec::new(),
            functions: Vec::new(),
            enrichment: Enrichment::default(),
        }
    }

    /// Rebuild `importFiles` and `externalImports` from the resolved imports.
    ///
    /// Both lists keep first-seen order and hold no duplicates. A file never
    /// lists itself as an import target.
    pub fn collect_import_lists(&mut self) {
        self.import_files.clear();
        self.external_imports.clear();

        for import in &self.imports {
            match import.kind {
                ImportKind::Local => {
                    for target in &import.targets {
                        if target != &self.path && !self.import_files.contains(target) {
                            self.import_files.push(target.clone());
                        }
                    }
                }
                _ => {
                    if !self.external_imports.contains(&import.source) {
                        self.external_imports.push(import.source.clone());
                    }
                }
            }
        }
    }

    /// True when the file itself or any class/function still lacks
    /// enrichment.
    pub fn needs_enrichment(&self) -> bool {
        self.enrichment.is_missing()
            || self.classes.iter().any(ClassNode::needs_enrichment)
            || self.functions.iter().any(FunctionNode::needs_enrichment)
    }

    pub fn call_count(&self) -> usize {
        self.functions.iter().map(|f| f.calls.len()).sum()
    }

    pub fn resolved_call_count(&self) -> usize {
        self.functions
            .iter()
            .flat_map(|f| &f.calls)
            .filter(|c| c.path.is_some())
            .count()
    }
}
