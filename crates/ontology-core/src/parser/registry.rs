//! Analyzer registry for managing language-specific analyzers.

use std::collections::HashMap;
use std::sync::Arc;

use super::apex::ApexAnalyzer;
use super::csharp::CSharpAnalyzer;
use super::go::GoAnalyzer;
use super::java::JavaAnalyzer;
use super::python::PythonAnalyzer;
use super::traits::LanguageAnalyzer;
use super::typescript::TypeScriptAnalyzer;
use crate::language::Language;

/// Registry of language analyzers.
///
/// Maps file extensions to their respective analyzers. The pipeline picks
/// an analyzer here, by extension, and never by looking at parsed nodes.
pub struct AnalyzerRegistry {
    /// Extension to analyzer mapping.
    by_extension: HashMap<String, Arc<dyn LanguageAnalyzer>>,
    /// Ecosystem to analyzer mapping.
    by_language: HashMap<Language, Arc<dyn LanguageAnalyzer>>,
}

impl AnalyzerRegistry {
    /// Create a new registry with all built-in analyzers.
    pub fn new() -> Self {
        let mut registry = Self {
            by_extension: HashMap::new(),
            by_language: HashMap::new(),
        };

        registry.register(Arc::new(GoAnalyzer::new()));
        registry.register(Arc::new(JavaAnalyzer::new()));
        registry.register(Arc::new(PythonAnalyzer::new()));
        registry.register(Arc::new(TypeScriptAnalyzer::new()));
        registry.register(Arc::new(CSharpAnalyzer::new()));
        registry.register(Arc::new(ApexAnalyzer::new()));

        registry
    }

    /// Register an analyzer for its supported extensions.
    pub fn register(&mut self, analyzer: Arc<dyn LanguageAnalyzer>) {
        for ext in analyzer.supported_extensions() {
            self.by_extension
                .insert(ext.to_lowercase(), Arc::clone(&analyzer));
        }
        self.by_language.insert(analyzer.language(), analyzer);
    }

    /// Get an analyzer for the given file extension.
    pub fn for_extension(&self, extension: &str) -> Option<Arc<dyn LanguageAnalyzer>> {
        self.by_extension.get(&extension.to_lowercase()).cloned()
    }

    /// Get an analyzer for the given file path.
    pub fn for_path(&self, path: &str) -> Option<Arc<dyn LanguageAnalyzer>> {
        std::path::Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|ext| self.for_extension(ext))
    }

    /// Get the analyzer for an ecosystem.
    pub fn for_language(&self, language: Language) -> Option<Arc<dyn LanguageAnalyzer>> {
        self.by_language.get(&language).cloned()
    }

    /// Check if any analyzer can handle the given extension.
    pub fn can_parse(&self, extension: &str) -> bool {
        self.by_extension.contains_key(&extension.to_lowercase())
    }
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
