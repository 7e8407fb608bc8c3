//! Core analyzer trait for language-agnostic entity extraction.

use super::result::ParseResult;
use crate::language::Language;

/// Per-language extraction capability.
///
/// Implement this trait for each language ecosystem. Each analyzer is
/// responsible for:
///
/// 1. **Entities**: classes (and their kin), functions, methods, properties
/// 2. **References**: imports with the names they bind, direct call sites
///    with receiver expressions and receiver type hints
/// 3. **Metadata**: visibility under the language's default rule, modifier
///    flags, normalized parameter lists
///
/// Analyzers hold no per-file state and are shared across worker threads.
///
/// # Example Implementation
///
/// ```ignore
/// impl LanguageAnalyzer for GoAnalyzer {
///     fn parse_file(&self, path: &str, content: &str) -> Result<ParseResult, String> {
///         let tree = self.base.parse_tree(content)?;
///         // Walk the tree and fill a ParseResult...
///     }
///
///     fn language(&self) -> Language { Language::Go }
///     fn supported_extensions(&self) -> &[&'static str] { &["go"] }
/// }
/// ```
pub trait LanguageAnalyzer: Send + Sync {
    /// Parse a source file and extract entities and unresolved references.
    ///
    /// # Arguments
    /// * `path` - Repository-relative POSIX path
    /// * `content` - Source code content
    ///
    /// # Returns
    /// * `Ok(ParseResult)` - Extracted entities
    /// * `Err(String)` - The file could not be parsed at all
    fn parse_file(&self, path: &str, content: &str) -> Result<ParseResult, String>;

    /// The ecosystem this analyzer belongs to.
    fn language(&self) -> Language;

    /// File extensions this analyzer handles.
    fn supported_extensions(&self) -> &[&'static str];

    /// Check if this analyzer can handle the given file extension.
    fn can_parse(&self, extension: &str) -> bool {
        self.supported_extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}
