//! Per-language entity extraction.
//!
//! Every analyzer turns one source file into a [`ParseResult`] of classes,
//! functions and imports in the shared model. Calls carry their receiver
//! text and, where the extractor could infer it, the receiver's type; the
//! resolver turns those into file paths.
//!
//! ## Supported Languages
//!
//! - Go
//! - Java
//! - Python
//! - TypeScript/JavaScript
//! - C#
//! - Apex (parsed with the Java grammar after masking)

mod apex;
mod csharp;
mod go;
mod java;
mod python;
mod registry;
mod result;
mod traits;
mod treesitter;
mod typescript;

pub use apex::ApexAnalyzer;
pub use csharp::CSharpAnalyzer;
pub use go::GoAnalyzer;
pub use java::JavaAnalyzer;
pub use python::PythonAnalyzer;
pub use registry::AnalyzerRegistry;
pub use result::{ParseResult, ParseStats};
pub use traits::LanguageAnalyzer;
pub use treesitter::count_lines;
pub use typescript::TypeScriptAnalyzer;
