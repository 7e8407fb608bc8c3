//! Multi-language repository ontology extraction.
//!
//! Turns a source repository into a JSON graph of files, their declared
//! types, functions and methods, and the import and call edges between them.
//!
//! # Components
//!
//! - [`parser`] - tree-sitter entity extractors, one per language ecosystem
//! - [`resolve`] - reference index and the import/call resolver
//! - [`pipeline`] - change filter, scheduler, merge engine and the
//!   [`OntologyBuilder`] entry point
//! - [`model`] - the serialized ontology schema
//!
//! # Example
//!
//! ```ignore
//! use ontology_core::{Config, OntologyBuilder};
//!
//! let document = OntologyBuilder::new(Config::load()?).build("./repo")?;
//! println!("{}", document.to_json(&Default::default())?);
//! ```

pub mod config;
pub mod error;
pub mod language;
pub mod logging;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod resolve;

pub use config::Config;
pub use error::{OntologyError, Result};
pub use language::Language;
pub use model::{
    CallSite, ClassKind, ClassModifier, ClassNode, FileNode, FunctionKind, FunctionNode,
    ImportKind, ImportRef, OntologyDocument, ProjectMetaData, PropertyNode, Visibility,
};
pub use pipeline::{
    BuildOutput, ChangeFilter, FailureStage, FileFailure, LanguageOutcome, OntologyBuilder,
    SourceText,
};
