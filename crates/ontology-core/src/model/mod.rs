//! Serialized ontology schema.
//!
//! Field names are a stability contract with the graph loader and the
//! enrichment service: `path`, `importFiles`, `externalImports`,
//! `functions[].calls[].path`, `classes[].methods` and friends must not be
//! renamed.

mod document;
mod entity;
mod file;

pub use document::{
    BuildTool, ConfigFileMetadata, Dependency, LanguageSummary, OntologyDocument,
    ProjectMetaData,
};
pub use entity::{
    CallSite, ClassKind, ClassModifier, ClassNode, FunctionKind, FunctionNode, PropertyNode,
    Visibility,
};
pub use file::{FileNode, ImportBinding, ImportKind, ImportRef};

/// Fields appended in place by the enrichment collaborator.
///
/// The engine never writes them; it only carries them through so that an
/// annotated ontology can be fed back in and re-enriched safely.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Enrichment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Enrichment {
    /// A node is reprocessable until both `description` and `roles` exist.
    pub fn is_missing(&self) -> bool {
        self.description.is_none() || self.roles.is_none()
    }
}
