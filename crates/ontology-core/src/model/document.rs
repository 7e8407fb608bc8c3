//! The top-level ontology document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::file::FileNode;
use crate::config::OutputConfig;
use crate::error::Result;

/// A build tool detected from a well-known config filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTool {
    pub name: String,
    /// Repository-relative path of the file that revealed it.
    pub file: String,
}

/// A declared third-party dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub version: Option<String>,
    /// Package ecosystem: `go`, `npm`, `maven`, `gradle`, `pypi`, `nuget`,
    /// `salesforce`.
    pub ecosystem: String,
    pub file: String,
}

/// Metadata for one config file, produced by the external config extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFileMetadata {
    pub path: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Per-language counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageSummary {
    pub files: usize,
    pub classes: usize,
    pub functions: usize,
    pub failed_files: usize,
    pub unchanged_files: usize,
}

/// Repository-wide aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetaData {
    pub name: String,
    pub generated_at: DateTime<Utc>,
    pub total_files: usize,
    pub total_classes: usize,
    pub total_functions: usize,
    pub total_lines: usize,
    pub total_calls: usize,
    pub resolved_calls: usize,
    #[serde(default)]
    pub languages: BTreeMap<String, LanguageSummary>,
    #[serde(default)]
    pub build_tools: Vec<BuildTool>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub config_files: Vec<ConfigFileMetadata>,
}

impl ProjectMetaData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generated_at: Utc::now(),
            total_files: 0,
            total_classes: 0,
            total_functions: 0,
            total_lines: 0,
            total_calls: 0,
            resolved_calls: 0,
            languages: BTreeMap::new(),
            build_tools: Vec::new(),
            dependencies: Vec::new(),
            config_files: Vec::new(),
        }
    }
}

/// The merged ontology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OntologyDocument {
    pub project_meta_data: ProjectMetaData,
    pub files: Vec<FileNode>,
}

/// Accepts the current document shape or the legacy bare file array.
#[derive(Deserialize)]
#[serde(untagged)]
enum AnyDocument {
    Document(OntologyDocument),
    Legacy(Vec<FileNode>),
}

impl OntologyDocument {
    /// Parse either document form. A legacy array gets empty metadata.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(match serde_json::from_str::<AnyDocument>(json)? {
            AnyDocument::Document(doc) => doc,
            AnyDocument::Legacy(files) => OntologyDocument {
                project_meta_data: ProjectMetaData::new(""),
                files,
            },
        })
    }

    /// Serialize according to the `[output]` configuration.
    pub fn to_json(&self, output: &OutputConfig) -> Result<String> {
        let json = match (output.legacy_array, output.pretty) {
            (true, true) => serde_json::to_string_pretty(&self.files)?,
            (true, false) => serde_json::to_string(&self.files)?,
            (false, true) => serde_json::to_string_pretty(self)?,
            (false, false) => serde_json::to_string(self)?,
        };
        Ok(json)
    }

    /// Look up a file by its path key.
    pub fn file(&self, path: &str) -> Option<&FileNode> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Files that still have nodes without enrichment.
    pub fn pending_enrichment(&self) -> impl Iterator<Item = &FileNode> {
        self.files.iter().filter(|f| f.needs_enrichment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_legacy_array() {
        let doc = OntologyDocument::from_json(r#"[{"path":"a.py","language":"python","lines":2}]"#)
            .unwrap();
        assert_eq!(doc.files.len(), 1);
        assert_eq!(doc.files[0].path, "a.py");
    }

    #[test]
    fn test_document_round_trip() {
        let mut doc = OntologyDocument {
            project_meta_data: ProjectMetaData::new("demo"),
            files: vec![FileNode::new("main.go", "go", 10)],
        };
        doc.project_meta_data.total_files = 1;

        let json = doc.to_json(&OutputConfig::default()).unwrap();
        assert!(json.contains("\"projectMetaData\""));
        assert!(json.contains("\"importFiles\""));

        let parsed = OntologyDocument::from_json(&json).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_legacy_output() {
        let doc = OntologyDocument {
            project_meta_data: ProjectMetaData::new("demo"),
            files: vec![FileNode::new("main.go", "go", 10)],
        };
        let output = OutputConfig {
            legacy_array: true,
            pretty: false,
        };
        let json = doc.to_json(&output).unwrap();
        assert!(json.starts_with('['));
    }
}
