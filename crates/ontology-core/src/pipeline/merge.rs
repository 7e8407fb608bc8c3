//! Cross-language merge: one document from every language's results.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::manifest;
use crate::language::Language;
use crate::model::{ConfigFileMetadata, FileNode, LanguageSummary, OntologyDocument, ProjectMetaData};
use crate::parser::count_lines;
use crate::resolve::RepoFiles;

/// Where a file dropped out of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Read,
    Oversize,
    Parse,
    Worker,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            FailureStage::Read => "read",
            FailureStage::Oversize => "oversize",
            FailureStage::Parse => "parse",
            FailureStage::Worker => "worker",
        };
        f.write_str(stage)
    }
}

/// A file that was skipped. The run carries on without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: String,
    pub language: Language,
    pub stage: FailureStage,
    pub message: String,
}

impl FileFailure {
    pub fn new(
        path: impl Into<String>,
        language: Language,
        stage: FailureStage,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            language,
            stage,
            message: message.into(),
        }
    }
}

/// Everything one language produced.
#[derive(Debug, Clone)]
pub struct LanguageOutcome {
    pub language: Language,
    /// Extracted files in scan order.
    pub files: Vec<FileNode>,
    pub failures: Vec<FileFailure>,
    /// Files skipped by the change filter.
    pub unchanged: usize,
}

impl LanguageOutcome {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            files: Vec::new(),
            failures: Vec::new(),
            unchanged: 0,
        }
    }

    fn summary(&self) -> LanguageSummary {
        LanguageSummary {
            files: self.files.len(),
            classes: self.files.iter().map(|f| f.classes.len()).sum(),
            functions: self.files.iter().map(|f| f.functions.len()).sum(),
            failed_files: self.failures.len(),
            unchanged_files: self.unchanged,
        }
    }
}

/// Folds language outcomes and config metadata into one document.
///
/// Purely additive: files are concatenated in outcome order and never
/// de-duplicated.
pub struct MergeEngine {
    name: String,
    config_files: Vec<ConfigFileMetadata>,
}

impl MergeEngine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config_files: Vec::new(),
        }
    }

    pub fn with_config_files(mut self, config_files: Vec<ConfigFileMetadata>) -> Self {
        self.config_files = config_files;
        self
    }

    pub fn merge(self, outcomes: Vec<LanguageOutcome>, repo: &RepoFiles) -> OntologyDocument {
        let mut meta = ProjectMetaData::new(self.name);
        let mut files = Vec::new();

        for outcome in outcomes {
            let summary = outcome.summary();
            let entry = meta
                .languages
                .entry(outcome.language.name().to_string())
                .or_default();
            entry.files += summary.files;
            entry.classes += summary.classes;
            entry.functions += summary.functions;
            entry.failed_files += summary.failed_files;
            entry.unchanged_files += summary.unchanged_files;
            files.extend(outcome.files);
        }

        meta.total_files = files.len();
        for file in &files {
            meta.total_classes += file.classes.len();
            meta.total_functions += file.functions.len();
            meta.total_calls += file.call_count();
            meta.resolved_calls += file.resolved_call_count();
            // Line totals come from the file itself, not the extractor.
            meta.total_lines += repo
                .read(&file.path)
                .map(|text| count_lines(&text))
                .unwrap_or(file.lines);
        }

        let inventory = manifest::inventory(repo);
        meta.build_tools = inventory.build_tools;
        meta.dependencies = inventory.dependencies;
        meta.config_files = self.config_files;

        info!(
            files = meta.total_files,
            classes = meta.total_classes,
            functions = meta.total_functions,
            calls = meta.total_calls,
            resolved_calls = meta.resolved_calls,
            "Ontology merged"
        );

        OntologyDocument {
            project_meta_data: meta,
            files,
        }
    }
}
