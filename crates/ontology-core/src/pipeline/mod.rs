//! Extraction pipeline: discovery, change filtering, per-language index and
//! extraction passes, and the final merge.
//!
//! Per language the flow is:
//!
//! 1. read every file once and hash it
//! 2. parse every file and build the [`ReferenceIndex`]
//! 3. resolve imports and calls of the changed files against a shared
//!    `Arc` of that index
//!
//! Both passes go through the [`Scheduler`], which picks a sequential loop
//! or the worker pool depending on the file count.

mod change;
mod discovery;
mod manifest;
mod merge;
mod scheduler;

pub use change::ChangeFilter;
pub use discovery::{discover, Discovery};
pub use manifest::{inventory, Inventory};
pub use merge::{FailureStage, FileFailure, LanguageOutcome, MergeEngine};
pub use scheduler::{Batch, ChunkReport, Scheduler};

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{OntologyError, Result};
use crate::language::Language;
use crate::model::{ConfigFileMetadata, FileNode, OntologyDocument};
use crate::parser::{count_lines, AnalyzerRegistry, LanguageAnalyzer, ParseResult};
use crate::resolve::{posix_path, ReferenceIndex, RepoFiles, Resolver};

/// One file handed in by the caller instead of read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    pub path: String,
    pub text: String,
}

impl SourceText {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// The document plus what a caller needs for the next run.
#[derive(Debug)]
pub struct BuildOutput {
    pub document: OntologyDocument,
    /// Files that were skipped, with the reason.
    pub failures: Vec<FileFailure>,
    /// Current SHA-256 of every file that was read, for the change filter
    /// of the next run.
    pub hashes: BTreeMap<String, String>,
}

/// A file read and hashed, waiting for the index pass.
struct Pending {
    path: String,
    text: String,
    changed: bool,
}

/// Index pass output for one file.
struct Parsed {
    path: String,
    lines: usize,
    changed: bool,
    result: std::result::Result<ParseResult, String>,
}

/// Entry point: repository in, ontology document out.
///
/// # Example
///
/// ```ignore
/// let output = OntologyBuilder::new(Config::load()?)
///     .with_prior_hashes(previous)
///     .run("./repo")?;
/// save(&output.hashes);
/// ```
pub struct OntologyBuilder {
    config: Config,
    registry: Arc<AnalyzerRegistry>,
    changes: ChangeFilter,
    config_files: Vec<ConfigFileMetadata>,
    name: Option<String>,
}

impl OntologyBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            registry: Arc::new(AnalyzerRegistry::new()),
            changes: ChangeFilter::default(),
            config_files: Vec::new(),
            name: None,
        }
    }

    /// Skip files whose hash matches this `path -> sha256` map.
    pub fn with_prior_hashes(mut self, prior: HashMap<String, String>) -> Self {
        self.changes = ChangeFilter::new(prior);
        self
    }

    pub fn with_change_filter(mut self, changes: ChangeFilter) -> Self {
        self.changes = changes;
        self
    }

    /// Metadata produced by the config-file extractor, carried into the
    /// document as-is.
    pub fn with_config_files(mut self, config_files: Vec<ConfigFileMetadata>) -> Self {
        self.config_files = config_files;
        self
    }

    /// Project name; defaults to the repository directory name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the document for the repository at `root`.
    pub fn build(&self, root: impl AsRef<Path>) -> Result<OntologyDocument> {
        self.run(root).map(|output| output.document)
    }

    /// Build the document and keep failures and hashes.
    pub fn run(&self, root: impl AsRef<Path>) -> Result<BuildOutput> {
        let root = root.as_ref();
        self.config.validate()?;
        if !root.is_dir() {
            return Err(OntologyError::RepositoryNotFound(root.to_path_buf()));
        }

        let discovery = discover(root, &self.config.scan)?;
        if discovery.source_count() == 0 && discovery.oversize.is_empty() {
            return Err(OntologyError::NoRecognizedFiles(root.to_path_buf()));
        }
        info!(
            root = %root.display(),
            files = discovery.source_count(),
            languages = discovery.by_language.len(),
            "Extracting ontology"
        );

        let Discovery {
            known,
            by_language,
            oversize,
        } = discovery;
        let repo = Arc::new(RepoFiles::on_disk(root, known));
        let name = self.name.clone().unwrap_or_else(|| default_name(root));

        Ok(self.process(name, by_language, oversize, repo))
    }

    /// Build from in-memory sources, for diff-driven partial analysis.
    ///
    /// `skeleton` lists every path of the full repository so that relative
    /// imports of files outside `sources` still count as existing. Only the
    /// given sources are parsed and reported.
    pub fn build_from_sources(
        &self,
        name: impl Into<String>,
        sources: Vec<SourceText>,
        skeleton: Vec<String>,
    ) -> Result<BuildOutput> {
        self.config.validate()?;
        let name = name.into();

        let mut by_language: BTreeMap<Language, Vec<String>> = BTreeMap::new();
        let mut oversize = Vec::new();
        let mut texts = Vec::with_capacity(sources.len());
        for source in sources {
            let path = posix_path(&source.path);
            if let Some(language) = Language::from_path(&path) {
                if self.config.scan.languages.contains(&language) {
                    if source.text.len() as u64 > self.config.scan.max_file_size {
                        info!(path = %path, "Skipping file over size limit");
                        oversize.push((language, path.clone()));
                    } else {
                        by_language.entry(language).or_default().push(path.clone());
                    }
                }
            }
            texts.push((path, source.text));
        }
        if by_language.is_empty() && oversize.is_empty() {
            return Err(OntologyError::NoRecognizedFiles(PathBuf::from(&name)));
        }
        for paths in by_language.values_mut() {
            paths.sort();
            paths.dedup();
        }

        let repo = Arc::new(RepoFiles::in_memory(texts, skeleton));
        Ok(self.process(name, by_language, oversize, repo))
    }

    /// Run [`OntologyBuilder::run`] on the blocking thread pool.
    pub async fn build_async(self, root: impl Into<PathBuf>) -> Result<BuildOutput> {
        let root = root.into();
        tokio::task::spawn_blocking(move || self.run(&root))
            .await
            .map_err(|e| OntologyError::Worker(e.to_string()))?
    }

    fn process(
        &self,
        name: String,
        by_language: BTreeMap<Language, Vec<String>>,
        oversize: Vec<(Language, String)>,
        repo: Arc<RepoFiles>,
    ) -> BuildOutput {
        let mut outcomes: BTreeMap<Language, LanguageOutcome> = BTreeMap::new();
        let mut hashes = BTreeMap::new();

        for (language, paths) in by_language {
            let outcome = self.process_language(language, paths, &repo, &mut hashes);
            outcomes.insert(language, outcome);
        }
        for (language, path) in oversize {
            let message = format!("larger than {} bytes", self.config.scan.max_file_size);
            outcomes
                .entry(language)
                .or_insert_with(|| LanguageOutcome::new(language))
                .failures
                .push(FileFailure::new(path, language, FailureStage::Oversize, message));
        }

        let failures: Vec<FileFailure> = outcomes
            .values()
            .flat_map(|outcome| outcome.failures.iter().cloned())
            .collect();

        let document = MergeEngine::new(name)
            .with_config_files(self.config_files.clone())
            .merge(outcomes.into_values().collect(), &repo);

        BuildOutput {
            document,
            failures,
            hashes,
        }
    }

    fn process_language(
        &self,
        language: Language,
        paths: Vec<String>,
        repo: &Arc<RepoFiles>,
        hashes: &mut BTreeMap<String, String>,
    ) -> LanguageOutcome {
        let mut outcome = LanguageOutcome::new(language);
        let Some(analyzer) = self.registry.for_language(language) else {
            warn!(%language, "No analyzer registered");
            return outcome;
        };
        let scheduler = Scheduler::new(&self.config.parallel);

        let mut pending = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(text) = repo.read(&path) else {
                warn!(path = %path, "Failed to read file");
                outcome.failures.push(FileFailure::new(
                    path,
                    language,
                    FailureStage::Read,
                    "not readable as UTF-8 text",
                ));
                continue;
            };
            let hash = ChangeFilter::hash(&text);
            let changed = self.changes.is_changed(&path, &hash);
            hashes.insert(path.clone(), hash);
            pending.push(Pending {
                path,
                text,
                changed,
            });
        }
        let changed_count = pending.iter().filter(|p| p.changed).count();
        outcome.unchanged = pending.len() - changed_count;
        debug!(%language, files = pending.len(), changed = changed_count, "Files read");

        // Index pass: every file, so unchanged files stay resolvable.
        let expected: Vec<String> = pending.iter().map(|p| p.path.clone()).collect();
        let parse_with = Arc::clone(&analyzer);
        let parsed = scheduler.run(&format!("{}-index", language), pending, move |file| {
            parse(parse_with.as_ref(), file)
        });
        self.record_dropped(&mut outcome, &expected, parsed.results.iter().map(|p| p.path.as_str()));

        let mut builder = ReferenceIndex::builder(language, Arc::clone(repo));
        let mut to_resolve = Vec::with_capacity(changed_count);
        for file in parsed.results {
            match file.result {
                Ok(result) => {
                    builder.add(&result);
                    if file.changed {
                        to_resolve.push((result, file.lines));
                    }
                }
                Err(message) => {
                    builder.add_path(&file.path);
                    if file.changed {
                        warn!(path = %file.path, error = %message, "Failed to parse file");
                        outcome.failures.push(FileFailure::new(
                            file.path,
                            language,
                            FailureStage::Parse,
                            message,
                        ));
                    }
                }
            }
        }
        let index = Arc::new(builder.finish());

        // Extraction pass: resolve the changed files against the shared index.
        let expected: Vec<String> = to_resolve.iter().map(|(r, _)| r.file_path.clone()).collect();
        let extracted = scheduler.run(&format!("{}-resolve", language), to_resolve, move |(result, lines)| {
            extract(&index, result, lines)
        });
        self.record_dropped(&mut outcome, &expected, extracted.results.iter().map(|f| f.path.as_str()));
        outcome.files = extracted.results;

        info!(
            %language,
            files = outcome.files.len(),
            unchanged = outcome.unchanged,
            failed = outcome.failures.len(),
            "Language processed"
        );
        outcome
    }

    /// Turn files lost with a panicked worker into failures.
    fn record_dropped<'a>(
        &self,
        outcome: &mut LanguageOutcome,
        expected: &[String],
        returned: impl Iterator<Item = &'a str>,
    ) {
        let returned: HashSet<&str> = returned.collect();
        if returned.len() == expected.len() {
            return;
        }
        for path in expected.iter().filter(|p| !returned.contains(p.as_str())) {
            outcome.failures.push(FileFailure::new(
                path.clone(),
                outcome.language,
                FailureStage::Worker,
                "worker failed",
            ));
        }
    }
}

fn parse(analyzer: &dyn LanguageAnalyzer, file: Pending) -> Parsed {
    let result = analyzer.parse_file(&file.path, &file.text);
    if let Ok(parsed) = &result {
        let stats = parsed.stats();
        debug!(
            path = %file.path,
            classes = stats.classes,
            functions = stats.functions,
            calls = stats.calls,
            imports = stats.imports,
            "Parsed"
        );
        for warning in &parsed.warnings {
            debug!(path = %file.path, warning = %warning, "Parse warning");
        }
    }
    Parsed {
        lines: count_lines(&file.text),
        path: file.path,
        changed: file.changed,
        result,
    }
}

fn extract(index: &ReferenceIndex, mut result: ParseResult, lines: usize) -> FileNode {
    Resolver::new(index).resolve(&mut result);

    let ParseResult {
        file_path,
        imports,
        classes,
        functions,
        ..
    } = result;
    let language = Language::tag_for_path(&file_path);
    let mut file = FileNode::new(file_path, language, lines);
    file.imports = imports;
    file.classes = classes;
    file.functions = functions;
    file.collect_import_lists();
    file
}

fn default_name(root: &Path) -> String {
    root.canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(root)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "repository".to_string())
}
