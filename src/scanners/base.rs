//! Scanner contracts and shared types.
//!
//! Four specializations share one output contract: an ordered list of
//! violations, inputs untouched:
//! - story-tree scanners, invoked once per non-container node;
//! - domain-concept scanners, invoked once per concept;
//! - file scanners, invoked once per in-scope file;
//! - cross-file scanners, invoked once globally with a comparison budget.
//!
//! Rule metadata (severity, enablement, display name) is injected per call,
//! never hard-coded, so one scanner serves several rules.

use crate::models::{Rule, Severity, Violation};
use crate::parsers::SyntaxTree;
use crate::story::{DomainConceptNode, StoryGraph, TreeNode};
use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default ceiling for pairwise cross-file comparisons in one scan.
pub const DEFAULT_CROSS_FILE_BUDGET: usize = 10_000;

/// Progress callback: (rule id, rules done, rules total).
pub type ProgressCallback = Box<dyn Fn(&str, usize, usize) + Send + Sync>;

/// One file of the corpus, content already read by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Which corpus collection a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Test,
    Src,
}

/// The file corpus, keyed by kind. Ordered: scan output order follows the
/// order the caller supplied.
#[derive(Debug, Clone, Default)]
pub struct FileSet {
    pub test: Vec<SourceFile>,
    pub src: Vec<SourceFile>,
}

impl FileSet {
    pub fn of_kind(&self, kind: FileKind) -> &[SourceFile] {
        match kind {
            FileKind::Test => &self.test,
            FileKind::Src => &self.src,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.test.is_empty() && self.src.is_empty()
    }
}

/// Everything one scan invocation needs. Constructed fresh per invocation
/// and discarded at the end; the engine never mutates it.
pub struct ScanContext {
    pub story_graph: StoryGraph,
    pub files: FileSet,
    /// Incremental mode: when present, per-file rules run over these files
    /// instead of the full set.
    pub changed: Option<FileSet>,
    /// Explicit scope; wins over the document's ambient `_validation_scope`.
    pub scope: Option<crate::scope::Scope>,
    pub skip_cross_file: bool,
    pub max_cross_file_comparisons: usize,
    pub progress: Option<ProgressCallback>,
}

impl ScanContext {
    pub fn new(story_graph: StoryGraph) -> Self {
        Self {
            story_graph,
            files: FileSet::default(),
            changed: None,
            scope: None,
            skip_cross_file: false,
            max_cross_file_comparisons: DEFAULT_CROSS_FILE_BUDGET,
            progress: None,
        }
    }

    pub fn with_files(mut self, files: FileSet) -> Self {
        self.files = files;
        self
    }

    pub fn with_changed(mut self, changed: FileSet) -> Self {
        self.changed = Some(changed);
        self
    }

    pub fn with_scope(mut self, scope: crate::scope::Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_skip_cross_file(mut self, skip: bool) -> Self {
        self.skip_cross_file = skip;
        self
    }

    pub fn with_max_cross_file_comparisons(mut self, max: usize) -> Self {
        self.max_cross_file_comparisons = max;
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }
}

/// One file as handed to a file scanner.
pub struct FileUnit<'a> {
    pub path: &'a Path,
    pub content: &'a str,
    /// Pre-parsed syntax tree, when the language supports one.
    pub syntax: Option<&'a SyntaxTree>,
    /// The story graph, for vocabulary cross-reference.
    pub graph: &'a StoryGraph,
    pub kind: FileKind,
}

/// Self-limiting mechanism bounding otherwise-quadratic cross-file work.
#[derive(Debug, Clone)]
pub struct ComparisonBudget {
    limit: usize,
    used: usize,
}

impl ComparisonBudget {
    pub fn new(limit: usize) -> Self {
        Self { limit, used: 0 }
    }

    /// Charge one comparison. Returns `false` once the budget is spent; the
    /// scanner must then stop comparing and return what it has.
    pub fn try_charge(&mut self) -> bool {
        if self.used >= self.limit {
            return false;
        }
        self.used += 1;
        true
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn exhausted(&self) -> bool {
        self.used >= self.limit
    }
}

/// Story-tree scanner: one call per non-container node, in traversal order.
pub trait StoryScanner: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn scan_node(&self, node: &TreeNode, rule: &Rule) -> Result<Vec<Violation>>;
}

/// Domain-concept scanner: one call per concept entry.
pub trait ConceptScanner: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn scan_concept(
        &self,
        concept: &DomainConceptNode,
        peers: &[DomainConceptNode],
        rule: &Rule,
    ) -> Result<Vec<Violation>>;
}

/// File scanner: one call per file of the collections it declares.
pub trait FileScanner: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// Which collections this rule covers. The catalog's conventions are
    /// about test files, so that is the default.
    fn file_kinds(&self) -> &'static [FileKind] {
        &[FileKind::Test]
    }
    fn scan_file(&self, file: &FileUnit<'_>, rule: &Rule) -> Result<Vec<Violation>>;
}

/// Cross-file scanner: one call per scan, comparing pairs of files under a
/// hard budget. Must return partial results once the budget is spent.
pub trait CrossFileScanner: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn scan_corpus(
        &self,
        changed: &FileSet,
        all: &FileSet,
        budget: &mut ComparisonBudget,
        rule: &Rule,
    ) -> Result<Vec<Violation>>;
}

/// A resolved scanner, tagged by specialization.
#[derive(Clone)]
pub enum ScannerHandle {
    Story(Arc<dyn StoryScanner>),
    Concept(Arc<dyn ConceptScanner>),
    File(Arc<dyn FileScanner>),
    CrossFile(Arc<dyn CrossFileScanner>),
}

impl std::fmt::Debug for ScannerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ScannerHandle")
            .field(&self.kind_label())
            .finish()
    }
}

impl ScannerHandle {
    pub fn kind_label(&self) -> &'static str {
        match self {
            ScannerHandle::Story(_) => "story",
            ScannerHandle::Concept(_) => "concept",
            ScannerHandle::File(_) => "file",
            ScannerHandle::CrossFile(_) => "cross_file",
        }
    }
}

/// Result from running a single rule.
#[derive(Debug, Clone)]
pub struct ScannerResult {
    pub rule_id: String,
    pub violations: Vec<Violation>,
    pub duration_ms: u64,
    pub success: bool,
    pub error: Option<String>,
}

impl ScannerResult {
    pub fn success(rule_id: String, violations: Vec<Violation>, duration_ms: u64) -> Self {
        Self {
            rule_id,
            violations,
            duration_ms,
            success: true,
            error: None,
        }
    }

    pub fn failure(rule_id: String, error: String, duration_ms: u64) -> Self {
        Self {
            rule_id,
            violations: Vec::new(),
            duration_ms,
            success: false,
            error: Some(error),
        }
    }
}

/// Where a diagnostic was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticStage {
    Load,
    Scan,
}

/// A recoverable engine-side problem: a rule that could not be loaded, or a
/// unit of work whose scanner failed. Never part of the violation list.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub rule_id: String,
    pub stage: DiagnosticStage,
    pub message: String,
    pub location: Option<String>,
}

/// Summary statistics from one scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    pub rules_run: usize,
    pub rules_succeeded: usize,
    pub rules_failed: usize,
    pub total_violations: usize,
    pub by_severity: HashMap<Severity, usize>,
    pub total_duration_ms: u64,
}

impl ScanSummary {
    pub fn add_result(&mut self, result: &ScannerResult) {
        self.rules_run += 1;
        self.total_duration_ms += result.duration_ms;

        if result.success {
            self.rules_succeeded += 1;
            self.total_violations += result.violations.len();
            for violation in &result.violations {
                *self.by_severity.entry(violation.severity).or_insert(0) += 1;
            }
        } else {
            self.rules_failed += 1;
        }
    }
}
