//! Scan orchestration.
//!
//! `ScanEngine` wires graph, files and scope into rule runs and collects a
//! flat, ordered violation list: rule execution order first, traversal order
//! within a rule. Execution is single-threaded and synchronous; no state
//! survives an invocation, so every call is fully determined by its context.
//!
//! Failure policy: an unexpected error (or panic) inside a scanner aborts
//! only that rule's contribution for that unit of work. The engine records a
//! diagnostic and keeps going; one broken rule never stops the rest of the
//! scan.

use crate::error::ScanError;
use crate::models::{Rule, ScannerRef, Severity, Violation};
use crate::parsers::SyntaxTree;
use crate::scanners::base::{
    ComparisonBudget, Diagnostic, DiagnosticStage, FileSet, FileUnit, ScanContext, ScanSummary,
    ScannerHandle, ScannerResult, SourceFile,
};
use crate::scanners::registry::ScannerRegistry;
use crate::story::{collect_concepts, StoryMap};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Detailed outcome of one scan: per-rule results, recoverable diagnostics,
/// and summary statistics.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub results: Vec<ScannerResult>,
    pub diagnostics: Vec<Diagnostic>,
    pub summary: ScanSummary,
}

impl ScanOutcome {
    /// Flatten to the ordered violation list.
    pub fn violations(&self) -> Vec<Violation> {
        self.results
            .iter()
            .flat_map(|r| r.violations.iter().cloned())
            .collect()
    }
}

pub struct ScanEngine {
    rules: Vec<Rule>,
    registry: ScannerRegistry,
}

impl ScanEngine {
    pub fn new(registry: ScannerRegistry) -> Self {
        Self {
            rules: Vec::new(),
            registry,
        }
    }

    /// Engine with the builtin registry and the full default rule catalog.
    pub fn with_default_rules() -> Self {
        let mut engine = Self::new(ScannerRegistry::builtin());
        engine.rules = default_rules();
        engine
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn with_rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn registry_mut(&mut self) -> &mut ScannerRegistry {
        &mut self.registry
    }

    /// Run every enabled rule and return the ordered violation list.
    pub fn run(&self, context: &ScanContext) -> Result<Vec<Violation>, ScanError> {
        Ok(self.run_detailed(context)?.violations())
    }

    /// Run every enabled rule and return per-rule results, diagnostics and
    /// summary statistics.
    pub fn run_detailed(&self, context: &ScanContext) -> Result<ScanOutcome, ScanError> {
        // Missing rule metadata is one of the two hard failures.
        for rule in &self.rules {
            rule.validate()?;
        }

        let start = Instant::now();
        let graph = &context.story_graph;

        // Scope is resolved once; explicit context scope wins over the
        // document's ambient one.
        let scope = context
            .scope
            .clone()
            .or_else(|| graph.validation_scope());

        // The tree is built once and filtered once. Concepts follow the tree
        // scope: an epic that contributes no in-scope story contributes no
        // concepts either.
        let mut map = StoryMap::build(graph);
        let mut concepts = collect_concepts(graph);
        if let Some(names) = scope.as_ref().and_then(|s| s.resolve_stories(graph)) {
            debug!("scope restricts scan to {} stories", names.len());
            map = map.filter(&names);
            let kept_epics: HashSet<usize> = map
                .epics()
                .iter()
                .filter_map(|epic| epic.node.position.steps().first())
                .map(|step| step.index)
                .collect();
            concepts.retain(|concept| {
                concept
                    .position
                    .steps()
                    .first()
                    .is_some_and(|step| kept_epics.contains(&step.index))
            });
        }

        // Incremental mode: per-file rules cover changed files when present.
        let per_file = scoped_files(
            context.changed.as_ref().unwrap_or(&context.files),
            scope.as_ref(),
        );
        let all_files = scoped_files(&context.files, scope.as_ref());

        // Parse each file's syntax tree once, shared across file rules.
        let syntax_cache = build_syntax_cache(&per_file);

        let enabled: Vec<&Rule> = self.rules.iter().filter(|r| r.enabled).collect();
        info!(
            "scanning {} stories, {} concepts, {} files with {} rules",
            map.story_names().len(),
            concepts.len(),
            per_file.test.len() + per_file.src.len(),
            enabled.len()
        );

        let mut outcome = ScanOutcome::default();
        let total = enabled.len();

        for (done, rule) in enabled.iter().enumerate() {
            let rule_start = Instant::now();
            let handle = match self.registry.resolve(rule) {
                Ok(handle) => handle,
                Err(diagnostic) => {
                    let elapsed = rule_start.elapsed().as_millis() as u64;
                    outcome.results.push(ScannerResult::failure(
                        rule.id.clone(),
                        diagnostic.message.clone(),
                        elapsed,
                    ));
                    outcome.diagnostics.push(diagnostic);
                    report_progress(context, rule, done + 1, total);
                    continue;
                }
            };

            debug!("running rule {} ({})", rule.id, handle.kind_label());
            let violations = match handle {
                ScannerHandle::Story(scanner) => {
                    let mut violations = Vec::new();
                    for epic in map.epics() {
                        for tree in map.walk(epic) {
                            // Containers are traversed, never scanned.
                            if tree.node.kind.is_container() {
                                continue;
                            }
                            let location = tree.node.position.render();
                            run_unit(
                                rule,
                                Some(location),
                                || scanner.scan_node(tree, rule),
                                &mut violations,
                                &mut outcome.diagnostics,
                            );
                        }
                    }
                    violations
                }
                ScannerHandle::Concept(scanner) => {
                    let mut violations = Vec::new();
                    for concept in &concepts {
                        let location = concept.position.render();
                        run_unit(
                            rule,
                            Some(location),
                            || scanner.scan_concept(concept, &concepts, rule),
                            &mut violations,
                            &mut outcome.diagnostics,
                        );
                    }
                    violations
                }
                ScannerHandle::File(scanner) => {
                    let mut violations = Vec::new();
                    for kind in scanner.file_kinds() {
                        for file in per_file.of_kind(*kind) {
                            let unit = FileUnit {
                                path: &file.path,
                                content: &file.content,
                                syntax: syntax_cache.get(&file.path),
                                graph,
                                kind: *kind,
                            };
                            let location = file.path.display().to_string();
                            run_unit(
                                rule,
                                Some(location),
                                || scanner.scan_file(&unit, rule),
                                &mut violations,
                                &mut outcome.diagnostics,
                            );
                        }
                    }
                    violations
                }
                ScannerHandle::CrossFile(scanner) => {
                    if context.skip_cross_file {
                        debug!("skipping cross-file rule {}", rule.id);
                        Vec::new()
                    } else {
                        let mut budget =
                            ComparisonBudget::new(context.max_cross_file_comparisons);
                        let mut violations = Vec::new();
                        run_unit(
                            rule,
                            None,
                            || scanner.scan_corpus(&per_file, &all_files, &mut budget, rule),
                            &mut violations,
                            &mut outcome.diagnostics,
                        );
                        if budget.exhausted() {
                            debug!(
                                "rule {} spent its comparison budget ({})",
                                rule.id,
                                budget.used()
                            );
                        }
                        violations
                    }
                }
            };

            let elapsed = rule_start.elapsed().as_millis() as u64;
            outcome
                .results
                .push(ScannerResult::success(rule.id.clone(), violations, elapsed));
            report_progress(context, rule, done + 1, total);
        }

        for result in &outcome.results {
            outcome.summary.add_result(result);
        }
        outcome.summary.total_duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "scan complete: {} violations from {}/{} rules in {:?}",
            outcome.summary.total_violations,
            outcome.summary.rules_succeeded,
            outcome.summary.rules_run,
            start.elapsed()
        );
        Ok(outcome)
    }
}

fn report_progress(context: &ScanContext, rule: &Rule, done: usize, total: usize) {
    if let Some(callback) = &context.progress {
        callback(&rule.id, done, total);
    }
}

/// Run one unit of work with failure isolation, extending `violations` on
/// success and `diagnostics` on error or panic.
fn run_unit<F>(
    rule: &Rule,
    location: Option<String>,
    unit: F,
    violations: &mut Vec<Violation>,
    diagnostics: &mut Vec<Diagnostic>,
) where
    F: FnOnce() -> anyhow::Result<Vec<Violation>>,
{
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(unit));
    match outcome {
        Ok(Ok(found)) => violations.extend(found),
        Ok(Err(err)) => {
            warn!(
                "rule {} failed at {}: {err:#}",
                rule.id,
                location.as_deref().unwrap_or("<corpus>")
            );
            diagnostics.push(Diagnostic {
                rule_id: rule.id.clone(),
                stage: DiagnosticStage::Scan,
                message: format!("{err:#}"),
                location,
            });
        }
        Err(panic) => {
            let message = panic_message(panic);
            warn!(
                "rule {} panicked at {}: {message}",
                rule.id,
                location.as_deref().unwrap_or("<corpus>")
            );
            diagnostics.push(Diagnostic {
                rule_id: rule.id.clone(),
                stage: DiagnosticStage::Scan,
                message: format!("panic: {message}"),
                location,
            });
        }
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Apply a file-pattern scope to a file set; other scopes pass through.
fn scoped_files(files: &FileSet, scope: Option<&crate::scope::Scope>) -> FileSet {
    let Some(scope) = scope else {
        return files.clone();
    };
    let restrict = |collection: &[SourceFile]| -> Vec<SourceFile> {
        let paths: Vec<PathBuf> = collection.iter().map(|f| f.path.clone()).collect();
        let kept = scope.resolve_files(&paths);
        collection
            .iter()
            .filter(|f| kept.contains(&f.path))
            .cloned()
            .collect()
    };
    FileSet {
        test: restrict(&files.test),
        src: restrict(&files.src),
    }
}

fn build_syntax_cache(files: &FileSet) -> HashMap<PathBuf, SyntaxTree> {
    let mut cache = HashMap::new();
    for file in files.test.iter().chain(files.src.iter()) {
        if let Some(tree) = SyntaxTree::parse(&file.path, &file.content) {
            cache.insert(file.path.clone(), tree);
        }
    }
    cache
}

/// The default rule catalog, bound to the builtin scanners by convention.
pub fn default_rules() -> Vec<Rule> {
    let core = |name: &str| ScannerRef::new("scanners", name);
    vec![
        Rule::new(
            "missing-scenarios",
            core("MissingScenariosScanner"),
            Severity::Warning,
        ),
        Rule::new(
            "background-required",
            core("BackgroundRequiredScanner"),
            Severity::Warning,
        ),
        Rule::new(
            "acceptance-criteria",
            core("AcceptanceCriteriaScanner"),
            Severity::Warning,
        ),
        Rule::new("story-naming", core("StoryNamingScanner"), Severity::Info),
        Rule::new(
            "scenario-steps",
            core("ScenarioStepsScanner"),
            Severity::Error,
        ),
        Rule::new(
            "concept-responsibilities",
            core("ConceptResponsibilitiesScanner"),
            Severity::Warning,
        ),
        Rule::new(
            "concept-collaborators",
            core("ConceptCollaboratorsScanner"),
            Severity::Info,
        ),
        Rule::new(
            "test-file-naming",
            core("TestFileNamingScanner"),
            Severity::Warning,
        ),
        Rule::new(
            "scenario-linkage",
            core("ScenarioLinkageScanner"),
            Severity::Info,
        ),
        Rule::new(
            "test-assertions",
            core("TestAssertionsScanner"),
            Severity::Warning,
        ),
        Rule::new(
            "duplicate-test-content",
            core("DuplicateTestContentScanner"),
            Severity::Warning,
        ),
    ]
}
