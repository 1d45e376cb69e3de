//! Scanner loader / rule registry.
//!
//! A rule declares its scanner as a module path plus name. Resolution walks
//! an explicit, ordered fallback chain over a registry built at startup:
//!
//! 1. the literal declared path (`module::Name`);
//! 2. the conventional core path `scanners::<derived>`, where `<derived>` is
//!    the capitalized name with a trailing `Scanner` stripped and lowered to
//!    underscores (`MissingScenariosScanner` → `missing_scenarios`);
//! 3. when a bot namespace is active, `bots::<ns>::<derived>`.
//!
//! The first registered candidate wins, so deployments can add or override
//! scanners without touching the core catalog. A rule whose scanner resolves
//! nowhere yields a load diagnostic and is skipped, never a scan abort.

use crate::models::Rule;
use crate::scanners::base::{Diagnostic, DiagnosticStage, ScannerHandle};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Default)]
pub struct ScannerRegistry {
    entries: HashMap<String, ScannerHandle>,
    bot_namespace: Option<String>,
}

impl ScannerRegistry {
    /// An empty registry. Most callers want [`ScannerRegistry::builtin`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the core rule catalog under `scanners::*`.
    pub fn builtin() -> Self {
        use crate::scanners::*;

        let mut registry = Self::new();
        registry.register(
            "scanners::missing_scenarios",
            ScannerHandle::Story(Arc::new(MissingScenariosScanner::new())),
        );
        registry.register(
            "scanners::background_required",
            ScannerHandle::Story(Arc::new(BackgroundRequiredScanner::new())),
        );
        registry.register(
            "scanners::acceptance_criteria",
            ScannerHandle::Story(Arc::new(AcceptanceCriteriaScanner::new())),
        );
        registry.register(
            "scanners::story_naming",
            ScannerHandle::Story(Arc::new(StoryNamingScanner::new())),
        );
        registry.register(
            "scanners::scenario_steps",
            ScannerHandle::Story(Arc::new(ScenarioStepsScanner::new())),
        );
        registry.register(
            "scanners::concept_responsibilities",
            ScannerHandle::Concept(Arc::new(ConceptResponsibilitiesScanner::new())),
        );
        registry.register(
            "scanners::concept_collaborators",
            ScannerHandle::Concept(Arc::new(ConceptCollaboratorsScanner::new())),
        );
        registry.register(
            "scanners::test_file_naming",
            ScannerHandle::File(Arc::new(TestFileNamingScanner::new())),
        );
        registry.register(
            "scanners::scenario_linkage",
            ScannerHandle::File(Arc::new(ScenarioLinkageScanner::new())),
        );
        registry.register(
            "scanners::test_assertions",
            ScannerHandle::File(Arc::new(TestAssertionsScanner::new())),
        );
        registry.register(
            "scanners::duplicate_test_content",
            ScannerHandle::CrossFile(Arc::new(DuplicateTestContentScanner::new())),
        );
        registry
    }

    /// Activate a bot namespace: `bots::<ns>::<derived>` becomes a resolution
    /// candidate for every rule.
    pub fn with_bot_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.bot_namespace = Some(namespace.into());
        self
    }

    /// Register a scanner under an explicit path.
    pub fn register(&mut self, path: impl Into<String>, handle: ScannerHandle) {
        let path = path.into();
        debug!("registering scanner at {path}");
        self.entries.insert(path, handle);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `MissingScenariosScanner` → `missing_scenarios`.
    pub fn derive_core_name(name: &str) -> String {
        let stripped = name.strip_suffix("Scanner").unwrap_or(name);
        let mut out = String::with_capacity(stripped.len() + 4);
        for (i, ch) in stripped.chars().enumerate() {
            if ch.is_ascii_uppercase() {
                if i > 0 {
                    out.push('_');
                }
                out.push(ch.to_ascii_lowercase());
            } else {
                out.push(ch);
            }
        }
        out
    }

    fn candidates(&self, rule: &Rule) -> Vec<String> {
        let derived = Self::derive_core_name(&rule.scanner.name);
        let mut candidates = vec![
            rule.scanner.literal_path(),
            format!("scanners::{derived}"),
        ];
        if let Some(ns) = &self.bot_namespace {
            candidates.push(format!("bots::{ns}::{derived}"));
        }
        candidates
    }

    /// Resolve a rule's scanner through the fallback chain.
    pub fn resolve(&self, rule: &Rule) -> Result<&ScannerHandle, Diagnostic> {
        let candidates = self.candidates(rule);
        for candidate in &candidates {
            if let Some(handle) = self.entries.get(candidate) {
                debug!(
                    "rule {} resolved scanner {} at {candidate}",
                    rule.id, rule.scanner
                );
                return Ok(handle);
            }
        }
        warn!(
            "rule {}: scanner {} not found (tried {})",
            rule.id,
            rule.scanner,
            candidates.join(", ")
        );
        Err(Diagnostic {
            rule_id: rule.id.clone(),
            stage: DiagnosticStage::Load,
            message: format!(
                "scanner {} not found; tried {}",
                rule.scanner,
                candidates.join(", ")
            ),
            location: None,
        })
    }
}
