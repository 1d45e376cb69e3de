//! Convention scanners
//!
//! This module provides the scanner framework and the built-in rule catalog
//! for checking a story graph and its test corpus against team conventions.
//!
//! The `ScanEngine` resolves each enabled `Rule` to a scanner through the
//! `ScannerRegistry`, dispatches the scanner over the inputs its kind
//! requires, and collects violations per rule. A scanner that panics or
//! returns an error produces a diagnostic for that rule; the remaining rules
//! still run.
//!
//! Scanner kinds:
//! - `StoryScanner` - called once per tree node of the scoped story map
//! - `ConceptScanner` - called once per domain concept
//! - `FileScanner` - called once per source file of the kinds it declares
//! - `CrossFileScanner` - called once with the changed files, the full
//!   corpus, and a shared comparison budget

mod base;
mod orchestrator;
mod registry;

// Story structure rules
mod acceptance_criteria;
mod background_required;
mod missing_scenarios;
mod scenario_steps;
mod story_naming;

// Domain concept rules
mod concept_collaborators;
mod concept_responsibilities;

// Test corpus rules
mod duplicate_test_content;
mod scenario_linkage;
mod test_assertions;
mod test_file_naming;

// Re-export framework types
pub use base::{
    ComparisonBudget, ConceptScanner, CrossFileScanner, Diagnostic, DiagnosticStage, FileKind,
    FileScanner, FileSet, FileUnit, ProgressCallback, ScanContext, ScanSummary, ScannerHandle,
    ScannerResult, SourceFile, StoryScanner, DEFAULT_CROSS_FILE_BUDGET,
};

pub use orchestrator::{default_rules, ScanEngine, ScanOutcome};
pub use registry::ScannerRegistry;

// Re-export the rule catalog
pub use acceptance_criteria::AcceptanceCriteriaScanner;
pub use background_required::BackgroundRequiredScanner;
pub use concept_collaborators::ConceptCollaboratorsScanner;
pub use concept_responsibilities::ConceptResponsibilitiesScanner;
pub use duplicate_test_content::DuplicateTestContentScanner;
pub use missing_scenarios::MissingScenariosScanner;
pub use scenario_linkage::ScenarioLinkageScanner;
pub use scenario_steps::ScenarioStepsScanner;
pub use story_naming::StoryNamingScanner;
pub use test_assertions::TestAssertionsScanner;
pub use test_file_naming::TestFileNamingScanner;
