//! Core data models for storyscan
//!
//! These models are used throughout the codebase for representing rules,
//! violations, and scan results.

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Generate a deterministic violation ID based on content hash.
///
/// Stable IDs across runs enable tracking violations over time (fixed vs new
/// vs recurring), suppression by ID, and reliable deduplication.
///
/// The ID is a 16-character hex string derived from hashing:
/// - rule name (which rule found it)
/// - location (where in the document or corpus)
/// - message (what the issue is)
pub fn deterministic_violation_id(rule: &str, location: &str, message: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(rule.as_bytes());
    hasher.update(b"\n");
    hasher.update(location.as_bytes());
    hasher.update(b"\n");
    hasher.update(message.as_bytes());
    let digest = hasher.finalize();
    digest
        .iter()
        .take(8)
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Severity levels for violations
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One convention finding.
///
/// Immutable once constructed; scanners emit these and nothing downstream
/// mutates them. `location` is the document address produced by
/// [`crate::story::Position::render`] (or a corpus-relative file path for
/// file rules), so consumers can jump from a violation back to its source.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Violation {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub rule_name: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub severity: Severity,
    /// 1-based line number for file-corpus violations; `null` for tree rules.
    #[serde(default)]
    pub line_number: Option<u32>,
}

impl Violation {
    /// Build a violation for `rule`, deriving the deterministic id.
    pub fn new(rule: &Rule, message: impl Into<String>, location: impl Into<String>) -> Self {
        let message = message.into();
        let location = location.into();
        Self {
            id: deterministic_violation_id(&rule.id, &location, &message),
            rule_name: rule.id.clone(),
            message,
            location,
            severity: rule.severity,
            line_number: None,
        }
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line_number = Some(line);
        self
    }
}

/// Reference to the scanner implementing a rule: a module path plus the
/// scanner's declared name, e.g. `{module: "scanners", name:
/// "MissingScenariosScanner"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ScannerRef {
    #[serde(default)]
    pub module: String,
    pub name: String,
}

impl ScannerRef {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }

    /// The literal registry key this reference declares.
    pub fn literal_path(&self) -> String {
        if self.module.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.module, self.name)
        }
    }
}

impl std::fmt::Display for ScannerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.literal_path())
    }
}

/// One enabled check, as supplied by the caller per scan.
///
/// Severity, display name and enablement live here, not in the scanner, so
/// one scanner implementation can serve several rules at different
/// severities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    pub scanner: ScannerRef,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Rule {
    pub fn new(id: impl Into<String>, scanner: ScannerRef, severity: Severity) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
            scanner,
            severity,
            enabled: true,
        }
    }

    /// Enforce the required metadata contract.
    ///
    /// A rule without an id or scanner name cannot be dispatched or reported
    /// against; this is one of the two hard failures of the engine.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.id.trim().is_empty() {
            return Err(ScanError::RuleContract {
                rule: "<unnamed>".to_string(),
                detail: "empty rule id".to_string(),
            });
        }
        if self.scanner.name.trim().is_empty() {
            return Err(ScanError::RuleContract {
                rule: self.id.clone(),
                detail: "empty scanner name".to_string(),
            });
        }
        Ok(())
    }
}

/// Summary of violations by severity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViolationsSummary {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub total: usize,
}

impl ViolationsSummary {
    pub fn from_violations(violations: &[Violation]) -> Self {
        let mut summary = Self::default();
        for v in violations {
            match v.severity {
                Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::Info => summary.infos += 1,
            }
            summary.total += 1;
        }
        summary
    }
}
