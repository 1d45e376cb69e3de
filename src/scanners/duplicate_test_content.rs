//! Duplicate Test Content Scanner
//!
//! Compares changed test files against the whole test corpus for
//! near-identical content, a common artifact of machine-authored test
//! generation. Pairwise comparison is quadratic in the corpus, so every pair
//! costs one unit of the scan's comparison budget; when the budget runs out
//! the scanner stops and returns what it found so far.

use crate::models::{Rule, Violation};
use crate::scanners::base::{ComparisonBudget, CrossFileScanner, FileSet, SourceFile};
use anyhow::Result;
use std::collections::HashSet;
use tracing::debug;

/// Files with fewer significant lines than this are too small to call
/// duplicates.
const MIN_LINES: usize = 6;
const SIMILARITY_THRESHOLD: f64 = 0.9;

pub struct DuplicateTestContentScanner;

impl DuplicateTestContentScanner {
    pub fn new() -> Self {
        Self
    }

    /// Normalize whitespace and drop comment lines.
    fn normalize_line(line: &str) -> String {
        let trimmed = line.trim();
        if trimmed.starts_with('#') || trimmed.is_empty() {
            return String::new();
        }
        trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn significant_lines(file: &SourceFile) -> HashSet<String> {
        file.content
            .lines()
            .map(Self::normalize_line)
            .filter(|l| !l.is_empty())
            .collect()
    }

    fn similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
        let smaller = a.len().min(b.len());
        if smaller == 0 {
            return 0.0;
        }
        let shared = a.intersection(b).count();
        shared as f64 / smaller as f64
    }
}

impl Default for DuplicateTestContentScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl CrossFileScanner for DuplicateTestContentScanner {
    fn name(&self) -> &'static str {
        "DuplicateTestContentScanner"
    }

    fn description(&self) -> &'static str {
        "Changed test files duplicating existing test content"
    }

    fn scan_corpus(
        &self,
        changed: &FileSet,
        all: &FileSet,
        budget: &mut ComparisonBudget,
        rule: &Rule,
    ) -> Result<Vec<Violation>> {
        let mut violations = Vec::new();

        let corpus: Vec<(&SourceFile, HashSet<String>)> = all
            .test
            .iter()
            .map(|f| (f, Self::significant_lines(f)))
            .collect();

        'outer: for file in &changed.test {
            let lines = Self::significant_lines(file);
            if lines.len() < MIN_LINES {
                continue;
            }
            for (other, other_lines) in &corpus {
                if other.path == file.path || other_lines.len() < MIN_LINES {
                    continue;
                }
                if !budget.try_charge() {
                    debug!(
                        "comparison budget spent after {} pairs, returning partial results",
                        budget.used()
                    );
                    break 'outer;
                }
                let similarity = Self::similarity(&lines, other_lines);
                if similarity >= SIMILARITY_THRESHOLD {
                    violations.push(Violation::new(
                        rule,
                        format!(
                            "Test file duplicates {} ({:.0}% of its lines)",
                            other.path.display(),
                            similarity * 100.0
                        ),
                        file.path.display().to_string(),
                    ));
                }
            }
        }
        Ok(violations)
    }
}
