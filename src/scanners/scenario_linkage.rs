//! Scenario Linkage Scanner
//!
//! Cross-references the test corpus against the story graph's scenario
//! vocabulary: a test function whose normalized name matches no scenario in
//! the document is probably testing something the plan never named, or the
//! scenario was renamed without touching the test.
//!
//! Uses the pre-parsed syntax tree when available and falls back to a line
//! regex for files tree-sitter could not parse.

use crate::models::{Rule, Violation};
use crate::scanners::base::{FileScanner, FileUnit};
use crate::story::{NodeKind, StoryMap};
use anyhow::Result;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

static DEF_TEST: OnceLock<Regex> = OnceLock::new();

fn def_test() -> &'static Regex {
    DEF_TEST.get_or_init(|| Regex::new(r"^\s*def\s+(test_\w+)").expect("valid regex"))
}

pub struct ScenarioLinkageScanner;

impl ScenarioLinkageScanner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ScenarioLinkageScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercased alphanumeric words joined by single spaces, so
/// `test_user_can_pay` and "User can pay" compare equal.
fn normalize(text: &str) -> String {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn scenario_vocabulary(map: &StoryMap) -> BTreeSet<String> {
    let mut vocabulary = BTreeSet::new();
    for epic in map.epics() {
        for tree in map.walk(epic) {
            if matches!(
                tree.node.kind,
                NodeKind::Scenario(_) | NodeKind::ScenarioOutline(_)
            ) && !tree.node.name.is_empty()
            {
                vocabulary.insert(normalize(&tree.node.name));
            }
        }
    }
    vocabulary
}

/// (function name, 1-based line) pairs for every `test_*` function.
fn test_functions(file: &FileUnit<'_>) -> Vec<(String, u32)> {
    if let Some(tree) = file.syntax {
        return tree
            .functions()
            .into_iter()
            .filter(|f| f.name.starts_with("test_"))
            .map(|f| (f.name, f.line))
            .collect();
    }
    file.content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            def_test()
                .captures(line)
                .map(|c| (c[1].to_string(), i as u32 + 1))
        })
        .collect()
}

impl FileScanner for ScenarioLinkageScanner {
    fn name(&self) -> &'static str {
        "ScenarioLinkageScanner"
    }

    fn description(&self) -> &'static str {
        "Test functions correspond to scenarios in the story graph"
    }

    fn scan_file(&self, file: &FileUnit<'_>, rule: &Rule) -> Result<Vec<Violation>> {
        let vocabulary = scenario_vocabulary(&StoryMap::build(file.graph));
        if vocabulary.is_empty() {
            return Ok(vec![]);
        }

        let mut violations = Vec::new();
        for (function, line) in test_functions(file) {
            let normalized = normalize(function.trim_start_matches("test_"));
            let linked = vocabulary
                .iter()
                .any(|s| s == &normalized || normalized.contains(s.as_str()));
            if !linked {
                violations.push(
                    Violation::new(
                        rule,
                        format!("Test function `{function}` matches no scenario in the story graph"),
                        file.path.display().to_string(),
                    )
                    .with_line(line),
                );
            }
        }
        Ok(violations)
    }
}
