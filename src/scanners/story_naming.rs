//! Story Naming Scanner
//!
//! House naming conventions for stories and scenarios: names are present,
//! start with a capital letter, and carry no trailing period. One scanner
//! serves both node kinds; severity comes from the rule.

use crate::models::{Rule, Violation};
use crate::scanners::base::StoryScanner;
use crate::story::TreeNode;
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

static STARTS_CAPITALIZED: OnceLock<Regex> = OnceLock::new();

fn starts_capitalized() -> &'static Regex {
    STARTS_CAPITALIZED.get_or_init(|| Regex::new(r"^[A-Z0-9]").expect("valid regex"))
}

pub struct StoryNamingScanner;

impl StoryNamingScanner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StoryNamingScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl StoryScanner for StoryNamingScanner {
    fn name(&self) -> &'static str {
        "StoryNamingScanner"
    }

    fn description(&self) -> &'static str {
        "Story and scenario names follow the house conventions"
    }

    fn scan_node(&self, node: &TreeNode, rule: &Rule) -> Result<Vec<Violation>> {
        let kind = node.node.kind.label();
        let name = node.node.name.trim();
        let location = node.node.position.render_with_field("name");

        if name.is_empty() {
            return Ok(vec![Violation::new(
                rule,
                format!("Unnamed {kind}"),
                location,
            )]);
        }

        let mut violations = Vec::new();
        if !starts_capitalized().is_match(name) {
            violations.push(Violation::new(
                rule,
                format!("{kind} name `{name}` should start with a capital letter"),
                location.clone(),
            ));
        }
        if name.ends_with('.') {
            violations.push(Violation::new(
                rule,
                format!("{kind} name `{name}` should not end with a period"),
                location,
            ));
        }
        Ok(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScannerRef, Severity};
    use crate::story::{StoryGraph, StoryMap};
    use serde_json::json;

    fn scan(doc: serde_json::Value) -> Vec<Violation> {
        let graph = StoryGraph::from_value(doc).unwrap();
        let map = StoryMap::build(&graph);
        let scanner = StoryNamingScanner::new();
        let rule = Rule::new(
            "story-naming",
            ScannerRef::new("scanners", "StoryNamingScanner"),
            Severity::Info,
        );
        let mut out = Vec::new();
        for epic in map.epics() {
            for tree in map.walk(epic) {
                if !tree.node.kind.is_container() {
                    out.extend(scanner.scan_node(tree, &rule).unwrap());
                }
            }
        }
        out
    }

    #[test]
    fn test_good_names_pass() {
        let violations = scan(json!({
            "epics": [{"stories": [{
                "name": "Pay by card",
                "scenarios": [{"name": "Successful payment"}]
            }]}]
        }));
        assert!(violations.is_empty());
    }

    #[test]
    fn test_lowercase_and_trailing_period() {
        let violations = scan(json!({
            "epics": [{"stories": [{
                "name": "pay by card.",
                "scenarios": [{"name": "happy path"}]
            }]}]
        }));
        let messages: Vec<&str> = violations.iter().map(|v| v.message.as_str()).collect();
        assert_eq!(violations.len(), 3);
        assert!(messages[0].contains("capital letter"));
        assert!(messages[1].contains("period"));
        assert!(messages[2].contains("scenario name"));
    }

    #[test]
    fn test_missing_name_is_one_violation() {
        let violations = scan(json!({
            "epics": [{"stories": [{"scenarios": [{"name": "Ok"}]}]}]
        }));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, "Unnamed story");
        assert_eq!(violations[0].location, "epics[0].stories[0].name");
    }
}
