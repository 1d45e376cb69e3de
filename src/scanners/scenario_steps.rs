//! Scenario Steps Scanner
//!
//! Steps follow Gherkin grammar: every step opens with
//! Given/When/Then/And/But, the first step is a Given unless the scenario
//! carries a background, and each scenario exercises at least one When and
//! one Then.

use crate::models::{Rule, Violation};
use crate::scanners::base::StoryScanner;
use crate::story::{NodeKind, ScenarioFields, TreeNode};
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

static STEP_KEYWORD: OnceLock<Regex> = OnceLock::new();

fn step_keyword() -> &'static Regex {
    STEP_KEYWORD.get_or_init(|| {
        Regex::new(r"^(Given|When|Then|And|But)\b").expect("valid regex")
    })
}

pub struct ScenarioStepsScanner;

impl ScenarioStepsScanner {
    pub fn new() -> Self {
        Self
    }

    fn check(
        &self,
        node: &TreeNode,
        fields: &ScenarioFields,
        rule: &Rule,
    ) -> Vec<Violation> {
        let mut violations = Vec::new();
        let name = &node.node.name;
        let position = &node.node.position;

        if fields.steps.is_empty() {
            violations.push(Violation::new(
                rule,
                format!("Scenario `{name}` has no steps"),
                position.render_with_field("steps"),
            ));
            return violations;
        }

        for (i, step) in fields.steps.iter().enumerate() {
            if !step_keyword().is_match(step.trim()) {
                violations.push(Violation::new(
                    rule,
                    format!("Scenario `{name}` step {} does not start with a step keyword", i + 1),
                    position.child("steps", i).render(),
                ));
            }
        }

        let first = fields.steps[0].trim();
        if fields.background.is_none() && !first.starts_with("Given") {
            violations.push(Violation::new(
                rule,
                format!("Scenario `{name}` should open with a Given (no background present)"),
                position.child("steps", 0).render(),
            ));
        }

        for keyword in ["When", "Then"] {
            if !fields
                .steps
                .iter()
                .any(|s| s.trim().starts_with(keyword))
            {
                violations.push(Violation::new(
                    rule,
                    format!("Scenario `{name}` has no {keyword} step"),
                    position.render_with_field("steps"),
                ));
            }
        }

        violations
    }
}

impl Default for ScenarioStepsScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl StoryScanner for ScenarioStepsScanner {
    fn name(&self) -> &'static str {
        "ScenarioStepsScanner"
    }

    fn description(&self) -> &'static str {
        "Scenario steps follow Gherkin keyword grammar"
    }

    fn scan_node(&self, node: &TreeNode, rule: &Rule) -> Result<Vec<Violation>> {
        match &node.node.kind {
            NodeKind::Scenario(fields) => Ok(self.check(node, fields, rule)),
            NodeKind::ScenarioOutline(fields) => Ok(self.check(node, &fields.scenario, rule)),
            _ => Ok(vec![]),
        }
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
        let scanner = ScenarioStepsScanner::new();
        let rule = Rule::new(
            "scenario-steps",
            ScannerRef::new("scanners", "ScenarioStepsScanner"),
            Severity::Error,
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
    fn test_well_formed_scenario_passes() {
        let violations = scan(json!({
            "epics": [{"stories": [{
                "name": "Pay",
                "scenarios": [{
                    "name": "Happy path",
                    "steps": [
                        "Given a cart with one item",
                        "When I pay by card",
                        "And the charge settles",
                        "Then I receive a receipt"
                    ]
                }]
            }]}]
        }));
        assert!(violations.is_empty());
    }

    #[test]
    fn test_background_replaces_opening_given() {
        let violations = scan(json!({
            "epics": [{"stories": [{
                "name": "Pay",
                "scenarios": [{
                    "name": "Happy path",
                    "background": "A cart with one item",
                    "steps": ["When I pay by card", "Then I receive a receipt"]
                }]
            }]}]
        }));
        assert!(violations.is_empty());
    }

    #[test]
    fn test_empty_steps_short_circuits() {
        let violations = scan(json!({
            "epics": [{"stories": [{
                "name": "Pay",
                "scenarios": [{"name": "Empty", "steps": []}]
            }]}]
        }));
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].location,
            "epics[0].stories[0].scenarios[0].steps"
        );
    }

    #[test]
    fn test_bad_keyword_and_missing_then() {
        let violations = scan(json!({
            "epics": [{"stories": [{
                "name": "Pay",
                "scenarios": [{
                    "name": "Sloppy",
                    "steps": ["Given a cart", "I pay by card", "When it settles"]
                }]
            }]}]
        }));
        let messages: Vec<&str> = violations.iter().map(|v| v.message.as_str()).collect();
        assert_eq!(violations.len(), 2);
        assert!(messages[0].contains("step 2"));
        assert!(messages[1].contains("no Then step"));
    }

    #[test]
    fn test_outline_steps_are_checked_too() {
        let violations = scan(json!({
            "epics": [{"stories": [{
                "name": "Pay",
                "scenario_outlines": [{
                    "name": "Amounts",
                    "steps": ["Given a cart", "When I pay <amount>", "Then I am charged <amount>"],
                    "examples": [{"amount": "10"}]
                }]
            }]}]
        }));
        assert!(violations.is_empty());
    }
}
