//! Acceptance Criteria Scanner
//!
//! Every story needs acceptance criteria before a scenario pass can verify
//! anything against them.

use crate::models::{Rule, Violation};
use crate::scanners::base::StoryScanner;
use crate::story::{NodeKind, TreeNode};
use anyhow::Result;

pub struct AcceptanceCriteriaScanner;

impl AcceptanceCriteriaScanner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AcceptanceCriteriaScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl StoryScanner for AcceptanceCriteriaScanner {
    fn name(&self) -> &'static str {
        "AcceptanceCriteriaScanner"
    }

    fn description(&self) -> &'static str {
        "Stories must declare acceptance criteria"
    }

    fn scan_node(&self, node: &TreeNode, rule: &Rule) -> Result<Vec<Violation>> {
        let NodeKind::Story(fields) = &node.node.kind else {
            return Ok(vec![]);
        };
        let mut violations = Vec::new();
        if fields.acceptance_criteria.is_empty() {
            violations.push(Violation::new(
                rule,
                format!("Story `{}` has no acceptance criteria", node.node.name),
                node.node.position.render_with_field("acceptance_criteria"),
            ));
        }
        for (i, criterion) in fields.acceptance_criteria.iter().enumerate() {
            if criterion.trim().is_empty() {
                violations.push(Violation::new(
                    rule,
                    format!("Story `{}` has an empty acceptance criterion", node.node.name),
                    node.node
                        .position
                        .child("acceptance_criteria", i)
                        .render(),
                ));
            }
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
        let scanner = AcceptanceCriteriaScanner::new();
        let rule = Rule::new(
            "acceptance-criteria",
            ScannerRef::new("scanners", "AcceptanceCriteriaScanner"),
            Severity::Warning,
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
    fn test_missing_criteria_points_at_the_field() {
        let violations = scan(json!({
            "epics": [{"stories": [{"name": "Pay"}]}]
        }));
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].location,
            "epics[0].stories[0].acceptance_criteria"
        );
    }

    #[test]
    fn test_empty_criterion_is_flagged_by_index() {
        let violations = scan(json!({
            "epics": [{"stories": [{
                "name": "Pay",
                "acceptance_criteria": ["Charge succeeds", "  "]
            }]}]
        }));
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].location,
            "epics[0].stories[0].acceptance_criteria[1]"
        );
    }

    #[test]
    fn test_populated_criteria_pass() {
        let violations = scan(json!({
            "epics": [{"stories": [{
                "name": "Pay",
                "acceptance_criteria": ["Charge succeeds"]
            }]}]
        }));
        assert!(violations.is_empty());
    }
}
