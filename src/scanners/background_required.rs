//! Background Required Scanner
//!
//! A story whose scenarios all restate the same setup should hoist it into a
//! background. Three or more scenarios with no background on any of them is
//! the house threshold. Reported at the containing group, since the fix is a
//! group-level restructuring.

use crate::models::{Rule, Violation};
use crate::scanners::base::StoryScanner;
use crate::story::{NodeKind, TreeNode};
use anyhow::Result;

const SCENARIO_THRESHOLD: usize = 3;

pub struct BackgroundRequiredScanner;

impl BackgroundRequiredScanner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BackgroundRequiredScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn has_background(tree: &TreeNode) -> bool {
    match &tree.node.kind {
        NodeKind::Scenario(fields) => fields.background.is_some(),
        NodeKind::ScenarioOutline(fields) => fields.scenario.background.is_some(),
        _ => false,
    }
}

impl StoryScanner for BackgroundRequiredScanner {
    fn name(&self) -> &'static str {
        "BackgroundRequiredScanner"
    }

    fn description(&self) -> &'static str {
        "Stories with three or more scenarios should share a background"
    }

    fn scan_node(&self, node: &TreeNode, rule: &Rule) -> Result<Vec<Violation>> {
        if !matches!(node.node.kind, NodeKind::Story(_)) {
            return Ok(vec![]);
        }
        let scenarios: Vec<&TreeNode> = node.scenarios().collect();
        if scenarios.len() < SCENARIO_THRESHOLD {
            return Ok(vec![]);
        }
        if scenarios.iter().any(|s| has_background(s)) {
            return Ok(vec![]);
        }
        Ok(vec![Violation::new(
            rule,
            format!(
                "Story `{}` has {} scenarios and no background; hoist the shared setup",
                node.node.name,
                scenarios.len()
            ),
            node.node.position.parent().render(),
        )])
    }
}
