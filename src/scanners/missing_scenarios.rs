//! Missing Scenarios Scanner
//!
//! A story with no scenarios and no scenario outlines cannot be verified;
//! machine-authored planning documents sometimes drop the scenario pass.

use crate::models::{Rule, Violation};
use crate::scanners::base::StoryScanner;
use crate::story::{NodeKind, TreeNode};
use anyhow::Result;

pub struct MissingScenariosScanner;

impl MissingScenariosScanner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MissingScenariosScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl StoryScanner for MissingScenariosScanner {
    fn name(&self) -> &'static str {
        "MissingScenariosScanner"
    }

    fn description(&self) -> &'static str {
        "Stories must carry at least one scenario or scenario outline"
    }

    fn scan_node(&self, node: &TreeNode, rule: &Rule) -> Result<Vec<Violation>> {
        if !matches!(node.node.kind, NodeKind::Story(_)) {
            return Ok(vec![]);
        }
        if node.scenarios().next().is_some() {
            return Ok(vec![]);
        }
        Ok(vec![Violation::new(
            rule,
            format!("Story `{}` has no scenarios", node.node.name),
            node.node.position.render(),
        )])
    }
}
