//! Location addressing for story-graph nodes.
//!
//! Every node carries a [`Position`]: the ordered list of
//! (container-field, index) steps from the document root down to the node.
//! Rendering a position produces the address every [`crate::Violation`]
//! carries (`epics[0].sub_epics[1].stories[2]`), and [`lookup`] indexes the
//! original document back to exactly that node, so consumers can jump from a
//! violation to source.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One step of a position: a container field plus an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionStep {
    pub field: String,
    pub index: usize,
}

/// Ordered path from the document root to a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position(Vec<PositionStep>);

impl Position {
    /// The document root (empty path).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Extend this position by one `field[index]` step.
    pub fn child(&self, field: &str, index: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(PositionStep {
            field: field.to_string(),
            index,
        });
        Self(steps)
    }

    /// The position of the containing node (one step shorter).
    pub fn parent(&self) -> Self {
        let mut steps = self.0.clone();
        steps.pop();
        Self(steps)
    }

    pub fn steps(&self) -> &[PositionStep] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Render as `epics[i].sub_epics[j]....`.
    ///
    /// Injective across distinct nodes: two different positions always render
    /// to two different strings.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(&step.field);
            out.push('[');
            out.push_str(&step.index.to_string());
            out.push(']');
        }
        out
    }

    /// Render with a leaf field appended (`....acceptance_criteria`).
    ///
    /// Used when a rule points at a specific field of the node rather than
    /// the node itself.
    pub fn render_with_field(&self, field: &str) -> String {
        let base = self.render();
        if base.is_empty() {
            field.to_string()
        } else {
            format!("{base}.{field}")
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Index the original document with a position, returning the raw subtree
/// the position addresses. `None` when the document no longer has that shape.
pub fn lookup<'a>(doc: &'a Value, position: &Position) -> Option<&'a Value> {
    let mut current = doc;
    for step in position.steps() {
        current = current.get(&step.field)?.get(step.index)?;
    }
    Some(current)
}
