//! Story-graph node variants.
//!
//! The document's nesting levels become one struct with a tagged `kind`:
//! scanners match exhaustively on [`NodeKind`] instead of downcasting.
//! Typed per-kind fields are extracted once, here, at construction time;
//! malformed input never fails construction; missing or wrongly-typed
//! fields degrade to empty defaults and a rule flags the gap if it cares.

use crate::story::location::Position;
use serde_json::Value;

/// One node of the story tree.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryNode {
    pub name: String,
    pub position: Position,
    /// Raw subtree, for untyped extras a rule may want to inspect.
    pub data: Value,
    pub kind: NodeKind,
}

/// Discriminator plus typed per-kind payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Epic,
    SubEpic,
    /// Sequencing container of stories. A bare `stories[]` under a parent is
    /// one unnamed group for addressing purposes.
    StoryGroup,
    Story(StoryFields),
    Scenario(ScenarioFields),
    ScenarioOutline(OutlineFields),
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Epic => "epic",
            NodeKind::SubEpic => "sub_epic",
            NodeKind::StoryGroup => "story_group",
            NodeKind::Story(_) => "story",
            NodeKind::Scenario(_) => "scenario",
            NodeKind::ScenarioOutline(_) => "scenario_outline",
        }
    }

    /// Containers are traversed but are never the unit a story-level rule
    /// runs against.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Epic | NodeKind::SubEpic | NodeKind::StoryGroup
        )
    }
}

/// Typed fields of a story.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoryFields {
    pub acceptance_criteria: Vec<String>,
    /// Position on the delivery spine, when the document sequences stories.
    pub sequential_order: Option<i64>,
    pub optional: bool,
}

impl StoryFields {
    pub fn from_value(value: &Value) -> Self {
        Self {
            acceptance_criteria: str_list(value, "acceptance_criteria"),
            sequential_order: value.get("sequential_order").and_then(Value::as_i64),
            optional: value
                .get("optional")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }
}

/// Typed fields of a scenario.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScenarioFields {
    /// Ordered Given/When/Then/And step strings.
    pub steps: Vec<String>,
    pub background: Option<String>,
    /// Test linkage, when the authoring agent has recorded it.
    pub test_file: Option<String>,
    pub test_function: Option<String>,
}

impl ScenarioFields {
    pub fn from_value(value: &Value) -> Self {
        Self {
            steps: str_list(value, "steps"),
            background: str_field(value, "background"),
            test_file: str_field(value, "test_file"),
            test_function: str_field(value, "test_function"),
        }
    }
}

/// Scenario outline: a scenario plus its examples table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutlineFields {
    pub scenario: ScenarioFields,
    /// Example rows, kept raw; the renderer owns row expansion.
    pub examples: Vec<Value>,
}

impl OutlineFields {
    pub fn from_value(value: &Value) -> Self {
        Self {
            scenario: ScenarioFields::from_value(value),
            examples: value
                .get("examples")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        }
    }
}

impl StoryNode {
    /// Build a node from a raw subtree. Name degrades to empty when missing
    /// or mistyped.
    pub fn from_value(value: &Value, position: Position, kind: NodeKind) -> Self {
        Self {
            name: str_field(value, "name").unwrap_or_default(),
            position,
            data: value.clone(),
            kind,
        }
    }
}

pub(crate) fn str_field(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

pub(crate) fn str_list(value: &Value, field: &str) -> Vec<String> {
    value
        .get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_story_fields_extraction() {
        let value = json!({
            "name": "Pay by card",
            "acceptance_criteria": ["Charge succeeds", "Receipt is sent"],
            "sequential_order": 3,
            "optional": true
        });
        let fields = StoryFields::from_value(&value);
        assert_eq!(fields.acceptance_criteria.len(), 2);
        assert_eq!(fields.sequential_order, Some(3));
        assert!(fields.optional);
    }

    #[test]
    fn test_malformed_fields_degrade_to_defaults() {
        // Wrong types everywhere: construction still succeeds.
        let value = json!({
            "name": 42,
            "acceptance_criteria": "not a list",
            "sequential_order": "third",
            "optional": "yes"
        });
        let fields = StoryFields::from_value(&value);
        assert!(fields.acceptance_criteria.is_empty());
        assert_eq!(fields.sequential_order, None);
        assert!(!fields.optional);

        let node = StoryNode::from_value(&value, Position::root(), NodeKind::Story(fields));
        assert_eq!(node.name, "");
    }

    #[test]
    fn test_scenario_fields_extraction() {
        let value = json!({
            "name": "Successful card payment",
            "steps": ["Given a cart", "When I pay", "Then I get a receipt"],
            "background": "A registered user",
            "test_file": "test_payment.py"
        });
        let fields = ScenarioFields::from_value(&value);
        assert_eq!(fields.steps.len(), 3);
        assert_eq!(fields.background.as_deref(), Some("A registered user"));
        assert_eq!(fields.test_file.as_deref(), Some("test_payment.py"));
        assert_eq!(fields.test_function, None);
    }

    #[test]
    fn test_container_discrimination() {
        assert!(NodeKind::Epic.is_container());
        assert!(NodeKind::StoryGroup.is_container());
        assert!(!NodeKind::Story(StoryFields::default()).is_container());
        assert!(!NodeKind::Scenario(ScenarioFields::default()).is_container());
        assert_eq!(
            NodeKind::ScenarioOutline(OutlineFields::default()).label(),
            "scenario_outline"
        );
    }
}
