//! Domain-concept model.
//!
//! CRC-style concept descriptions attach to epics and sub-epics under a
//! `domain_concepts` list. They form a sibling tree to the story nodes and
//! are addressed the same way, anchored to the owning epic/sub-epic index
//! chain plus the concept index.

use crate::story::graph::StoryGraph;
use crate::story::location::Position;
use crate::story::node::{str_field, str_list};
use serde_json::Value;

/// One responsibility of a concept, with its collaborator names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Responsibility {
    pub name: String,
    pub collaborators: Vec<String>,
}

/// A CRC-card-style domain concept.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DomainConceptNode {
    pub name: String,
    pub responsibilities: Vec<Responsibility>,
    pub position: Position,
}

impl DomainConceptNode {
    fn from_value(value: &Value, position: Position) -> Self {
        let responsibilities = value
            .get("responsibilities")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| Responsibility {
                        name: str_field(item, "name").unwrap_or_default(),
                        collaborators: str_list(item, "collaborators"),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            name: str_field(value, "name").unwrap_or_default(),
            responsibilities,
            position,
        }
    }
}

/// Collect every domain concept in the document, in traversal order.
pub fn collect_concepts(graph: &StoryGraph) -> Vec<DomainConceptNode> {
    let mut concepts = Vec::new();
    for (i, epic) in graph.epics().iter().enumerate() {
        collect_from(epic, &Position::root().child("epics", i), &mut concepts);
    }
    concepts
}

fn collect_from(owner: &Value, position: &Position, out: &mut Vec<DomainConceptNode>) {
    if let Some(items) = owner.get("domain_concepts").and_then(Value::as_array) {
        for (i, item) in items.iter().enumerate() {
            out.push(DomainConceptNode::from_value(
                item,
                position.child("domain_concepts", i),
            ));
        }
    }
    if let Some(sub_epics) = owner.get("sub_epics").and_then(Value::as_array) {
        for (i, sub) in sub_epics.iter().enumerate() {
            collect_from(sub, &position.child("sub_epics", i), out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collects_from_epics_and_sub_epics() {
        let graph = StoryGraph::from_value(json!({
            "epics": [{
                "name": "Checkout",
                "domain_concepts": [{
                    "name": "Cart",
                    "responsibilities": [
                        {"name": "Holds items", "collaborators": ["Item", "Pricing"]}
                    ]
                }],
                "sub_epics": [{
                    "name": "Payment",
                    "domain_concepts": [{"name": "Charge"}]
                }]
            }]
        }))
        .unwrap();

        let concepts = collect_concepts(&graph);
        assert_eq!(concepts.len(), 2);
        assert_eq!(concepts[0].name, "Cart");
        assert_eq!(
            concepts[0].position.render(),
            "epics[0].domain_concepts[0]"
        );
        assert_eq!(concepts[0].responsibilities[0].collaborators.len(), 2);
        assert_eq!(
            concepts[1].position.render(),
            "epics[0].sub_epics[0].domain_concepts[0]"
        );
        assert!(concepts[1].responsibilities.is_empty());
    }

    #[test]
    fn test_concept_position_round_trips() {
        let doc = json!({
            "epics": [{
                "sub_epics": [{
                    "domain_concepts": [{"name": "Ledger"}]
                }]
            }]
        });
        let graph = StoryGraph::from_value(doc.clone()).unwrap();
        let concepts = collect_concepts(&graph);
        let found = crate::story::location::lookup(&doc, &concepts[0].position).unwrap();
        assert_eq!(found["name"], "Ledger");
    }
}
