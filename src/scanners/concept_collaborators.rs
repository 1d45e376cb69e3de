//! Concept Collaborators Scanner
//!
//! Collaborator names on a responsibility should point at concepts that
//! exist somewhere in the document; a dangling collaborator usually means a
//! renamed or forgotten card.

use crate::models::{Rule, Violation};
use crate::scanners::base::ConceptScanner;
use crate::story::DomainConceptNode;
use anyhow::Result;
use std::collections::BTreeSet;

pub struct ConceptCollaboratorsScanner;

impl ConceptCollaboratorsScanner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConceptCollaboratorsScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ConceptScanner for ConceptCollaboratorsScanner {
    fn name(&self) -> &'static str {
        "ConceptCollaboratorsScanner"
    }

    fn description(&self) -> &'static str {
        "Collaborators must name known domain concepts"
    }

    fn scan_concept(
        &self,
        concept: &DomainConceptNode,
        peers: &[DomainConceptNode],
        rule: &Rule,
    ) -> Result<Vec<Violation>> {
        let known: BTreeSet<&str> = peers.iter().map(|c| c.name.as_str()).collect();
        let mut violations = Vec::new();
        for (i, responsibility) in concept.responsibilities.iter().enumerate() {
            for collaborator in &responsibility.collaborators {
                if !known.contains(collaborator.as_str()) {
                    violations.push(Violation::new(
                        rule,
                        format!(
                            "Concept `{}` collaborates with unknown concept `{collaborator}`",
                            concept.name
                        ),
                        concept.position.child("responsibilities", i).render(),
                    ));
                }
            }
        }
        Ok(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScannerRef, Severity};
    use crate::story::{collect_concepts, StoryGraph};
    use serde_json::json;

    fn scan(doc: serde_json::Value) -> Vec<Violation> {
        let graph = StoryGraph::from_value(doc).unwrap();
        let concepts = collect_concepts(&graph);
        let scanner = ConceptCollaboratorsScanner::new();
        let rule = Rule::new(
            "concept-collaborators",
            ScannerRef::new("scanners", "ConceptCollaboratorsScanner"),
            Severity::Info,
        );
        let mut out = Vec::new();
        for concept in &concepts {
            out.extend(scanner.scan_concept(concept, &concepts, &rule).unwrap());
        }
        out
    }

    #[test]
    fn test_known_collaborators_pass_across_epics() {
        let violations = scan(json!({
            "epics": [
                {"domain_concepts": [{
                    "name": "Cart",
                    "responsibilities": [{"name": "Totals", "collaborators": ["Pricing"]}]
                }]},
                {"domain_concepts": [{"name": "Pricing"}]}
            ]
        }));
        assert!(violations.is_empty());
    }

    #[test]
    fn test_dangling_collaborator_is_flagged() {
        let violations = scan(json!({
            "epics": [{"domain_concepts": [{
                "name": "Cart",
                "responsibilities": [
                    {"name": "Totals", "collaborators": ["Pricing"]}
                ]
            }]}]
        }));
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("Pricing"));
        assert_eq!(
            violations[0].location,
            "epics[0].domain_concepts[0].responsibilities[0]"
        );
    }
}
