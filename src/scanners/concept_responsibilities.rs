//! Concept Responsibilities Scanner
//!
//! A CRC-style concept with no responsibilities describes nothing; flag it
//! so the authoring agent fills in the card.

use crate::models::{Rule, Violation};
use crate::scanners::base::ConceptScanner;
use crate::story::DomainConceptNode;
use anyhow::Result;

pub struct ConceptResponsibilitiesScanner;

impl ConceptResponsibilitiesScanner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConceptResponsibilitiesScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ConceptScanner for ConceptResponsibilitiesScanner {
    fn name(&self) -> &'static str {
        "ConceptResponsibilitiesScanner"
    }

    fn description(&self) -> &'static str {
        "Domain concepts must list at least one responsibility"
    }

    fn scan_concept(
        &self,
        concept: &DomainConceptNode,
        _peers: &[DomainConceptNode],
        rule: &Rule,
    ) -> Result<Vec<Violation>> {
        let mut violations = Vec::new();
        if concept.responsibilities.is_empty() {
            violations.push(Violation::new(
                rule,
                format!("Concept `{}` has no responsibilities", concept.name),
                concept.position.render_with_field("responsibilities"),
            ));
        }
        for (i, responsibility) in concept.responsibilities.iter().enumerate() {
            if responsibility.name.trim().is_empty() {
                violations.push(Violation::new(
                    rule,
                    format!("Concept `{}` has an unnamed responsibility", concept.name),
                    concept.position.child("responsibilities", i).render(),
                ));
            }
        }
        Ok(violations)
    }
}
