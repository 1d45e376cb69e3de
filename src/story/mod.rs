//! Story-graph tree model: document wrapper, node variants, navigable map,
//! location addressing and the domain-concept sibling tree.

mod concepts;
mod graph;
mod location;
mod map;
mod node;

pub use concepts::{collect_concepts, DomainConceptNode, Responsibility};
pub use graph::StoryGraph;
pub use location::{lookup, Position, PositionStep};
pub use map::{StoryMap, TreeNode, Walk};
pub use node::{NodeKind, OutlineFields, ScenarioFields, StoryFields, StoryNode};
