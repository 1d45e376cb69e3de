//! Navigable story tree.
//!
//! [`StoryMap`] turns the raw document into a tree of [`StoryNode`]s with
//! positions assigned by array index during the build walk. Traversal is
//! depth-first pre-order in document array order, never alphabetical, so
//! violation ordering stays reproducible for diffing.

use crate::story::graph::StoryGraph;
use crate::story::location::Position;
use crate::story::node::{
    NodeKind, OutlineFields, ScenarioFields, StoryFields, StoryNode,
};
use serde_json::Value;
use std::collections::BTreeSet;

/// A story node together with its children, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub node: StoryNode,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Direct scenario and scenario-outline children.
    pub fn scenarios(&self) -> impl Iterator<Item = &TreeNode> {
        self.children.iter().filter(|c| {
            matches!(
                c.node.kind,
                NodeKind::Scenario(_) | NodeKind::ScenarioOutline(_)
            )
        })
    }
}

/// Navigable wrapper over a story graph.
#[derive(Debug, Clone, Default)]
pub struct StoryMap {
    epics: Vec<TreeNode>,
}

impl StoryMap {
    /// Build the tree, assigning positions by array index while walking.
    pub fn build(graph: &StoryGraph) -> Self {
        let epics = graph
            .epics()
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let position = Position::root().child("epics", i);
                let node = StoryNode::from_value(value, position.clone(), NodeKind::Epic);
                TreeNode {
                    node,
                    children: build_children(value, &position),
                }
            })
            .collect();
        Self { epics }
    }

    pub fn epics(&self) -> &[TreeNode] {
        &self.epics
    }

    /// Deterministic depth-first pre-order over the epic and every
    /// descendant, containers included.
    pub fn walk<'a>(&self, epic: &'a TreeNode) -> Walk<'a> {
        Walk { stack: vec![epic] }
    }

    /// All story names, in traversal order.
    pub fn story_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for epic in &self.epics {
            for tree in self.walk(epic) {
                if matches!(tree.node.kind, NodeKind::Story(_)) {
                    names.push(tree.node.name.clone());
                }
            }
        }
        names
    }

    /// Pure subset projection: keep only stories whose name is in `names`,
    /// unmodified, plus their ancestors. The receiver is untouched.
    pub fn filter(&self, names: &BTreeSet<String>) -> StoryMap {
        let epics = self
            .epics
            .iter()
            .filter_map(|epic| prune(epic, names))
            .collect();
        StoryMap { epics }
    }
}

fn prune(tree: &TreeNode, names: &BTreeSet<String>) -> Option<TreeNode> {
    match &tree.node.kind {
        // A kept story is cloned whole, scenarios included.
        NodeKind::Story(_) => names.contains(&tree.node.name).then(|| tree.clone()),
        NodeKind::Scenario(_) | NodeKind::ScenarioOutline(_) => None,
        NodeKind::Epic | NodeKind::SubEpic | NodeKind::StoryGroup => {
            let children: Vec<TreeNode> = tree
                .children
                .iter()
                .filter_map(|c| prune(c, names))
                .collect();
            (!children.is_empty()).then(|| TreeNode {
                node: tree.node.clone(),
                children,
            })
        }
    }
}

/// Pre-order iterator over a subtree.
pub struct Walk<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.stack.pop()?;
        // Reverse push keeps children in document order.
        for child in tree.children.iter().rev() {
            self.stack.push(child);
        }
        Some(tree)
    }
}

fn build_children(value: &Value, position: &Position) -> Vec<TreeNode> {
    let mut children = Vec::new();

    if let Some(sub_epics) = value.get("sub_epics").and_then(Value::as_array) {
        for (i, sub) in sub_epics.iter().enumerate() {
            let sub_position = position.child("sub_epics", i);
            let node = StoryNode::from_value(sub, sub_position.clone(), NodeKind::SubEpic);
            children.push(TreeNode {
                node,
                children: build_children(sub, &sub_position),
            });
        }
    }

    if let Some(groups) = value.get("story_groups").and_then(Value::as_array) {
        for (i, group) in groups.iter().enumerate() {
            let group_position = position.child("story_groups", i);
            let node = StoryNode::from_value(group, group_position.clone(), NodeKind::StoryGroup);
            children.push(TreeNode {
                node,
                children: build_stories(group, &group_position),
            });
        }
    }

    // Bare stories[] become one unnamed group. The group has no subtree of
    // its own in the document, so it reuses the owning parent's position and
    // `lookup` on it returns the parent; this is the one node whose address
    // is not unique. No catalog rule reports at a group, and a future
    // group-level rule must report at `position.child("stories", ..)` or
    // give the group a marker step first. The stories keep their own
    // stories[j] steps.
    if value
        .get("stories")
        .and_then(Value::as_array)
        .is_some_and(|stories| !stories.is_empty())
    {
        let node = StoryNode {
            name: String::new(),
            position: position.clone(),
            data: Value::Null,
            kind: NodeKind::StoryGroup,
        };
        children.push(TreeNode {
            node,
            children: build_stories(value, position),
        });
    }

    children
}

fn build_stories(owner: &Value, owner_position: &Position) -> Vec<TreeNode> {
    let Some(stories) = owner.get("stories").and_then(Value::as_array) else {
        return Vec::new();
    };

    stories
        .iter()
        .enumerate()
        .map(|(i, story)| {
            let story_position = owner_position.child("stories", i);
            let node = StoryNode::from_value(
                story,
                story_position.clone(),
                NodeKind::Story(StoryFields::from_value(story)),
            );
            TreeNode {
                node,
                children: build_scenarios(story, &story_position),
            }
        })
        .collect()
}

fn build_scenarios(story: &Value, story_position: &Position) -> Vec<TreeNode> {
    let mut children = Vec::new();

    if let Some(scenarios) = story.get("scenarios").and_then(Value::as_array) {
        for (i, scenario) in scenarios.iter().enumerate() {
            let position = story_position.child("scenarios", i);
            children.push(TreeNode {
                node: StoryNode::from_value(
                    scenario,
                    position,
                    NodeKind::Scenario(ScenarioFields::from_value(scenario)),
                ),
                children: Vec::new(),
            });
        }
    }

    if let Some(outlines) = story.get("scenario_outlines").and_then(Value::as_array) {
        for (i, outline) in outlines.iter().enumerate() {
            let position = story_position.child("scenario_outlines", i);
            children.push(TreeNode {
                node: StoryNode::from_value(
                    outline,
                    position,
                    NodeKind::ScenarioOutline(OutlineFields::from_value(outline)),
                ),
                children: Vec::new(),
            });
        }
    }

    children
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_graph() -> StoryGraph {
        StoryGraph::from_value(json!({
            "epics": [{
                "name": "Checkout",
                "sub_epics": [{
                    "name": "Payment",
                    "story_groups": [{
                        "name": "Card payments",
                        "stories": [
                            {
                                "name": "Pay by card",
                                "scenarios": [
                                    {"name": "Successful payment", "steps": []},
                                    {"name": "Declined card", "steps": []}
                                ]
                            },
                            {
                                "name": "Refund a payment",
                                "scenario_outlines": [
                                    {"name": "Refund amounts", "steps": [], "examples": []}
                                ]
                            }
                        ]
                    }]
                }],
                "stories": [
                    {"name": "Browse catalog", "scenarios": [{"name": "List products"}]}
                ]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_walk_is_preorder_document_order() {
        let map = StoryMap::build(&sample_graph());
        let labels: Vec<(String, String)> = map
            .walk(&map.epics()[0])
            .map(|t| (t.node.kind.label().to_string(), t.node.name.clone()))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("epic".into(), "Checkout".into()),
                ("sub_epic".into(), "Payment".into()),
                ("story_group".into(), "Card payments".into()),
                ("story".into(), "Pay by card".into()),
                ("scenario".into(), "Successful payment".into()),
                ("scenario".into(), "Declined card".into()),
                ("story".into(), "Refund a payment".into()),
                ("scenario_outline".into(), "Refund amounts".into()),
                ("story_group".into(), "".into()),
                ("story".into(), "Browse catalog".into()),
                ("scenario".into(), "List products".into()),
            ]
        );
    }

    #[test]
    fn test_positions_index_back_into_document() {
        let graph = sample_graph();
        let map = StoryMap::build(&graph);
        for tree in map.walk(&map.epics()[0]) {
            let found = crate::story::location::lookup(graph.document(), &tree.node.position)
                .unwrap_or_else(|| panic!("no value at {}", tree.node.position));
            if !tree.node.name.is_empty() {
                assert_eq!(found["name"], tree.node.name.as_str());
            }
        }
    }

    #[test]
    fn test_bare_stories_get_unnamed_group() {
        let map = StoryMap::build(&sample_graph());
        let epic = &map.epics()[0];
        let implicit = epic
            .children
            .iter()
            .find(|c| matches!(c.node.kind, NodeKind::StoryGroup) && c.node.name.is_empty())
            .expect("implicit group");
        assert_eq!(implicit.children[0].node.name, "Browse catalog");
        assert_eq!(
            implicit.children[0].node.position.render(),
            "epics[0].stories[0]"
        );

        // The implicit group borrows the owning parent's address; looking it
        // up lands on the parent, not on a group of its own.
        assert_eq!(implicit.node.position, epic.node.position);
        let graph = sample_graph();
        let found =
            crate::story::location::lookup(graph.document(), &implicit.node.position).unwrap();
        assert_eq!(found["name"], "Checkout");
    }

    #[test]
    fn test_filter_is_subset_projection() {
        let map = StoryMap::build(&sample_graph());
        let names: BTreeSet<String> = ["Refund a payment".to_string()].into();
        let filtered = map.filter(&names);

        assert_eq!(filtered.story_names(), vec!["Refund a payment"]);
        // Kept story is unmodified relative to the unfiltered tree.
        let original = map.epics()[0].children[0].children[0].children[1].clone();
        let kept = &filtered.epics()[0].children[0].children[0].children[0];
        assert_eq!(kept, &original);
        // The unfiltered map is still intact.
        assert_eq!(map.story_names().len(), 3);
    }

    #[test]
    fn test_filter_no_match_is_empty_not_error() {
        let map = StoryMap::build(&sample_graph());
        let filtered = map.filter(&BTreeSet::from(["Nope".to_string()]));
        assert!(filtered.epics().is_empty());
    }
}
