//! Scope-filtering sublanguage.
//!
//! A scope narrows a scan (or any other operation) to a subset of the story
//! tree or of the file corpus. Resolution is pure and idempotent; a scope
//! that matches nothing yields an empty set, never an error. This module is
//! a standalone entry point; build, render and action flows use it without ever
//! running a scan.

use crate::story::{NodeKind, StoryGraph, StoryMap};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Priority an increment scope refers to: numeric, or a legacy label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriorityRef {
    Number(i64),
    Label(String),
}

impl PriorityRef {
    /// Resolve to a numeric priority.
    ///
    /// Legacy labels map `NOW`/`SOON` to 1 and `LATER`/`NEXT` to 2; anything
    /// unrecognized maps to 999. The whole table lives here so the
    /// document-format owners can revisit the conflation in one place.
    pub fn priority(&self) -> i64 {
        match self {
            PriorityRef::Number(n) => *n,
            PriorityRef::Label(label) => priority_from_label(label),
        }
    }
}

pub fn priority_from_label(label: &str) -> i64 {
    if let Ok(n) = label.trim().parse::<i64>() {
        return n;
    }
    match label.trim().to_ascii_uppercase().as_str() {
        "NOW" | "SOON" => 1,
        "LATER" | "NEXT" => 2,
        _ => 999,
    }
}

/// Filter spec narrowing an operation to part of the tree or corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Scope {
    All,
    StoryNames(Vec<String>),
    EpicNames(Vec<String>),
    FilePatterns(Vec<String>),
    IncrementPriority(PriorityRef),
}

impl Default for Scope {
    fn default() -> Self {
        Scope::All
    }
}

impl Scope {
    pub fn is_all(&self) -> bool {
        matches!(self, Scope::All)
    }

    /// Story names selected by this scope, or `None` when the scope does not
    /// restrict the tree (`all`, `file_patterns`).
    ///
    /// Pure projection: the graph is untouched and the same inputs always
    /// yield the same set.
    pub fn resolve_stories(&self, graph: &StoryGraph) -> Option<BTreeSet<String>> {
        match self {
            Scope::All | Scope::FilePatterns(_) => None,
            Scope::StoryNames(names) => {
                let known: BTreeSet<String> = StoryMap::build(graph).story_names().into_iter().collect();
                Some(names.iter().filter(|n| known.contains(*n)).cloned().collect())
            }
            Scope::EpicNames(names) => Some(stories_under_epics(graph, names)),
            Scope::IncrementPriority(priority) => {
                Some(stories_in_increment(graph, priority.priority()))
            }
        }
    }

    /// Concrete in-scope story set, with `all` expanded to every story.
    pub fn in_scope_stories(&self, graph: &StoryGraph) -> BTreeSet<String> {
        self.resolve_stories(graph)
            .unwrap_or_else(|| StoryMap::build(graph).story_names().into_iter().collect())
    }

    /// Files selected by this scope, order preserved. Non-file scopes leave
    /// the universe unrestricted.
    pub fn resolve_files(&self, files: &[PathBuf]) -> Vec<PathBuf> {
        match self {
            Scope::FilePatterns(patterns) => {
                let set = match build_glob_set(patterns) {
                    Some(set) => set,
                    None => return Vec::new(),
                };
                files
                    .iter()
                    .filter(|path| set.is_match(canonical_slashes(path)))
                    .cloned()
                    .collect()
            }
            _ => files.to_vec(),
        }
    }
}

/// Forward-slash canonical form used for glob matching on every platform.
fn canonical_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn build_glob_set(patterns: &[String]) -> Option<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    let mut any = false;
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
                any = true;
            }
            Err(err) => warn!("skipping invalid file pattern `{pattern}`: {err}"),
        }
    }
    if !any {
        return None;
    }
    match builder.build() {
        Ok(set) => Some(set),
        Err(err) => {
            warn!("failed to compile file patterns: {err}");
            None
        }
    }
}

/// Every story transitively reachable under the named epics, via the same
/// traversal the tree model uses.
fn stories_under_epics(graph: &StoryGraph, names: &[String]) -> BTreeSet<String> {
    let map = StoryMap::build(graph);
    let mut stories = BTreeSet::new();
    for epic in map.epics() {
        if !names.iter().any(|n| n == &epic.node.name) {
            continue;
        }
        for tree in map.walk(epic) {
            if matches!(tree.node.kind, NodeKind::Story(_)) {
                stories.insert(tree.node.name.clone());
            }
        }
    }
    debug!("epic scope resolved to {} stories", stories.len());
    stories
}

/// Stories referenced by the increment with the given priority, collected
/// recursively through nested sub-epics and story groups.
fn stories_in_increment(graph: &StoryGraph, priority: i64) -> BTreeSet<String> {
    let mut stories = BTreeSet::new();
    for increment in graph.increments() {
        let this_priority = match increment.get("priority") {
            Some(Value::Number(n)) => n.as_i64().unwrap_or(999),
            Some(Value::String(label)) => priority_from_label(label),
            _ => 999,
        };
        if this_priority == priority {
            collect_story_refs(increment, &mut stories);
        }
    }
    stories
}

fn collect_story_refs(value: &Value, out: &mut BTreeSet<String>) {
    let Some(obj) = value.as_object() else { return };

    if let Some(items) = obj.get("stories").and_then(Value::as_array) {
        for item in items {
            match item {
                Value::String(name) => {
                    out.insert(name.clone());
                }
                Value::Object(story) => {
                    if let Some(name) = story.get("name").and_then(Value::as_str) {
                        out.insert(name.to_string());
                    }
                }
                _ => {}
            }
        }
    }

    for key in ["epics", "sub_epics", "story_groups"] {
        if let Some(children) = obj.get(key).and_then(Value::as_array) {
            for child in children {
                collect_story_refs(child, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_epic_graph() -> StoryGraph {
        StoryGraph::from_value(json!({
            "epics": [
                {
                    "name": "Checkout",
                    "sub_epics": [{
                        "name": "Payment",
                        "story_groups": [{
                            "name": "Cards",
                            "stories": [{"name": "Pay by card"}, {"name": "Refund"}]
                        }]
                    }],
                    "stories": [{"name": "Browse catalog"}]
                },
                {
                    "name": "Billing",
                    "stories": [{"name": "Monthly invoice"}]
                }
            ],
            "increments": [
                {
                    "priority": 1,
                    "epics": [{
                        "name": "Checkout",
                        "sub_epics": [{
                            "story_groups": [{"stories": ["Pay by card"]}]
                        }]
                    }]
                },
                {
                    "priority": 2,
                    "stories": ["Monthly invoice"]
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_epic_names_expands_transitively() {
        let graph = two_epic_graph();
        let scope = Scope::EpicNames(vec!["Checkout".to_string()]);
        let stories = scope.resolve_stories(&graph).unwrap();
        assert_eq!(
            stories,
            BTreeSet::from([
                "Pay by card".to_string(),
                "Refund".to_string(),
                "Browse catalog".to_string()
            ])
        );
    }

    #[test]
    fn test_story_names_exact_case_sensitive() {
        let graph = two_epic_graph();
        let scope = Scope::StoryNames(vec!["Refund".into(), "refund".into(), "Nope".into()]);
        let stories = scope.resolve_stories(&graph).unwrap();
        assert_eq!(stories, BTreeSet::from(["Refund".to_string()]));
    }

    #[test]
    fn test_increment_label_matches_numeric() {
        let graph = two_epic_graph();
        let by_label = Scope::IncrementPriority(PriorityRef::Label("NOW".into()));
        let by_number = Scope::IncrementPriority(PriorityRef::Number(1));
        assert_eq!(
            by_label.resolve_stories(&graph),
            by_number.resolve_stories(&graph)
        );
        assert_eq!(
            by_label.resolve_stories(&graph).unwrap(),
            BTreeSet::from(["Pay by card".to_string()])
        );
    }

    #[test]
    fn test_legacy_label_table() {
        assert_eq!(priority_from_label("NOW"), 1);
        assert_eq!(priority_from_label("soon"), 1);
        assert_eq!(priority_from_label("LATER"), 2);
        assert_eq!(priority_from_label("Next"), 2);
        assert_eq!(priority_from_label("someday"), 999);
        assert_eq!(priority_from_label("2"), 2);
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let graph = two_epic_graph();
        let scope = Scope::EpicNames(vec!["Shipping".into()]);
        assert!(scope.resolve_stories(&graph).unwrap().is_empty());

        let missing = Scope::IncrementPriority(PriorityRef::Number(7));
        assert!(missing.resolve_stories(&graph).unwrap().is_empty());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let graph = two_epic_graph();
        let scope = Scope::EpicNames(vec!["Billing".into()]);
        let first = scope.in_scope_stories(&graph);
        let second = scope.in_scope_stories(&graph);
        assert_eq!(first, second);
    }

    #[test]
    fn test_file_patterns_with_recursive_glob() {
        let files = vec![
            PathBuf::from("tests/checkout/test_payment.py"),
            PathBuf::from("tests/billing/test_invoice.py"),
            PathBuf::from("src/payment.py"),
        ];
        let scope = Scope::FilePatterns(vec!["tests/**/*.py".to_string()]);
        let matched = scope.resolve_files(&files);
        assert_eq!(matched.len(), 2);
        assert!(matched.iter().all(|p| p.starts_with("tests")));

        // Non-file scopes leave the universe unrestricted.
        assert_eq!(Scope::All.resolve_files(&files).len(), 3);
    }

    #[test]
    fn test_invalid_pattern_matches_nothing() {
        let files = vec![PathBuf::from("a.py")];
        let scope = Scope::FilePatterns(vec!["[".to_string()]);
        assert!(scope.resolve_files(&files).is_empty());
    }

    #[test]
    fn test_scope_deserializes_from_kind_value() {
        let scope: Scope =
            serde_json::from_value(json!({"kind": "increment_priority", "value": "NOW"})).unwrap();
        assert_eq!(
            scope,
            Scope::IncrementPriority(PriorityRef::Label("NOW".into()))
        );

        let all: Scope = serde_json::from_value(json!({"kind": "all"})).unwrap();
        assert!(all.is_all());
    }
}
