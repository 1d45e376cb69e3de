//! Test Assertions Scanner
//!
//! A test function that never asserts verifies nothing. Works off the
//! pre-parsed syntax tree; files without one are skipped rather than
//! guessed at.

use crate::models::{Rule, Violation};
use crate::scanners::base::{FileScanner, FileUnit};
use anyhow::Result;

pub struct TestAssertionsScanner;

impl TestAssertionsScanner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TestAssertionsScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FileScanner for TestAssertionsScanner {
    fn name(&self) -> &'static str {
        "TestAssertionsScanner"
    }

    fn description(&self) -> &'static str {
        "Test functions contain at least one assertion"
    }

    fn scan_file(&self, file: &FileUnit<'_>, rule: &Rule) -> Result<Vec<Violation>> {
        let Some(tree) = file.syntax else {
            return Ok(vec![]);
        };
        Ok(tree
            .functions()
            .into_iter()
            .filter(|f| f.name.starts_with("test_") && !f.has_assert)
            .map(|f| {
                Violation::new(
                    rule,
                    format!("Test function `{}` has no assertion", f.name),
                    file.path.display().to_string(),
                )
                .with_line(f.line)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScannerRef, Severity};
    use crate::parsers::SyntaxTree;
    use crate::scanners::base::FileKind;
    use crate::story::StoryGraph;
    use serde_json::json;
    use std::path::Path;

    fn scan(content: &str) -> Vec<Violation> {
        let graph = StoryGraph::from_value(json!({"epics": []})).unwrap();
        let path = Path::new("tests/test_payment.py");
        let syntax = SyntaxTree::parse(path, content);
        let unit = FileUnit {
            path,
            content,
            syntax: syntax.as_ref(),
            graph: &graph,
            kind: FileKind::Test,
        };
        let rule = Rule::new(
            "test-assertions",
            ScannerRef::new("scanners", "TestAssertionsScanner"),
            Severity::Warning,
        );
        TestAssertionsScanner::new().scan_file(&unit, &rule).unwrap()
    }

    #[test]
    fn test_function_without_assert_is_flagged() {
        let violations = scan(
            "def test_noop():\n    do_something()\n\ndef test_real():\n    assert 1 == 1\n",
        );
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("test_noop"));
        assert_eq!(violations[0].line_number, Some(1));
    }

    #[test]
    fn test_helpers_are_not_test_functions() {
        let violations = scan("def helper():\n    do_something()\n");
        assert!(violations.is_empty());
    }

    #[test]
    fn test_no_syntax_tree_means_no_findings() {
        let graph = StoryGraph::from_value(json!({"epics": []})).unwrap();
        let unit = FileUnit {
            path: Path::new("tests/test_x.py"),
            content: "def test_noop():\n    pass\n",
            syntax: None,
            graph: &graph,
            kind: FileKind::Test,
        };
        let rule = Rule::new(
            "test-assertions",
            ScannerRef::new("scanners", "TestAssertionsScanner"),
            Severity::Warning,
        );
        assert!(TestAssertionsScanner::new()
            .scan_file(&unit, &rule)
            .unwrap()
            .is_empty());
    }
}
