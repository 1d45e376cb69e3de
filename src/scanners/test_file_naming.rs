//! Test File Naming Scanner
//!
//! Test files follow the house pattern: `test_*.py` or `*_test.py`. Files in
//! other languages are left alone.

use crate::models::{Rule, Violation};
use crate::scanners::base::{FileScanner, FileUnit};
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

static TEST_NAME: OnceLock<Regex> = OnceLock::new();

fn test_name() -> &'static Regex {
    TEST_NAME.get_or_init(|| Regex::new(r"^(test_.+|.+_test)\.py$").expect("valid regex"))
}

pub struct TestFileNamingScanner;

impl TestFileNamingScanner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TestFileNamingScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FileScanner for TestFileNamingScanner {
    fn name(&self) -> &'static str {
        "TestFileNamingScanner"
    }

    fn description(&self) -> &'static str {
        "Test files match test_*.py or *_test.py"
    }

    fn scan_file(&self, file: &FileUnit<'_>, rule: &Rule) -> Result<Vec<Violation>> {
        let Some(file_name) = file.path.file_name().and_then(|n| n.to_str()) else {
            return Ok(vec![]);
        };
        if !file_name.ends_with(".py") || test_name().is_match(file_name) {
            return Ok(vec![]);
        }
        Ok(vec![Violation::new(
            rule,
            format!("Test file `{file_name}` does not match test_*.py or *_test.py"),
            file.path.display().to_string(),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScannerRef, Severity};
    use crate::scanners::base::FileKind;
    use crate::story::StoryGraph;
    use serde_json::json;
    use std::path::Path;

    fn scan(path: &str) -> Vec<Violation> {
        let graph = StoryGraph::from_value(json!({"epics": []})).unwrap();
        let unit = FileUnit {
            path: Path::new(path),
            content: "",
            syntax: None,
            graph: &graph,
            kind: FileKind::Test,
        };
        let rule = Rule::new(
            "test-file-naming",
            ScannerRef::new("scanners", "TestFileNamingScanner"),
            Severity::Warning,
        );
        TestFileNamingScanner::new().scan_file(&unit, &rule).unwrap()
    }

    #[test]
    fn test_conforming_names_pass() {
        assert!(scan("tests/test_payment.py").is_empty());
        assert!(scan("tests/payment_test.py").is_empty());
    }

    #[test]
    fn test_bad_name_is_flagged_with_path_location() {
        let violations = scan("tests/payment.py");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location, "tests/payment.py");
    }

    #[test]
    fn test_non_python_is_ignored() {
        assert!(scan("tests/payment.feature").is_empty());
    }
}
