//! Raw parsed story-graph document.
//!
//! `StoryGraph` wraps the document as supplied by the caller and is reparsed
//! fresh for every invocation; nothing is cached across calls. Parsing is
//! permissive: unknown fields are ignored and missing optional sections
//! default to empty. The only hard failure is a document whose root is not a
//! mapping at all.

use crate::error::ScanError;
use crate::scope::Scope;
use serde_json::Value;
use tracing::warn;

static EMPTY: Vec<Value> = Vec::new();

#[derive(Debug, Clone)]
pub struct StoryGraph {
    root: Value,
}

impl StoryGraph {
    /// Wrap an already-parsed document.
    pub fn from_value(root: Value) -> Result<Self, ScanError> {
        if !root.is_object() {
            return Err(ScanError::DocumentShape {
                found: json_type_name(&root),
            });
        }
        Ok(Self { root })
    }

    /// Parse a document from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ScanError> {
        let root: Value = serde_json::from_str(text)?;
        Self::from_value(root)
    }

    /// The raw document, for position lookups and untyped access.
    pub fn document(&self) -> &Value {
        &self.root
    }

    /// Top-level epics; empty when missing or mistyped.
    pub fn epics(&self) -> &[Value] {
        list_section(&self.root, "epics")
    }

    /// Optional increments section.
    pub fn increments(&self) -> &[Value] {
        list_section(&self.root, "increments")
    }

    /// Ambient scope embedded in the document, if any.
    ///
    /// An unparsable `_validation_scope` is ignored with a warning rather
    /// than failing the scan.
    pub fn validation_scope(&self) -> Option<Scope> {
        let raw = self.root.get("_validation_scope")?;
        match serde_json::from_value::<Scope>(raw.clone()) {
            Ok(scope) => Some(scope),
            Err(err) => {
                warn!("ignoring malformed _validation_scope: {err}");
                None
            }
        }
    }
}

fn list_section<'a>(root: &'a Value, field: &str) -> &'a [Value] {
    root.get(field)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&EMPTY)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
