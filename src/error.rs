//! Hard failures of the scan engine.
//!
//! Almost every bad input this crate sees recovers locally: malformed tree
//! fields degrade to defaults, scope misses yield empty sets, and a broken
//! scanner only loses its own contribution. The two conditions below are the
//! exceptions that propagate as typed errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    /// The top-level story document could not be parsed at all.
    #[error("failed to parse story document: {0}")]
    Document(#[from] serde_json::Error),

    /// The story document parsed but its root is not a mapping.
    #[error("story document root must be a mapping, got {found}")]
    DocumentShape { found: &'static str },

    /// A rule is missing part of its required metadata contract.
    #[error("rule `{rule}` is missing required metadata: {detail}")]
    RuleContract { rule: String, detail: String },
}
