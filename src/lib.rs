//! Storyscan: convention scanner for story-graph planning documents.
//!
//! Validates a hierarchical planning document (epics → sub-epics → story
//! groups → stories → scenarios, plus attached domain-concept descriptions)
//! and an associated source/test file corpus against a catalog of
//! authoring-convention rules.
//!
//! The crate is a library with one primary entry point,
//! [`scanners::ScanEngine::run`], which takes a [`scanners::ScanContext`]
//! and returns an ordered list of [`models::Violation`]s. Scope resolution
//! is also exposed standalone through [`scope`] for callers that only need
//! to know which stories or files a scope selects.

pub mod error;
pub mod models;
pub mod parsers;
pub mod scanners;
pub mod scope;
pub mod story;

pub use error::ScanError;
pub use models::{Rule, ScannerRef, Severity, Violation};
pub use scanners::{ScanContext, ScanEngine, ScannerRegistry};
pub use scope::Scope;
pub use story::{DomainConceptNode, StoryGraph, StoryMap, StoryNode};
