//! # eagleeye-rules — Rulebook Loading and Retrieval
//!
//! The curated rulebook is a JSONL file, one rule per line. This crate
//! loads it into an in-memory [`Rulebook`], answers the lookups the audit
//! pipeline and the CLI need (by id, by category, critical only, free-text
//! search), and ranks rules against a document by trigger-keyword overlap.
//!
//! ## Loading policy
//!
//! A malformed line never fails the load. It is logged at `warn`, recorded
//! as a [`SkippedLine`], and the remaining lines are still read. Only I/O
//! failures surface as [`RulebookError`].
//!
//! ## Retrieval
//!
//! Keyword retrieval scores each rule by the Jaccard overlap between its
//! trigger keywords and the query keywords. Rules with no overlap are not
//! returned at all. Vector similarity search is not part of this crate;
//! anything that can hand back a rule list can stand in for it through the
//! [`RuleSource`] trait.

pub mod error;
pub mod keywords;
pub mod loader;
pub mod rulebook;
pub mod source;

pub use error::RulebookError;
pub use keywords::{extract_keywords, DEFAULT_VOCABULARY};
pub use loader::{parse_jsonl, RuleLoad, SkippedLine};
pub use rulebook::{Rulebook, ScoredRule};
pub use source::{JsonlRuleSource, RuleSource};

/// Number of rules retrieved for a document when not checking all rules.
pub const DEFAULT_TOP_K: usize = 20;
