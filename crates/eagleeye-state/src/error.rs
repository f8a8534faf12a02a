//! # Error Types
//!
//! [`SourceError`] is what a [`DocumentSource`](crate::DocumentSource)
//! reports when it cannot produce a document. [`WorkflowError`] covers
//! phase-graph violations. Neither escapes an audit run: both end the run
//! in the `Failed` phase with the error text as the reason.

use std::path::PathBuf;

use thiserror::Error;

/// A document source could not produce a parsed document.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to read document {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document was read but its contents are unusable.
    #[error("malformed document {name}: {reason}")]
    Malformed { name: String, reason: String },

    /// An external parsing backend failed.
    #[error("document source unavailable: {0}")]
    Unavailable(String),
}

/// Phase-graph violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("invalid audit transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("audit run is in terminal phase {state}")]
    TerminalState { state: String },
}
