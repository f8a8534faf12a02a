//! # Error Types
//!
//! Errors raised while constructing core data-model values. Evaluation
//! failures are deliberately absent here: they never escape the evaluator
//! and are carried as data in [`crate::EvaluationOutcome::error`].

use thiserror::Error;

/// Top-level error type for the EagleEye data model.
#[derive(Error, Debug)]
pub enum EagleEyeError {
    /// A financial record could not be built from the supplied input.
    #[error("invalid financial record: {0}")]
    InvalidRecord(String),

    /// A rule could not be decoded from its serialized form.
    #[error("invalid rule: {0}")]
    InvalidRule(String),

    /// An enum value (category, priority, severity) was not recognised.
    #[error("unknown {kind}: {value:?}")]
    UnknownVariant {
        /// Which enum was being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// A timestamp string could not be parsed.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
