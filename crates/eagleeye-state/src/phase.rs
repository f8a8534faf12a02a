//! # Audit Phases
//!
//! ```text
//! Parsing ──▶ Retrieving ──▶ Evaluating ──▶ Reporting ──▶ Done
//!    │             │          │    ▲             │
//!    │             │          └────┘ one rule    │
//!    │             │           per step          │
//!    └─────────────┴──────────────┴──────────────┴──▶ Failed
//! ```
//!
//! `Done` and `Failed` are terminal. Every phase change is checked against
//! [`AuditPhase::can_transition_to`] and recorded as a [`PhaseTransition`];
//! the per-rule self-loop in `Evaluating` is not a phase change and is not
//! recorded.

use serde::{Deserialize, Serialize};

use eagleeye_core::Timestamp;

use crate::error::WorkflowError;

/// Phase of an audit run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditPhase {
    /// Obtaining the record and text from the document source.
    Parsing,
    /// Obtaining the rule set.
    Retrieving,
    /// Evaluating rules, one per step.
    Evaluating,
    /// Closing the accumulator into a report.
    Reporting,
    /// Run completed (terminal).
    Done,
    /// Run stopped by a stage fault (terminal).
    Failed,
}

impl AuditPhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Parsing => "PARSING",
            Self::Retrieving => "RETRIEVING",
            Self::Evaluating => "EVALUATING",
            Self::Reporting => "REPORTING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether `self → to` is an edge of the phase graph.
    pub fn can_transition_to(&self, to: AuditPhase) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, to),
            (_, Self::Failed)
                | (Self::Parsing, Self::Retrieving)
                | (Self::Retrieving, Self::Evaluating)
                | (Self::Evaluating, Self::Reporting)
                | (Self::Reporting, Self::Done)
        )
    }
}

impl std::fmt::Display for AuditPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Record of one phase change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: AuditPhase,
    pub to: AuditPhase,
    pub timestamp: Timestamp,
    pub reason: String,
}

/// Validate `from → to` and build its log entry.
pub(crate) fn transition(
    from: AuditPhase,
    to: AuditPhase,
    reason: impl Into<String>,
) -> Result<PhaseTransition, WorkflowError> {
    if from.is_terminal() {
        return Err(WorkflowError::TerminalState {
            state: from.name().to_string(),
        });
    }
    if !from.can_transition_to(to) {
        return Err(WorkflowError::InvalidTransition {
            from: from.name().to_string(),
            to: to.name().to_string(),
        });
    }
    Ok(PhaseTransition {
        from,
        to,
        timestamp: Timestamp::now(),
        reason: reason.into(),
    })
}
