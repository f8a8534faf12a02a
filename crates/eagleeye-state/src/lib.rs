//! # eagleeye-state — Audit Orchestration State Machine
//!
//! Runs a rule set against one financial record as an explicit state
//! machine. Each run owns a [`WorkflowState`]; the [`AuditOrchestrator`]
//! advances it one unit of work at a time through the phases in
//! [`phase`](crate::phase).
//!
//! ## Execution modes
//!
//! - **Batch**: [`AuditOrchestrator::run`] (record and rules given
//!   directly) and [`AuditOrchestrator::audit`] (document and rule
//!   sources).
//! - **Streaming**: [`AuditSession::step`] for manual driving,
//!   [`AuditOrchestrator::stream`] for an iterator of [`Progress`]
//!   snapshots, [`AuditOrchestrator::run_with_progress`] for a callback.
//!
//! All modes share the same step function. Early abort is simply not
//! calling `step` again; [`WorkflowState::into_report`] then yields the
//! partial report.
//!
//! ## Guarantees
//!
//! - Rules are evaluated strictly in order, one per step.
//! - Per-rule failures never end a run. Stage failures end it in
//!   `Failed` with a reason, and a report is still produced.
//! - No I/O happens here beyond what the collaborators do.

pub mod document;
pub mod error;
pub mod orchestrator;
pub mod phase;
pub mod workflow;

pub use document::{DocumentSource, ParsedDocument, StaticDocument};
pub use error::{SourceError, WorkflowError};
pub use orchestrator::{AuditOrchestrator, AuditSession, AuditStream, DIRECT_INPUT};
pub use phase::{AuditPhase, PhaseTransition};
pub use workflow::{AuditOptions, Progress, RuleFault, WorkflowState};
