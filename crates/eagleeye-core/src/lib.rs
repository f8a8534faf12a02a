//! # eagleeye-core — Foundational Types for EagleEye
//!
//! Defines the data model shared by every other crate in the workspace:
//! the financial record being audited, the rules it is audited against,
//! the structured outcome of evaluating one rule, and the findings and
//! report that accumulate from those outcomes.
//!
//! ## Key Design Principles
//!
//! 1. **Closed enums for classification.** `RuleCategory`, `Priority` and
//!    `Severity` are single definitions with exhaustive `match` everywhere.
//!    Rulebook spellings (`CL`, `Critical`, ...) are accepted at the serde
//!    boundary only.
//!
//! 2. **Absent is not null.** A `FinancialRecord` distinguishes a missing
//!    key from a key explicitly bound to [`FieldValue::Null`].
//!
//! 3. **Append-only accumulation.** Findings enter a report exclusively
//!    through [`FindingAccumulator::append`], which updates the severity and
//!    category rollups in the same call. There is no other mutation path.
//!
//! 4. **UTC-only timestamps.** [`Timestamp`] is UTC with seconds precision.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `eagleeye-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod finding;
pub mod outcome;
pub mod record;
pub mod report;
pub mod rule;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use error::EagleEyeError;
pub use finding::{Finding, Severity};
pub use outcome::EvaluationOutcome;
pub use record::{FieldValue, FinancialRecord};
pub use report::{AuditReport, FindingAccumulator, ReportMetadata, RunStatus, SeverityCounts};
pub use rule::{Priority, Rule, RuleCategory};
pub use temporal::Timestamp;
