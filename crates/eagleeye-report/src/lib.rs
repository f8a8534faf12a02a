//! # eagleeye-report — Audit Report Output
//!
//! Turns an [`AuditReport`](eagleeye_core::AuditReport) into something a
//! reader or another tool can consume:
//!
//! - [`render_markdown`] / [`render_json`]: the full report.
//! - [`text_summary`]: a terminal digest.
//! - [`executive_summary`]: a one-page rating for management, scored by
//!   [`risk_score`].
//! - [`compare_reports`]: what changed between two runs.
//! - [`ReportWriter`]: files on disk.

pub mod error;
pub mod render;
pub mod summary;
pub mod writer;

#[cfg(test)]
mod testutil;

pub use error::ReportError;
pub use render::{format_amount, render_finding, render_json, render_markdown};
pub use summary::{
    compare_reports, executive_summary, risk_score, text_summary, MetricDelta, ReportComparison,
    RiskLevel, RuleRef,
};
pub use writer::{ReportFormat, ReportWriter};
