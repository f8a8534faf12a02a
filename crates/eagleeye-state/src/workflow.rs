//! # Workflow State
//!
//! Everything one audit run knows: where it is in the phase graph, which
//! rule comes next, the findings accumulated so far, and the counters and
//! transition log that describe how it got there.
//!
//! A state is created by [`AuditSession::start`](crate::AuditSession::start),
//! advanced only by [`AuditSession::step`](crate::AuditSession::step), and
//! folded into an [`AuditReport`] when the run reaches a terminal phase.
//! Runs share nothing; two states never alias.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use eagleeye_core::{
    AuditReport, Finding, FindingAccumulator, ReportMetadata, Rule, RunStatus, SeverityCounts,
    Timestamp,
};
use eagleeye_rules::DEFAULT_TOP_K;

use crate::document::ParsedDocument;
use crate::phase::{transition, AuditPhase, PhaseTransition};

// ─── Options ─────────────────────────────────────────────────────────

/// Knobs for the Retrieving phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditOptions {
    /// Evaluate the full rulebook instead of the keyword-ranked subset.
    pub check_all_rules: bool,
    /// How many ranked rules to evaluate when not checking all rules.
    pub top_k: usize,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            check_all_rules: true,
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// A rule that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFault {
    pub rule_id: String,
    pub message: String,
}

// ─── State ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WorkflowState {
    pub(crate) run_id: String,
    pub(crate) phase: AuditPhase,
    pub(crate) document: Option<ParsedDocument>,
    pub(crate) rules: Vec<Rule>,
    pub(crate) index: usize,
    pub(crate) accumulator: FindingAccumulator,
    pub(crate) rules_checked: usize,
    pub(crate) insufficient: usize,
    pub(crate) faults: Vec<RuleFault>,
    pub(crate) error: Option<String>,
    pub(crate) transitions: Vec<PhaseTransition>,
    pub(crate) started_at: Timestamp,
    pub(crate) started: Instant,
    pub(crate) report: Option<AuditReport>,
}

impl WorkflowState {
    pub(crate) fn new(run_id: String) -> Self {
        Self {
            run_id,
            phase: AuditPhase::Parsing,
            document: None,
            rules: Vec::new(),
            index: 0,
            accumulator: FindingAccumulator::new(),
            rules_checked: 0,
            insufficient: 0,
            faults: Vec::new(),
            error: None,
            transitions: Vec::new(),
            started_at: Timestamp::now(),
            started: Instant::now(),
            report: None,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn phase(&self) -> AuditPhase {
        self.phase
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// True until the run reaches a terminal phase.
    pub fn should_continue(&self) -> bool {
        !self.is_terminal()
    }

    pub fn document(&self) -> Option<&ParsedDocument> {
        self.document.as_ref()
    }

    /// The rule set of this run, empty before Retrieving completes.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Index of the next rule to evaluate.
    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn rules_checked(&self) -> usize {
        self.rules_checked
    }

    /// Rules that hit an evaluation error or fault. Insufficient data is
    /// not an error.
    pub fn error_count(&self) -> usize {
        self.faults.len()
    }

    pub fn insufficient_data_count(&self) -> usize {
        self.insufficient
    }

    pub fn faults(&self) -> &[RuleFault] {
        &self.faults
    }

    /// The stage fault that ended the run, if it failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn transitions(&self) -> &[PhaseTransition] {
        &self.transitions
    }

    /// Findings so far, whether still accumulating or already reported.
    pub fn findings(&self) -> &[Finding] {
        match &self.report {
            Some(report) => &report.findings,
            None => self.accumulator.findings(),
        }
    }

    pub fn severity_counts(&self) -> SeverityCounts {
        match &self.report {
            Some(report) => report.severity,
            None => self.accumulator.severity_counts(),
        }
    }

    pub fn total_violations(&self) -> usize {
        match &self.report {
            Some(report) => report.total_violations,
            None => self.accumulator.total_violations(),
        }
    }

    /// The report, present once the run is terminal.
    pub fn report(&self) -> Option<&AuditReport> {
        self.report.as_ref()
    }

    /// Consume the state into its report.
    ///
    /// A state abandoned before reaching a terminal phase yields a partial
    /// report marked failed.
    pub fn into_report(mut self) -> AuditReport {
        if let Some(report) = self.report.take() {
            return report;
        }
        let reason = format!("audit stopped during {}", self.phase);
        self.close(RunStatus::Failed { reason })
    }

    pub fn progress(&self) -> Progress {
        Progress {
            run_id: self.run_id.clone(),
            phase: self.phase,
            rule_index: self.index,
            rule_total: self.rules.len(),
            rules_checked: self.rules_checked,
            errors: self.faults.len(),
            insufficient_data: self.insufficient,
            total_violations: self.total_violations(),
            findings: self.findings().len(),
            severity: self.severity_counts(),
            last_rule: self
                .index
                .checked_sub(1)
                .and_then(|i| self.rules.get(i))
                .map(|r| r.id.clone()),
        }
    }

    // ─── Mutation (orchestrator only) ────────────────────────────────

    /// Move to `to`, logging the change. An illegal edge fails the run.
    pub(crate) fn enter(&mut self, to: AuditPhase, reason: impl Into<String>) {
        let reason = reason.into();
        match transition(self.phase, to, reason.clone()) {
            Ok(record) => {
                tracing::info!(
                    run_id = %self.run_id,
                    from = %record.from,
                    to = %record.to,
                    reason = %record.reason,
                    "audit phase transition"
                );
                self.transitions.push(record);
                self.phase = to;
            }
            Err(err) => {
                tracing::error!(run_id = %self.run_id, error = %err, "rejected phase transition");
                self.fail(err.to_string());
            }
        }
    }

    /// Stop the run with a stage fault and close the partial report.
    pub(crate) fn fail(&mut self, reason: impl Into<String>) {
        if self.is_terminal() {
            return;
        }
        let reason = reason.into();
        tracing::error!(run_id = %self.run_id, phase = %self.phase, reason = %reason, "audit run failed");
        self.transitions.push(PhaseTransition {
            from: self.phase,
            to: AuditPhase::Failed,
            timestamp: Timestamp::now(),
            reason: reason.clone(),
        });
        self.phase = AuditPhase::Failed;
        self.error = Some(reason.clone());
        let report = self.close(RunStatus::Failed { reason });
        self.report = Some(report);
    }

    /// Fold the accumulator into a report. Leaves an empty accumulator.
    pub(crate) fn close(&mut self, status: RunStatus) -> AuditReport {
        let (subject, source_path) = match &self.document {
            Some(doc) => (doc.name.clone(), doc.path.clone()),
            None => (String::new(), None),
        };
        let metadata = ReportMetadata {
            run_id: self.run_id.clone(),
            subject,
            source_path,
            rules_checked: self.rules_checked,
            elapsed_secs: self.started.elapsed().as_secs_f64(),
            audited_at: self.started_at,
            status,
        };
        std::mem::take(&mut self.accumulator).close(metadata)
    }
}

/// A point-in-time summary of a run, emitted once per step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progress {
    pub run_id: String,
    pub phase: AuditPhase,
    pub rule_index: usize,
    pub rule_total: usize,
    pub rules_checked: usize,
    pub errors: usize,
    pub insufficient_data: usize,
    pub total_violations: usize,
    pub findings: usize,
    pub severity: SeverityCounts,
    /// Id of the most recently evaluated rule.
    pub last_rule: Option<String>,
}
