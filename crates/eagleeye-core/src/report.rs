//! # Finding Accumulator and Audit Report
//!
//! Findings enter a run's report only through [`FindingAccumulator::append`],
//! which pushes the finding and bumps the severity and category rollups in
//! one `&mut self` call. No partial update is observable, and there is no
//! other mutation path: the fields are private and the accumulator is
//! consumed by [`FindingAccumulator::close`] to produce the immutable
//! [`AuditReport`].
//!
//! ## Invariants
//!
//! - `total_violations() == findings().len()` at all times.
//! - `severity_counts().total() == total_violations()` at all times.
//! - The category rollup sums to `total_violations()`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::finding::{Finding, Severity};
use crate::rule::RuleCategory;
use crate::temporal::Timestamp;

// ─── Severity rollup ─────────────────────────────────────────────────

/// Finding counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }

    fn increment(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }
}

// ─── Accumulator ─────────────────────────────────────────────────────

/// Append-only collection of findings for one audit run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FindingAccumulator {
    findings: Vec<Finding>,
    severity: SeverityCounts,
    by_category: BTreeMap<RuleCategory, usize>,
}

impl FindingAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding and update every rollup.
    pub fn append(&mut self, finding: Finding) {
        self.severity.increment(finding.severity);
        *self.by_category.entry(finding.category).or_insert(0) += 1;
        self.findings.push(finding);
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn total_violations(&self) -> usize {
        self.findings.len()
    }

    pub fn severity_counts(&self) -> SeverityCounts {
        self.severity
    }

    pub fn category_counts(&self) -> &BTreeMap<RuleCategory, usize> {
        &self.by_category
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Fold the accumulated findings into a report.
    pub fn close(self, metadata: ReportMetadata) -> AuditReport {
        AuditReport {
            run_id: metadata.run_id,
            subject: metadata.subject,
            source_path: metadata.source_path,
            audited_at: metadata.audited_at,
            elapsed_secs: metadata.elapsed_secs,
            status: metadata.status,
            rules_checked: metadata.rules_checked,
            total_violations: self.findings.len(),
            severity: self.severity,
            by_category: self.by_category,
            findings: self.findings,
        }
    }
}

// ─── Report ──────────────────────────────────────────────────────────

/// How an audit run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunStatus {
    /// Every rule in the rule set was checked.
    Completed,
    /// A stage fault stopped the run; the report holds partial results.
    Failed { reason: String },
}

impl RunStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Run-level information supplied when the accumulator is closed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportMetadata {
    pub run_id: String,
    /// Name of the audited document or record.
    pub subject: String,
    pub source_path: Option<String>,
    pub rules_checked: usize,
    pub elapsed_secs: f64,
    pub audited_at: Timestamp,
    pub status: RunStatus,
}

/// The outcome of one audit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub run_id: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    pub audited_at: Timestamp,
    pub elapsed_secs: f64,
    pub status: RunStatus,
    pub rules_checked: usize,
    pub total_violations: usize,
    pub severity: SeverityCounts,
    pub by_category: BTreeMap<RuleCategory, usize>,
    pub findings: Vec<Finding>,
}

impl AuditReport {
    pub fn has_critical(&self) -> bool {
        self.severity.critical > 0
    }

    /// Findings of one severity, in detection order.
    pub fn findings_with_severity(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }

    /// The failure cause, if the run failed.
    pub fn failure_reason(&self) -> Option<&str> {
        match &self.status {
            RunStatus::Completed => None,
            RunStatus::Failed { reason } => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::EvaluationOutcome;
    use crate::rule::{Priority, Rule};

    fn make_finding(id: &str, category: RuleCategory, priority: Priority) -> Finding {
        let rule = Rule {
            id: id.to_string(),
            category,
            subject: String::new(),
            trigger_keywords: vec![],
            expression: "x > 0".to_string(),
            priority,
            description: String::new(),
            source: String::new(),
            linked_rules: vec![],
            procedures: vec![],
        };
        Finding::from_violation(&rule, EvaluationOutcome::evaluated(true, BTreeMap::new()))
            .expect("violating outcome")
    }

    fn make_metadata(rules_checked: usize) -> ReportMetadata {
        ReportMetadata {
            run_id: "run-1".to_string(),
            subject: "annual_report".to_string(),
            source_path: None,
            rules_checked,
            elapsed_secs: 0.5,
            audited_at: Timestamp::now(),
            status: RunStatus::Completed,
        }
    }

    #[test]
    fn append_updates_all_rollups() {
        let mut acc = FindingAccumulator::new();
        acc.append(make_finding("CL-1", RuleCategory::CrossLedger, Priority::Critical));
        acc.append(make_finding("CL-2", RuleCategory::CrossLedger, Priority::Low));
        acc.append(make_finding("OP-1", RuleCategory::OperationalRisk, Priority::High));

        assert_eq!(acc.total_violations(), 3);
        assert_eq!(acc.severity_counts().critical, 1);
        assert_eq!(acc.severity_counts().high, 1);
        assert_eq!(acc.severity_counts().low, 1);
        assert_eq!(acc.severity_counts().total(), 3);
        assert_eq!(acc.category_counts()[&RuleCategory::CrossLedger], 2);
        assert_eq!(acc.category_counts()[&RuleCategory::OperationalRisk], 1);
    }

    #[test]
    fn close_preserves_order_and_counts() {
        let mut acc = FindingAccumulator::new();
        acc.append(make_finding("B", RuleCategory::LegalCompliance, Priority::Medium));
        acc.append(make_finding("A", RuleCategory::LegalCompliance, Priority::Critical));
        let report = acc.close(make_metadata(10));

        assert_eq!(report.rules_checked, 10);
        assert_eq!(report.total_violations, 2);
        let ids: Vec<&str> = report.findings.iter().map(|f| f.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
        assert!(report.has_critical());
        assert_eq!(report.findings_with_severity(Severity::Medium).count(), 1);
        assert_eq!(report.failure_reason(), None);
    }

    #[test]
    fn report_json_uses_category_codes() {
        let mut acc = FindingAccumulator::new();
        acc.append(make_finding("FM-1", RuleCategory::FinancialManipulation, Priority::High));
        let report = acc.close(make_metadata(1));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["by_category"]["FM"], 1);
        assert_eq!(json["status"]["state"], "completed");

        let back: AuditReport = serde_json::from_value(json).unwrap();
        assert_eq!(back.by_category[&RuleCategory::FinancialManipulation], 1);
    }

    #[test]
    fn failed_status_carries_reason() {
        let mut meta = make_metadata(0);
        meta.status = RunStatus::Failed { reason: "no financial data".to_string() };
        let report = FindingAccumulator::new().close(meta);
        assert!(report.status.is_failed());
        assert_eq!(report.failure_reason(), Some("no financial data"));
    }
}
