//! # Findings
//!
//! A finding is created exactly once for each rule whose outcome is a
//! violation. It copies the rule fields it needs (so a report remains
//! readable without the rulebook) and the evaluation outcome, and is
//! immutable afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::outcome::EvaluationOutcome;
use crate::record::FieldValue;
use crate::rule::{Priority, Rule, RuleCategory};
use crate::temporal::Timestamp;

/// Finding severity. Mirrors [`Priority`] one-to-one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// All severities, most severe first.
    pub const ALL: [Severity; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// Marker used in rendered reports.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Critical => "🔴",
            Self::High => "🟠",
            Self::Medium => "🟡",
            Self::Low => "🟢",
        }
    }
}

impl From<Priority> for Severity {
    fn from(p: Priority) -> Self {
        match p {
            Priority::Critical => Self::Critical,
            Priority::High => Self::High,
            Priority::Medium => Self::Medium,
            Priority::Low => Self::Low,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded violation of one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    pub rule_subject: String,
    pub category: RuleCategory,
    pub severity: Severity,
    /// The expression as written in the rulebook.
    pub expression: String,
    pub evaluation_result: bool,
    pub evidence: BTreeMap<String, FieldValue>,
    pub calculated_value: Option<f64>,
    pub threshold_value: Option<f64>,
    pub description: String,
    #[serde(default)]
    pub recommendation: String,
    pub procedures: Vec<String>,
    pub detected_at: Timestamp,
}

impl Finding {
    /// Build a finding from a rule and its violating outcome.
    ///
    /// Returns `None` when the outcome is not a violation, so a finding can
    /// never be created for a passing or errored rule.
    pub fn from_violation(rule: &Rule, outcome: EvaluationOutcome) -> Option<Self> {
        if !outcome.violated() {
            return None;
        }
        let calculated_value = outcome.calculated_value();
        let threshold_value = outcome.threshold_value();
        Some(Self {
            rule_id: rule.id.clone(),
            rule_subject: rule.subject.clone(),
            category: rule.category,
            severity: rule.priority.into(),
            expression: rule.expression.clone(),
            evaluation_result: true,
            evidence: outcome.into_evidence(),
            calculated_value,
            threshold_value,
            description: rule.description.clone(),
            recommendation: String::new(),
            procedures: rule.procedures.clone(),
            detected_at: Timestamp::now(),
        })
    }
}
