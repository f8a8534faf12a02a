//! # Evaluation Outcome
//!
//! The structured result of evaluating one rule expression against one
//! record. Every failure mode of the evaluator is represented here as data;
//! nothing is thrown past it.
//!
//! Fields are private so that the one invariant that matters, "an outcome
//! carrying an error is never a violation", holds by construction.
//! Deserialization goes through the same check.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::record::FieldValue;

/// Message recorded when referenced fields are absent from the record.
pub const INSUFFICIENT_DATA: &str = "insufficient data";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawOutcome")]
pub struct EvaluationOutcome {
    violated: bool,
    evidence: BTreeMap<String, FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    calculated_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    threshold_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    missing_fields: BTreeSet<String>,
}

/// Wire form of [`EvaluationOutcome`], validated before use.
#[derive(Deserialize)]
struct RawOutcome {
    violated: bool,
    #[serde(default)]
    evidence: BTreeMap<String, FieldValue>,
    #[serde(default)]
    calculated_value: Option<f64>,
    #[serde(default)]
    threshold_value: Option<f64>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    missing_fields: BTreeSet<String>,
}

impl TryFrom<RawOutcome> for EvaluationOutcome {
    type Error = String;

    fn try_from(raw: RawOutcome) -> Result<Self, Self::Error> {
        if raw.violated && raw.error.is_some() {
            return Err("an outcome with an error cannot be a violation".to_string());
        }
        if !raw.missing_fields.is_empty() && raw.error.as_deref() != Some(INSUFFICIENT_DATA) {
            return Err(format!(
                "missing fields require the error {INSUFFICIENT_DATA:?}"
            ));
        }
        Ok(Self {
            violated: raw.violated,
            evidence: raw.evidence,
            calculated_value: raw.calculated_value,
            threshold_value: raw.threshold_value,
            error: raw.error,
            missing_fields: raw.missing_fields,
        })
    }
}

impl EvaluationOutcome {
    /// A successfully evaluated expression.
    pub fn evaluated(violated: bool, evidence: BTreeMap<String, FieldValue>) -> Self {
        Self {
            violated,
            evidence,
            calculated_value: None,
            threshold_value: None,
            error: None,
            missing_fields: BTreeSet::new(),
        }
    }

    /// Referenced fields were absent. Never a violation.
    pub fn insufficient_data(
        evidence: BTreeMap<String, FieldValue>,
        missing_fields: BTreeSet<String>,
    ) -> Self {
        Self {
            violated: false,
            evidence,
            calculated_value: None,
            threshold_value: None,
            error: Some(INSUFFICIENT_DATA.to_string()),
            missing_fields,
        }
    }

    /// The expression could not be evaluated. Never a violation.
    pub fn failed(error: impl Into<String>, evidence: BTreeMap<String, FieldValue>) -> Self {
        Self {
            violated: false,
            evidence,
            calculated_value: None,
            threshold_value: None,
            error: Some(error.into()),
            missing_fields: BTreeSet::new(),
        }
    }

    pub fn with_calculated_value(mut self, value: Option<f64>) -> Self {
        self.calculated_value = value;
        self
    }

    pub fn with_threshold_value(mut self, value: Option<f64>) -> Self {
        self.threshold_value = value;
        self
    }

    pub fn violated(&self) -> bool {
        self.violated
    }

    /// Fields whose values were substituted into the expression.
    pub fn evidence(&self) -> &BTreeMap<String, FieldValue> {
        &self.evidence
    }

    pub fn calculated_value(&self) -> Option<f64> {
        self.calculated_value
    }

    pub fn threshold_value(&self) -> Option<f64> {
        self.threshold_value
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn missing_fields(&self) -> &BTreeSet<String> {
        &self.missing_fields
    }

    /// Whether the outcome reflects missing data rather than a real error.
    pub fn is_insufficient_data(&self) -> bool {
        !self.missing_fields.is_empty()
    }

    /// Consume into the evidence map.
    pub fn into_evidence(self) -> BTreeMap<String, FieldValue> {
        self.evidence
    }
}
