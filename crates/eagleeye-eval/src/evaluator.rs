//! The evaluator entry point: normalize, bind, check, evaluate.

use std::collections::BTreeMap;

use eagleeye_core::{EvaluationOutcome, FieldValue, FinancialRecord};

use crate::binding::bind;
use crate::completeness::unresolved_fields;
use crate::error::{ExprError, ExprResult};
use crate::fallback::{compare_numbers, extract_threshold};
use crate::interpreter::{evaluate, left_operand_value};
use crate::normalize::normalize;
use crate::parser::parse;

/// Longest rule expression, in characters, that will be evaluated. Checked
/// on the rulebook text before record values are bound in, so long list or
/// text fields never count against it.
pub const MAX_EXPRESSION_CHARS: usize = 4096;

/// Evaluates rule expressions against financial records.
///
/// Stateless: every call owns its intermediate text and evidence, so one
/// evaluator may be shared freely across threads and audit runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionEvaluator;

impl ExpressionEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate `expression` against `record`.
    ///
    /// Never fails: every problem is reported through the outcome's
    /// `error`, and an outcome with an error is never a violation.
    pub fn evaluate(&self, expression: &str, record: &FinancialRecord) -> EvaluationOutcome {
        if let Err(err) = check_length(expression) {
            tracing::warn!(error = %err, "expression rejected");
            return EvaluationOutcome::failed(err.to_string(), BTreeMap::new());
        }
        let threshold = extract_threshold(expression);

        let normalized = match normalize(expression) {
            Ok(text) => text,
            Err(err) => {
                let binding = bind(expression, record);
                return recover(expression, &binding.text, err, binding.evidence, threshold);
            }
        };

        let binding = bind(&normalized, record);
        let missing = unresolved_fields(&binding.text);
        if !missing.is_empty() {
            tracing::debug!(
                expression,
                missing = ?missing,
                "insufficient data for expression"
            );
            return EvaluationOutcome::insufficient_data(binding.evidence, missing);
        }

        let tree = match parse(&binding.text) {
            Ok(tree) => tree,
            Err(err) => {
                return recover(expression, &binding.text, err, binding.evidence, threshold)
            }
        };

        match evaluate(&tree) {
            Ok(value) => {
                let violated = value.truthy();
                tracing::debug!(expression, violated, "expression evaluated");
                EvaluationOutcome::evaluated(violated, binding.evidence)
                    .with_calculated_value(left_operand_value(&tree))
                    .with_threshold_value(threshold)
            }
            Err(err) => {
                tracing::warn!(expression, error = %err, "expression evaluation failed");
                EvaluationOutcome::failed(err.to_string(), binding.evidence)
            }
        }
    }

    /// Check that an expression is well-formed, without evaluating it.
    /// Field names are accepted as free names.
    pub fn check_syntax(&self, expression: &str) -> ExprResult<()> {
        check_length(expression)?;
        parse(&normalize(expression)?).map(|_| ())
    }
}

fn check_length(expression: &str) -> ExprResult<()> {
    let length = expression.chars().count();
    if length > MAX_EXPRESSION_CHARS {
        return Err(ExprError::Unsupported(format!(
            "expression of {length} characters exceeds the {MAX_EXPRESSION_CHARS} character limit"
        )));
    }
    Ok(())
}

/// A syntax error gets one more chance through the bare-number comparison;
/// any other error, or a failed fallback, is reported as-is.
///
/// The lexer reads every literal [`compare_numbers`] can, so bound text of
/// the shape `NUMBER OP NUMBER` always parses and a rule that normalized
/// cleanly does not get here with a comparable text. The fallback only
/// decides when parsing rejects a text that still splits into two numbers
/// around one spaced operator.
fn recover(
    expression: &str,
    bound: &str,
    err: ExprError,
    evidence: BTreeMap<String, FieldValue>,
    threshold: Option<f64>,
) -> EvaluationOutcome {
    if err.is_syntax() {
        tracing::warn!(expression, error = %err, "expression failed to parse, trying numeric fallback");
        if let Some(violated) = compare_numbers(bound) {
            return EvaluationOutcome::evaluated(violated, evidence).with_threshold_value(threshold);
        }
    } else {
        tracing::warn!(expression, error = %err, "expression rejected");
    }
    EvaluationOutcome::failed(err.to_string(), evidence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_on_bare_comparison_falls_back() {
        let err = ExprError::syntax(0, "unexpected token");
        let outcome = recover("净利润 > 3", "5 > 3", err, BTreeMap::new(), Some(3.0));
        assert!(outcome.violated());
        assert_eq!(outcome.error(), None);
        assert_eq!(outcome.threshold_value(), Some(3.0));
    }

    #[test]
    fn failed_fallback_keeps_syntax_error() {
        let err = ExprError::syntax(4, "unexpected '>'");
        let outcome = recover("x > > 3", "5 > > 3", err, BTreeMap::new(), Some(3.0));
        assert!(!outcome.violated());
        assert!(outcome.error().unwrap().starts_with("syntax error at offset 4"));
    }

    #[test]
    fn non_syntax_errors_skip_fallback() {
        let err = ExprError::Unsupported("call to exec".into());
        let outcome = recover("exec(1) > 0", "5 > 3", err, BTreeMap::new(), None);
        assert!(!outcome.violated());
        assert!(outcome.error().unwrap().contains("exec"));
    }

    #[test]
    fn length_limit_applies_to_rule_text_only() {
        let evaluator = ExpressionEvaluator::new();
        let long = "x + ".repeat(MAX_EXPRESSION_CHARS / 4) + "x > 0";
        let outcome = evaluator.evaluate(&long, &FinancialRecord::new().with("x", 1.0));
        assert!(outcome.error().unwrap().contains("character limit"));
        assert!(evaluator.check_syntax(&long).is_err());

        let record = FinancialRecord::new().with("说明", "很长".repeat(MAX_EXPRESSION_CHARS));
        let outcome = evaluator.evaluate("说明 == '短'", &record);
        assert_eq!(outcome.error(), None);
    }
}
