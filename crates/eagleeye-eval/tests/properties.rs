//! Property tests for the evaluator's contract.

use eagleeye_core::{FieldValue, FinancialRecord};
use eagleeye_eval::ExpressionEvaluator;
use proptest::prelude::*;

fn arb_op() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![">", "<", ">=", "<=", "==", "!="])
}

fn arb_amount() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), -1.0e9..1.0e9f64]
}

fn arb_series() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e9..1.0e9f64, 0..1500)
}

fn arb_long_text() -> impl Strategy<Value = String> {
    // Several thousand characters at the top end: ASCII words, CJK, quotes, backslashes.
    prop::collection::vec(
        prop_oneof![
            Just("营业收入".to_string()),
            Just("保留意见".to_string()),
            Just("'".to_string()),
            Just("\\".to_string()),
            "[a-z ]{1,8}",
        ],
        0..1500,
    )
    .prop_map(|parts| parts.concat())
}

proptest! {
    /// Every referenced field present and numeric: no error.
    #[test]
    fn fully_bound_numeric_expressions_evaluate(
        a in arb_amount(),
        b in arb_amount(),
        c in arb_amount(),
        op in arb_op(),
        threshold in -10.0..10.0f64,
    ) {
        let record = FinancialRecord::new().with("甲", a).with("乙", b).with("丙", c);
        let expression = format!("(甲 - 乙) / 丙 {op} {threshold}");
        let outcome = ExpressionEvaluator::new().evaluate(&expression, &record);
        prop_assert_eq!(outcome.error(), None);
        prop_assert_eq!(outcome.evidence().len(), 3);
    }

    /// Bound list and text fields of any length: no error.
    #[test]
    fn fully_bound_long_values_evaluate(
        series in arb_series(),
        text in arb_long_text(),
        threshold in 0usize..50,
    ) {
        let record = FinancialRecord::new()
            .with("月度现金流", FieldValue::from(series.clone()))
            .with("附注", text.clone());
        let evaluator = ExpressionEvaluator::new();

        let expression = format!("COUNT(月度现金流 < 0) >= {threshold}");
        let outcome = evaluator.evaluate(&expression, &record);
        prop_assert_eq!(outcome.error(), None);
        let negatives = series.iter().filter(|v| **v < 0.0).count();
        prop_assert_eq!(outcome.violated(), negatives >= threshold);

        let outcome = evaluator.evaluate("附注 包含 ['保留意见']", &record);
        prop_assert_eq!(outcome.error(), None);
        prop_assert_eq!(outcome.violated(), text.contains("保留意见"));

        let outcome = evaluator.evaluate("len(月度现金流) >= 0 and 附注 != NULL", &record);
        prop_assert_eq!(outcome.error(), None);
        prop_assert!(outcome.violated());
    }

    /// Any absent field: never a violation, and the field is reported.
    #[test]
    fn absent_field_is_never_a_violation(
        present in arb_amount(),
        op in arb_op(),
        threshold in -10.0..10.0f64,
    ) {
        let record = FinancialRecord::new().with("存货", present);
        let expression = format!("存货 / 应付账款 {op} {threshold} OR 存货 > 0");
        let outcome = ExpressionEvaluator::new().evaluate(&expression, &record);
        prop_assert!(!outcome.violated());
        prop_assert!(outcome.missing_fields().contains("应付账款"));
    }

    /// Division by zero never errors and compares as +inf.
    #[test]
    fn division_by_zero_is_infinite(numerator in arb_amount(), threshold in -1.0e12..1.0e12f64) {
        let record = FinancialRecord::new().with("n", numerator).with("d", 0.0);
        let outcome = ExpressionEvaluator::new().evaluate(&format!("n / d > {threshold}"), &record);
        prop_assert_eq!(outcome.error(), None);
        prop_assert!(outcome.violated());
    }

    /// Arbitrary text never panics, and an error is never a violation.
    #[test]
    fn arbitrary_text_never_panics(expression in "\\PC{0,64}") {
        let record = FinancialRecord::new().with("x", 1.0);
        let outcome = ExpressionEvaluator::new().evaluate(&expression, &record);
        if outcome.error().is_some() {
            prop_assert!(!outcome.violated());
        }
    }
}
