//! End-to-end behaviour of `ExpressionEvaluator::evaluate`.

use eagleeye_core::{FieldValue, FinancialRecord};
use eagleeye_eval::ExpressionEvaluator;

fn eval(expression: &str, record: &FinancialRecord) -> eagleeye_core::EvaluationOutcome {
    ExpressionEvaluator::new().evaluate(expression, record)
}

// ─── Reference cases ─────────────────────────────────────────────────

#[test]
fn simple_threshold_violation() {
    let record = FinancialRecord::new().with("x", 0.77);
    let outcome = eval("x > 0.7", &record);
    assert!(outcome.violated());
    assert_eq!(outcome.error(), None);
    assert_eq!(outcome.evidence().len(), 1);
    assert_eq!(outcome.evidence().get("x"), Some(&FieldValue::Number(0.77)));
    assert_eq!(outcome.calculated_value(), Some(0.77));
    assert_eq!(outcome.threshold_value(), Some(0.7));
}

#[test]
fn ratio_below_threshold() {
    let record = FinancialRecord::new()
        .with("a", 50_000_000.0)
        .with("b", 200_000_000.0)
        .with("c", 150_000_000.0);
    let outcome = eval("(a / (b + c)) < 0.5", &record);
    assert!(outcome.violated());
    let calculated = outcome.calculated_value().unwrap();
    assert!((calculated - 50.0 / 350.0).abs() < 1e-12);
    assert_eq!(outcome.threshold_value(), Some(0.5));
}

#[test]
fn uppercase_connectives() {
    let record = FinancialRecord::new().with("p", 0.4).with("q", 0.015);
    let outcome = eval("(p > 0.3) AND (q < 0.02)", &record);
    assert!(outcome.violated());
    assert_eq!(outcome.calculated_value(), None);
}

#[test]
fn missing_field_is_insufficient_data() {
    let record = FinancialRecord::new().with("other", 50.0);
    let outcome = eval("missing_field > 100", &record);
    assert!(!outcome.violated());
    assert_eq!(outcome.error(), Some("insufficient data"));
    assert!(outcome.missing_fields().contains("missing_field"));
}

#[test]
fn partially_bound_expression_keeps_evidence() {
    let record = FinancialRecord::new().with("应收账款", 5.0e8);
    let outcome = eval("应收账款 / 营业收入 > 0.5", &record);
    assert!(!outcome.violated());
    assert_eq!(
        outcome.missing_fields().iter().collect::<Vec<_>>(),
        vec!["营业收入"]
    );
    assert!(outcome.evidence().contains_key("应收账款"));
}

// ─── Domain expressions ──────────────────────────────────────────────

#[test]
fn ideographic_field_names_with_abs() {
    let record = FinancialRecord::new()
        .with("营业外收入_政府补助", 8_000_000.0)
        .with("递延收益_本期摊销", 5_000_000.0);
    let outcome = eval("abs(营业外收入_政府补助 - 递延收益_本期摊销) > 1000000", &record);
    assert!(outcome.violated());
    assert_eq!(outcome.calculated_value(), Some(3_000_000.0));
    assert_eq!(outcome.threshold_value(), Some(1_000_000.0));
}

#[test]
fn cash_and_debt_both_high() {
    let record = FinancialRecord::new()
        .with("货币资金", 1.2e9)
        .with("有息债务", 9.0e8)
        .with("总资产", 3.0e9);
    let outcome = eval(
        "(货币资金 / 总资产 > 0.3) 且 (有息债务 / 总资产 > 0.25)",
        &record,
    );
    assert!(outcome.violated());
}

#[test]
fn contains_operator_on_text_field() {
    let record = FinancialRecord::new().with("审计意见", "带强调事项段的无保留意见");
    assert!(eval("审计意见 包含 ['保留意见', '无法表示意见']", &record).violated());

    let clean = FinancialRecord::new().with("审计意见", "标准意见");
    assert!(!eval("审计意见 包含 ['保留意见', '无法表示意见']", &clean).violated());
}

#[test]
fn contains_operator_on_list_field() {
    let record = FinancialRecord::new().with(
        "关联方",
        FieldValue::List(vec!["甲公司".into(), "乙公司".into()]),
    );
    assert!(eval("关联方 包含 ['乙公司', '丙公司']", &record).violated());
    assert!(!eval("关联方 包含 ['丙公司']", &record).violated());
}

#[test]
fn count_with_predicate() {
    let record = FinancialRecord::new().with(
        "季度经营现金流",
        FieldValue::from(vec![-1.0, -2.0, 3.0, -4.0]),
    );
    let outcome = eval("COUNT(季度经营现金流 < 0) >= 3", &record);
    assert!(outcome.violated());
    assert_eq!(outcome.calculated_value(), Some(3.0));
    assert_eq!(outcome.threshold_value(), Some(0.0));
}

#[test]
fn bare_count_is_length() {
    let record = FinancialRecord::new()
        .with("未决诉讼", FieldValue::from(vec!["案1", "案2", "案3"]))
        .with("状态", "正常");
    assert!(eval("COUNT(未决诉讼) > 2 AND 状态 == '正常'", &record).violated());
}

#[test]
fn explicit_null_binds_as_none() {
    let record = FinancialRecord::new().with("审计机构", FieldValue::Null);
    let outcome = eval("审计机构 == NULL", &record);
    assert!(outcome.violated());
    assert_eq!(outcome.evidence().get("审计机构"), Some(&FieldValue::Null));

    let absent = FinancialRecord::new();
    let outcome = eval("审计机构 == NULL", &absent);
    assert!(!outcome.violated());
    assert!(outcome.is_insufficient_data());
}

#[test]
fn boolean_fields() {
    let record = FinancialRecord::new()
        .with("存在关联交易", true)
        .with("已披露", false);
    assert!(eval("存在关联交易 AND NOT 已披露", &record).violated());
}

#[test]
fn negative_values_keep_operator_binding() {
    let record = FinancialRecord::new().with("x", -3.0);
    assert!(eval("x ** 2 == 9", &record).violated());
}

#[test]
fn long_monthly_series_is_counted() {
    let flows: Vec<f64> = (0..400)
        .map(|i| if i % 4 == 0 { -1_250_000.75 } else { 3_400_000.25 })
        .collect();
    let record = FinancialRecord::new().with("月度经营现金流", FieldValue::from(flows));
    let outcome = eval("COUNT(月度经营现金流 < 0) >= 3", &record);
    assert_eq!(outcome.error(), None);
    assert!(outcome.violated());
    assert_eq!(outcome.calculated_value(), Some(100.0));
}

#[test]
fn long_opinion_text_is_searched() {
    let body = "我们认为，后附的财务报表在所有重大方面按照企业会计准则的规定编制。".repeat(150);
    let opinion = format!("{body}形成保留意见的基础");
    assert!(opinion.chars().count() > 4096);

    let record = FinancialRecord::new().with("审计意见", opinion);
    let outcome = eval("审计意见 包含 ['保留意见']", &record);
    assert_eq!(outcome.error(), None);
    assert!(outcome.violated());

    let clean = FinancialRecord::new().with("审计意见", body);
    let outcome = eval("审计意见 包含 ['保留意见']", &clean);
    assert_eq!(outcome.error(), None);
    assert!(!outcome.violated());
}

// ─── Failure modes ───────────────────────────────────────────────────

#[test]
fn division_by_zero_resolves_to_infinity() {
    let record = FinancialRecord::new().with("债务", 100.0).with("权益", 0.0);
    let outcome = eval("债务 / 权益 > 2", &record);
    assert!(outcome.violated());
    assert_eq!(outcome.error(), None);
    assert_eq!(outcome.calculated_value(), Some(f64::INFINITY));
}

#[test]
fn unsupported_function_is_an_error_not_a_violation() {
    let record = FinancialRecord::new().with("x", 1.0);
    let outcome = eval("__import__('os') or x > 0", &record);
    assert!(!outcome.violated());
    assert!(outcome.error().unwrap().contains("not allowed"));
}

#[test]
fn type_error_is_reported() {
    let record = FinancialRecord::new().with("名称", "甲公司");
    let outcome = eval("名称 > 5", &record);
    assert!(!outcome.violated());
    assert!(outcome.error().unwrap().starts_with("type error"));
    assert!(outcome.evidence().contains_key("名称"));
}

#[test]
fn syntax_error_without_fallback_is_not_a_violation() {
    let record = FinancialRecord::new().with("x", 5.0);
    let outcome = eval("x > > 3", &record);
    assert!(!outcome.violated());
    assert!(outcome.error().unwrap().starts_with("syntax error"));
}

#[test]
fn malformed_contains_is_a_syntax_error() {
    let record = FinancialRecord::new().with("x", "abc");
    let outcome = eval("x 包含 'a'", &record);
    assert!(!outcome.violated());
    assert!(outcome.error().unwrap().starts_with("syntax error"));
}

#[test]
fn check_syntax_accepts_free_field_names() {
    let evaluator = ExpressionEvaluator::new();
    assert!(evaluator.check_syntax("abs(营业外收入 - 递延收益) > 1000000").is_ok());
    assert!(evaluator.check_syntax("COUNT(x > 1) >= 2 AND y == NULL").is_ok());
    assert!(evaluator.check_syntax("x > > 1").is_err());
    assert!(evaluator.check_syntax("exec(x)").is_err());
}
