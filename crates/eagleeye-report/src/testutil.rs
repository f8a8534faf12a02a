//! Report fixtures shared by the unit tests.

use std::collections::BTreeMap;

use eagleeye_core::{
    AuditReport, FieldValue, Finding, FindingAccumulator, ReportMetadata, RuleCategory, RunStatus,
    Severity, Timestamp,
};

pub fn make_finding(rule_id: &str, severity: Severity) -> Finding {
    let category = match &rule_id[..2] {
        "CL" => RuleCategory::CrossLedger,
        "FM" => RuleCategory::FinancialManipulation,
        "LC" => RuleCategory::LegalCompliance,
        _ => RuleCategory::OperationalRisk,
    };
    let mut evidence = BTreeMap::new();
    evidence.insert("应收账款".to_string(), FieldValue::Number(5.0e8));
    evidence.insert("审计意见".to_string(), FieldValue::from("保留意见"));
    Finding {
        rule_id: rule_id.to_string(),
        rule_subject: format!("subject of {rule_id}"),
        category,
        severity,
        expression: "应收账款 / 营业收入 > 0.5".to_string(),
        evaluation_result: true,
        evidence,
        calculated_value: Some(0.6),
        threshold_value: Some(0.5),
        description: format!("description of {rule_id}"),
        recommendation: String::new(),
        procedures: vec!["函证应收账款".to_string(), "检查期后回款".to_string()],
        detected_at: Timestamp::parse("2024-03-01T08:30:05Z").unwrap(),
    }
}

pub fn make_report(findings: Vec<Finding>) -> AuditReport {
    let mut acc = FindingAccumulator::new();
    for finding in findings {
        acc.append(finding);
    }
    acc.close(ReportMetadata {
        run_id: "run-1".to_string(),
        subject: "年报2023.pdf".to_string(),
        source_path: Some("/data/年报2023.pdf".to_string()),
        rules_checked: 10,
        elapsed_secs: 1.234,
        audited_at: Timestamp::parse("2024-03-01T08:30:00Z").unwrap(),
        status: RunStatus::Completed,
    })
}
