//! # Report Rendering
//!
//! Markdown for people, JSON for machines. Both are pure functions of the
//! report; nothing here touches the filesystem.

use std::collections::BTreeMap;

use serde::Serialize;

use eagleeye_core::{AuditReport, FieldValue, Finding, RuleCategory, RunStatus, Severity};

use crate::error::ReportError;

// ─── Markdown ────────────────────────────────────────────────────────

/// Render the full Markdown report.
pub fn render_markdown(report: &AuditReport) -> String {
    let mut lines = vec![
        "# EagleEye Lite 审计报告".to_string(),
        String::new(),
        format!("**文档**: {}", report.subject),
        format!("**审计时间**: {}", report.audited_at.to_display_string()),
        format!("**执行耗时**: {:.2}秒", report.elapsed_secs),
    ];
    if let RunStatus::Failed { reason } = &report.status {
        lines.push(format!("**运行状态**: 未完成 ({reason})"));
    }
    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(String::new());
    lines.push("## 摘要".to_string());
    lines.push(String::new());
    lines.push(format!("- 检查规则数: {}", report.rules_checked));
    lines.push(format!("- 发现违规数: {}", report.total_violations));
    lines.push(String::new());
    lines.push("### 按严重程度分布".to_string());
    lines.push(String::new());
    lines.push("| 严重程度 | 数量 |".to_string());
    lines.push("|---------|------|".to_string());
    for severity in Severity::ALL {
        lines.push(format!(
            "| {} {} | {} |",
            severity.marker(),
            severity,
            report.severity.get(severity)
        ));
    }
    lines.push(String::new());

    if !report.by_category.is_empty() {
        lines.push("### 按类别分布".to_string());
        lines.push(String::new());
        lines.push("| 类别 | 数量 |".to_string());
        lines.push("|------|------|".to_string());
        for (category, count) in &report.by_category {
            lines.push(format!("| {} | {} |", category.display_name(), count));
        }
        lines.push(String::new());
    }

    lines.push("---".to_string());
    lines.push(String::new());
    lines.push("## 详细发现".to_string());
    lines.push(String::new());

    for severity in Severity::ALL {
        let findings: Vec<&Finding> = report.findings_with_severity(severity).collect();
        if findings.is_empty() {
            continue;
        }
        lines.push(format!("## {} 级别发现 ({})", severity, findings.len()));
        lines.push(String::new());
        for finding in findings {
            lines.push(render_finding(finding));
            lines.push("---".to_string());
            lines.push(String::new());
        }
    }

    if report.findings.is_empty() {
        lines.push("*未发现违规项*".to_string());
    }

    lines.push(String::new());
    lines.join("\n")
}

/// Render one finding as a Markdown section, without trailing blank lines.
pub fn render_finding(finding: &Finding) -> String {
    let mut lines = vec![
        format!(
            "### {} {}: {}",
            finding.severity.marker(),
            finding.rule_id,
            finding.rule_subject
        ),
        String::new(),
        format!("**严重程度**: {}", finding.severity),
        format!("**类别**: {}", finding.category),
        String::new(),
        format!("**描述**: {}", finding.description),
        String::new(),
        "**检测逻辑**:".to_string(),
        "```".to_string(),
        finding.expression.clone(),
        "```".to_string(),
        String::new(),
    ];

    if finding.calculated_value.is_some() || finding.threshold_value.is_some() {
        let show = |v: Option<f64>| v.map_or_else(|| "-".to_string(), format_amount);
        lines.push(format!(
            "**计算值**: {} / **阈值**: {}",
            show(finding.calculated_value),
            show(finding.threshold_value)
        ));
        lines.push(String::new());
    }

    if !finding.evidence.is_empty() {
        lines.push("**相关数据**:".to_string());
        for (name, value) in &finding.evidence {
            lines.push(format!("- {}: {}", name, format_value(value)));
        }
        lines.push(String::new());
    }

    if !finding.recommendation.is_empty() {
        lines.push(format!("**审计建议**: {}", finding.recommendation));
        lines.push(String::new());
    }

    if !finding.procedures.is_empty() {
        lines.push("**建议审计程序**:".to_string());
        for (i, step) in finding.procedures.iter().enumerate() {
            lines.push(format!("{}. {}", i + 1, step));
        }
        lines.push(String::new());
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

fn format_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Number(n) => format_amount(*n),
        other => other.to_string(),
    }
}

/// Two decimals with thousands separators: `1234567.891` → `1,234,567.89`.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac_part}")
}

// ─── JSON ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct JsonSeverity {
    critical: usize,
    high: usize,
    medium: usize,
    low: usize,
}

#[derive(Debug, Serialize)]
struct JsonSummary<'a> {
    total_rules_checked: usize,
    total_violations: usize,
    by_severity: JsonSeverity,
    by_category: &'a BTreeMap<RuleCategory, usize>,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    run_id: &'a str,
    document_name: &'a str,
    document_path: Option<&'a str>,
    audit_timestamp: String,
    status: &'a RunStatus,
    summary: JsonSummary<'a>,
    findings: &'a [Finding],
    execution_time_seconds: f64,
}

/// Render the report as pretty-printed JSON.
pub fn render_json(report: &AuditReport) -> Result<String, ReportError> {
    let doc = JsonReport {
        run_id: &report.run_id,
        document_name: &report.subject,
        document_path: report.source_path.as_deref(),
        audit_timestamp: report.audited_at.to_iso8601(),
        status: &report.status,
        summary: JsonSummary {
            total_rules_checked: report.rules_checked,
            total_violations: report.total_violations,
            by_severity: JsonSeverity {
                critical: report.severity.critical,
                high: report.severity.high,
                medium: report.severity.medium,
                low: report.severity.low,
            },
            by_category: &report.by_category,
        },
        findings: &report.findings,
        execution_time_seconds: report.elapsed_secs,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}
