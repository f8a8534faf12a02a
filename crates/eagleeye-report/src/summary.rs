//! # Summaries and Comparison
//!
//! Shorter views of a report: a plain-text digest for terminals, an
//! executive summary with a single risk rating, and a side-by-side
//! comparison of two runs.

use std::collections::BTreeSet;

use serde::Serialize;

use eagleeye_core::{AuditReport, Severity, SeverityCounts, Timestamp};

// ─── Risk rating ─────────────────────────────────────────────────────

/// Weighted finding count: 10 per Critical, 5 per High, 2 per Medium,
/// 1 per Low.
pub fn risk_score(counts: &SeverityCounts) -> usize {
    counts.critical * 10 + counts.high * 5 + counts.medium * 2 + counts.low
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Severe,
}

impl RiskLevel {
    pub fn from_score(score: usize) -> Self {
        match score {
            0 => Self::Low,
            1..=19 => Self::Medium,
            20..=49 => Self::High,
            _ => Self::Severe,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "低",
            Self::Medium => "中",
            Self::High => "高",
            Self::Severe => "极高",
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            Self::Low => "🟢",
            Self::Medium => "🟡",
            Self::High => "🟠",
            Self::Severe => "🔴",
        }
    }
}

// ─── Text summary ────────────────────────────────────────────────────

/// Plain-text digest: counts plus the first five Critical or High
/// findings.
pub fn text_summary(report: &AuditReport) -> String {
    let mut lines = vec![
        format!("审计摘要 - {}", report.subject),
        "=".repeat(50),
        format!("检查规则数: {}", report.rules_checked),
        format!("发现违规数: {}", report.total_violations),
    ];
    if let Some(reason) = report.failure_reason() {
        lines.push(format!("运行未完成: {reason}"));
    }
    lines.push(String::new());
    lines.push("按严重程度:".to_string());
    for severity in Severity::ALL {
        lines.push(format!("  - {}: {}", severity, report.severity.get(severity)));
    }
    lines.push(String::new());

    if !report.by_category.is_empty() {
        lines.push("按类别:".to_string());
        for (category, count) in &report.by_category {
            lines.push(format!("  - {category}: {count}"));
        }
    }

    if !report.findings.is_empty() {
        lines.push(String::new());
        lines.push("主要发现:".to_string());
        let top = report
            .findings
            .iter()
            .filter(|f| matches!(f.severity, Severity::Critical | Severity::High))
            .take(5);
        for finding in top {
            lines.push(format!("  • [{}] {}", finding.rule_id, finding.rule_subject));
        }
    }

    lines.join("\n")
}

// ─── Executive summary ───────────────────────────────────────────────

/// Management-facing Markdown summary with a risk rating.
pub fn executive_summary(report: &AuditReport, generated_at: Timestamp) -> String {
    let level = RiskLevel::from_score(risk_score(&report.severity));
    let mut lines = vec![
        "# 执行摘要".to_string(),
        String::new(),
        format!("**审计对象**: {}", report.subject),
        format!(
            "**审计日期**: {}",
            report.audited_at.as_datetime().format("%Y年%m月%d日")
        ),
        String::new(),
        format!("## 风险评级: {} {}", level.marker(), level.label()),
        String::new(),
        format!(
            "本次审计共检查 **{}** 条规则，发现 **{}** 项违规。",
            report.rules_checked, report.total_violations
        ),
        String::new(),
    ];

    let sections = [
        (Severity::Critical, "### ⚠️ 紧急关注事项"),
        (Severity::High, "### 高风险事项"),
    ];
    for (severity, heading) in sections {
        if report.severity.get(severity) == 0 {
            continue;
        }
        lines.push(heading.to_string());
        lines.push(String::new());
        for finding in report.findings_with_severity(severity).take(3) {
            lines.push(format!("- **{}**: {}", finding.rule_id, finding.rule_subject));
        }
        lines.push(String::new());
    }

    lines.extend([
        "### 建议措施".to_string(),
        String::new(),
        "1. 立即审查所有Critical级别发现".to_string(),
        "2. 制定High级别问题整改计划".to_string(),
        "3. 定期复核Medium/Low级别风险点".to_string(),
        String::new(),
        "---".to_string(),
        format!("*报告生成时间: {}*", generated_at.to_display_string()),
    ]);

    lines.join("\n")
}

// ─── Comparison ──────────────────────────────────────────────────────

/// One metric of two runs side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricDelta {
    pub name: &'static str,
    pub current: usize,
    pub previous: usize,
}

impl MetricDelta {
    pub fn delta(&self) -> i64 {
        self.current as i64 - self.previous as i64
    }
}

/// A violated rule listed in a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleRef {
    pub rule_id: String,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportComparison {
    pub current_audited_at: Timestamp,
    pub previous_audited_at: Timestamp,
    pub metrics: Vec<MetricDelta>,
    /// Rules violated now but not before, in current finding order.
    pub new_violations: Vec<RuleRef>,
    /// Rules violated before but not now, in previous finding order.
    pub resolved: Vec<RuleRef>,
}

/// Compare a run against an earlier one.
pub fn compare_reports(current: &AuditReport, previous: &AuditReport) -> ReportComparison {
    let metric = |name, pick: fn(&AuditReport) -> usize| MetricDelta {
        name,
        current: pick(current),
        previous: pick(previous),
    };
    let metrics = vec![
        metric("总违规数", |r| r.total_violations),
        metric("Critical", |r| r.severity.critical),
        metric("High", |r| r.severity.high),
        metric("Medium", |r| r.severity.medium),
    ];

    ReportComparison {
        current_audited_at: current.audited_at,
        previous_audited_at: previous.audited_at,
        metrics,
        new_violations: violated_only_in(current, previous),
        resolved: violated_only_in(previous, current),
    }
}

fn violated_only_in(report: &AuditReport, other: &AuditReport) -> Vec<RuleRef> {
    let excluded: BTreeSet<&str> = other.findings.iter().map(|f| f.rule_id.as_str()).collect();
    let mut seen = BTreeSet::new();
    report
        .findings
        .iter()
        .filter(|f| !excluded.contains(f.rule_id.as_str()) && seen.insert(f.rule_id.as_str()))
        .map(|f| RuleRef {
            rule_id: f.rule_id.clone(),
            subject: f.rule_subject.clone(),
        })
        .collect()
}

impl ReportComparison {
    pub fn to_markdown(&self) -> String {
        let mut lines = vec![
            "# 审计对比报告".to_string(),
            String::new(),
            format!(
                "**当前审计**: {}",
                self.current_audited_at.as_datetime().format("%Y-%m-%d")
            ),
            format!(
                "**对比审计**: {}",
                self.previous_audited_at.as_datetime().format("%Y-%m-%d")
            ),
            String::new(),
            "## 变化概览".to_string(),
            String::new(),
            "| 指标 | 当前 | 之前 | 变化 |".to_string(),
            "|------|------|------|------|".to_string(),
        ];

        for m in &self.metrics {
            let delta = m.delta();
            let trend = match delta.signum() {
                1 => "📈",
                -1 => "📉",
                _ => "➡️",
            };
            let shown = if delta > 0 {
                format!("+{delta}")
            } else {
                delta.to_string()
            };
            lines.push(format!(
                "| {} | {} | {} | {} {} |",
                m.name, m.current, m.previous, trend, shown
            ));
        }

        if !self.new_violations.is_empty() {
            lines.extend([String::new(), "## 新增违规".to_string(), String::new()]);
            for r in &self.new_violations {
                lines.push(format!("- [{}] {}", r.rule_id, r.subject));
            }
        }

        if !self.resolved.is_empty() {
            lines.extend([String::new(), "## 已解决问题".to_string(), String::new()]);
            for r in &self.resolved {
                lines.push(format!("- ✅ [{}] {}", r.rule_id, r.subject));
            }
        }

        lines.join("\n")
    }
}
