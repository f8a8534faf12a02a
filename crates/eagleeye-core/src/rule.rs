//! # Audit Rules
//!
//! A rule is one entry of the curated rulebook: an identifier, a category,
//! a priority, the logic expression evaluated against a financial record,
//! and the descriptive material a finding carries into the report.
//!
//! Rulebook files spell fields the legacy way (`rule_id`, `logic_schema`,
//! `linked_models`, `audit_procedures`); those spellings are accepted as
//! serde aliases and never leak past deserialization.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EagleEyeError;

/// Rule category.
///
/// Serialized as the two-letter rulebook code. Ordering follows the code,
/// which keeps category rollups stable in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RuleCategory {
    /// Cross-ledger reconciliation between statements.
    #[serde(rename = "CL", alias = "CrossLedger")]
    CrossLedger,
    /// Financial manipulation indicators.
    #[serde(rename = "FM", alias = "FinancialManipulation")]
    FinancialManipulation,
    /// Legal and regulatory compliance.
    #[serde(rename = "LC", alias = "LegalCompliance")]
    LegalCompliance,
    /// Operational risk.
    #[serde(rename = "OP", alias = "OperationalRisk")]
    OperationalRisk,
}

impl RuleCategory {
    /// All categories in rollup order.
    pub const ALL: [RuleCategory; 4] = [
        Self::CrossLedger,
        Self::FinancialManipulation,
        Self::LegalCompliance,
        Self::OperationalRisk,
    ];

    /// Two-letter rulebook code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CrossLedger => "CL",
            Self::FinancialManipulation => "FM",
            Self::LegalCompliance => "LC",
            Self::OperationalRisk => "OP",
        }
    }

    /// Human-readable name, bilingual as printed in reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::CrossLedger => "交叉勾稽 (Cross-Ledger)",
            Self::FinancialManipulation => "财务造假 (Financial Manipulation)",
            Self::LegalCompliance => "合规监管 (Legal Compliance)",
            Self::OperationalRisk => "经营风险 (Operational Risk)",
        }
    }
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for RuleCategory {
    type Err = EagleEyeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CL" | "CROSSLEDGER" | "CROSS-LEDGER" => Ok(Self::CrossLedger),
            "FM" | "FINANCIALMANIPULATION" => Ok(Self::FinancialManipulation),
            "LC" | "LEGALCOMPLIANCE" => Ok(Self::LegalCompliance),
            "OP" | "OPERATIONALRISK" => Ok(Self::OperationalRisk),
            _ => Err(EagleEyeError::UnknownVariant {
                kind: "rule category",
                value: s.to_string(),
            }),
        }
    }
}

/// Rule priority, inherited one-to-one by findings as their severity.
///
/// Declared most severe first so the derived `Ord` sorts Critical first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[serde(alias = "critical", alias = "CRITICAL")]
    Critical,
    #[serde(alias = "high", alias = "HIGH")]
    High,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "low", alias = "LOW")]
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = EagleEyeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(EagleEyeError::UnknownVariant {
                kind: "priority",
                value: s.to_string(),
            }),
        }
    }
}

/// One rulebook entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique rule identifier (e.g. `CL-001`).
    #[serde(alias = "rule_id")]
    pub id: String,
    pub category: RuleCategory,
    /// Short title of the rule.
    #[serde(default)]
    pub subject: String,
    /// Keywords that make this rule relevant to a document.
    #[serde(default)]
    pub trigger_keywords: Vec<String>,
    /// Logic expression evaluated against a financial record.
    #[serde(alias = "logic_schema")]
    pub expression: String,
    pub priority: Priority,
    pub description: String,
    /// Regulatory or literature reference.
    #[serde(default)]
    pub source: String,
    /// Ids of related rules.
    #[serde(default, alias = "linked_models")]
    pub linked_rules: Vec<String>,
    /// Ordered audit procedure steps.
    #[serde(default, alias = "audit_procedures")]
    pub procedures: Vec<String>,
}

impl Rule {
    /// Decode one JSONL rulebook line.
    pub fn from_jsonl_line(line: &str) -> Result<Self, EagleEyeError> {
        let rule: Rule = serde_json::from_str(line.trim())?;
        if rule.id.trim().is_empty() {
            return Err(EagleEyeError::InvalidRule("empty rule id".to_string()));
        }
        Ok(rule)
    }

    pub fn is_critical(&self) -> bool {
        self.priority == Priority::Critical
    }

    /// Text used for keyword matching: subject, keywords and description.
    pub fn searchable_text(&self) -> String {
        format!(
            "{} {} {}",
            self.subject,
            self.trigger_keywords.join(" "),
            self.description
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY_LINE: &str = r#"{"rule_id": "CL-001", "category": "CL", "subject": "政府补助勾稽",
        "trigger_keywords": ["政府补助", "营业外收入"], "logic_schema": "abs(营业外收入_政府补助 - 递延收益_本期摊销) > 1000000",
        "priority": "Critical", "description": "政府补助与递延收益摊销不一致", "source": "CAS 16",
        "linked_models": ["CL-002"], "audit_procedures": ["核对补助文件", "检查摊销表"]}"#;

    #[test]
    fn decodes_legacy_field_names() {
        let rule = Rule::from_jsonl_line(LEGACY_LINE).unwrap();
        assert_eq!(rule.id, "CL-001");
        assert_eq!(rule.category, RuleCategory::CrossLedger);
        assert_eq!(rule.priority, Priority::Critical);
        assert!(rule.expression.starts_with("abs("));
        assert_eq!(rule.linked_rules, vec!["CL-002"]);
        assert_eq!(rule.procedures.len(), 2);
        assert!(rule.is_critical());
    }

    #[test]
    fn optional_fields_default() {
        let rule = Rule::from_jsonl_line(
            r#"{"id": "OP-9", "category": "OP", "expression": "x > 1", "priority": "low", "description": "d"}"#,
        )
        .unwrap();
        assert_eq!(rule.priority, Priority::Low);
        assert!(rule.trigger_keywords.is_empty());
        assert!(rule.procedures.is_empty());
        assert_eq!(rule.subject, "");
    }

    #[test]
    fn rejects_unknown_category_and_missing_expression() {
        assert!(Rule::from_jsonl_line(
            r#"{"id": "X", "category": "ZZ", "expression": "x", "priority": "High", "description": ""}"#
        )
        .is_err());
        assert!(Rule::from_jsonl_line(
            r#"{"id": "X", "category": "FM", "priority": "High", "description": ""}"#
        )
        .is_err());
    }

    #[test]
    fn rejects_empty_id() {
        let err = Rule::from_jsonl_line(
            r#"{"id": " ", "category": "FM", "expression": "x", "priority": "High", "description": ""}"#,
        )
        .unwrap_err();
        assert!(matches!(err, EagleEyeError::InvalidRule(_)));
    }

    #[test]
    fn category_serializes_as_code() {
        let json = serde_json::to_string(&RuleCategory::LegalCompliance).unwrap();
        assert_eq!(json, "\"LC\"");
        let back: RuleCategory = serde_json::from_str("\"OperationalRisk\"").unwrap();
        assert_eq!(back, RuleCategory::OperationalRisk);
    }

    #[test]
    fn category_and_priority_from_str() {
        assert_eq!("fm".parse::<RuleCategory>().unwrap(), RuleCategory::FinancialManipulation);
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn priority_orders_critical_first() {
        let mut ps = vec![Priority::Low, Priority::Critical, Priority::Medium, Priority::High];
        ps.sort();
        assert_eq!(
            ps,
            vec![Priority::Critical, Priority::High, Priority::Medium, Priority::Low]
        );
    }
}
