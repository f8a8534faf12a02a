//! # Financial Record — The Evaluation Context
//!
//! A flat mapping of field name to value, produced by a document source
//! (table extraction, pattern-matched text) or supplied directly as JSON.
//! Field names are domain-specific and frequently non-ASCII, e.g.
//! `货币资金` or `cash_and_equivalents`.
//!
//! ## Invariants
//!
//! - Keys are unique (`BTreeMap`), and iteration order is deterministic.
//! - A missing key and a key bound to [`FieldValue::Null`] are different
//!   things: the first is "insufficient data", the second is a value that
//!   can be tested with `is None`.
//! - The evaluator only ever borrows a record immutably.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::EagleEyeError;

/// A single financial field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Explicit null. Distinct from the key being absent.
    Null,
    /// Boolean flag (e.g. "has qualified audit opinion").
    Bool(bool),
    /// Numeric amount or ratio.
    Number(f64),
    /// Free text (e.g. auditor name, opinion type).
    Text(String),
    /// Ordered list of values (e.g. a list of related-party names).
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::List(_) => "list",
        }
    }

    /// The numeric value, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Whether this is an explicit null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// The flat set of financial field values being audited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FinancialRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl FinancialRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a record from a JSON object string.
    pub fn from_json_str(s: &str) -> Result<Self, EagleEyeError> {
        let value: serde_json::Value = serde_json::from_str(s)?;
        Self::from_json_value(value)
    }

    /// Build a record from a JSON value, which must be an object.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, EagleEyeError> {
        if !value.is_object() {
            return Err(EagleEyeError::InvalidRecord(format!(
                "expected a JSON object of field values, got {}",
                json_kind(&value)
            )));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a field. Returns the previous value, if any.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.fields.insert(name.into(), value.into())
    }

    /// Look up a field.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Whether the record has a key with this name (null-valued keys count).
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field names ordered longest first, ties broken by name.
    ///
    /// Binding substitutes in this order so that a short name can never
    /// match inside a longer name that shares its prefix.
    pub fn names_longest_first(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_by(|a, b| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        });
        names
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FinancialRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_json_object() {
        let record = FinancialRecord::from_json_str(
            r#"{"货币资金": 50000000, "审计意见": "标准无保留意见", "是否关联交易": true,
                "关联方": ["A公司", "B公司"], "备注": null}"#,
        )
        .unwrap();
        assert_eq!(record.len(), 5);
        assert_eq!(record.get("货币资金"), Some(&FieldValue::Number(50_000_000.0)));
        assert_eq!(record.get("是否关联交易"), Some(&FieldValue::Bool(true)));
        assert_eq!(record.get("备注"), Some(&FieldValue::Null));
        assert!(matches!(record.get("关联方"), Some(FieldValue::List(items)) if items.len() == 2));
    }

    #[test]
    fn null_key_is_present_absent_key_is_not() {
        let record = FinancialRecord::new().with("a", FieldValue::Null);
        assert!(record.contains("a"));
        assert!(!record.contains("b"));
    }

    #[test]
    fn rejects_non_object_json() {
        let err = FinancialRecord::from_json_str("[1, 2, 3]").unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn names_longest_first_breaks_ties_by_name() {
        let record = FinancialRecord::new()
            .with("营业收入", 1.0)
            .with("营业收入_贸易业务占比", 0.4)
            .with("bb", 2.0)
            .with("aa", 3.0);
        assert_eq!(
            record.names_longest_first(),
            vec!["营业收入_贸易业务占比", "营业收入", "aa", "bb"]
        );
    }

    #[test]
    fn field_value_display() {
        let v: FieldValue = vec![1.5, 2.0].into();
        assert_eq!(v.to_string(), "[1.5, 2]");
        assert_eq!(FieldValue::from("x").to_string(), "x");
        assert_eq!(FieldValue::Null.to_string(), "null");
    }

    #[test]
    fn serde_roundtrip_preserves_null() {
        let record = FinancialRecord::new().with("x", 0.77).with("y", FieldValue::Null);
        let json = serde_json::to_string(&record).unwrap();
        let back: FinancialRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
