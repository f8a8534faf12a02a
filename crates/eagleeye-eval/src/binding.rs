//! Binding: substitutes record values into a normalized expression.
//!
//! Field names are replaced longest first (ties by name), and only where
//! the occurrence is delimited by non-identifier characters and lies
//! outside a string literal. A string value that happens to contain another
//! field's name is therefore never rewritten a second time.

use std::collections::BTreeMap;

use eagleeye_core::{FieldValue, FinancialRecord};

use crate::scan;

/// A bound expression and the values that went into it.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub text: String,
    /// Fields that were actually substituted at least once.
    pub evidence: BTreeMap<String, FieldValue>,
}

/// Substitute every record field that occurs in `expression`.
pub fn bind(expression: &str, record: &FinancialRecord) -> Binding {
    let mut chars: Vec<char> = expression.chars().collect();
    let mut evidence = BTreeMap::new();

    for name in record.names_longest_first() {
        let Some(value) = record.get(name) else {
            continue;
        };
        let needle: Vec<char> = name.chars().collect();
        if needle.is_empty() {
            continue;
        }
        let literal: Vec<char> = literal(value).chars().collect();
        if replace_occurrences(&mut chars, &needle, &literal) > 0 {
            evidence.insert(name.to_string(), value.clone());
        }
    }

    Binding {
        text: chars.into_iter().collect(),
        evidence,
    }
}

fn replace_occurrences(chars: &mut Vec<char>, needle: &[char], replacement: &[char]) -> usize {
    let mut count = 0;
    let mut i = 0;
    while i < chars.len() {
        if scan::is_quote(chars[i]) {
            i = scan::quoted_end(chars, i);
            continue;
        }
        let end = i + needle.len();
        let matches = end <= chars.len()
            && chars[i..end] == *needle
            && (i == 0 || !scan::is_word_char(chars[i - 1]))
            && chars.get(end).map_or(true, |c| !scan::is_word_char(*c));
        if matches {
            chars.splice(i..end, replacement.iter().copied());
            i += replacement.len();
            count += 1;
        } else {
            i += 1;
        }
    }
    count
}

/// Source-text literal for a field value.
pub fn literal(value: &FieldValue) -> String {
    match value {
        FieldValue::Null => "None".to_string(),
        FieldValue::Bool(true) => "True".to_string(),
        FieldValue::Bool(false) => "False".to_string(),
        FieldValue::Number(n) => number_literal(*n),
        FieldValue::Text(s) => {
            let mut out = String::with_capacity(s.len() + 2);
            out.push('"');
            for c in s.chars() {
                if c == '"' || c == '\\' {
                    out.push('\\');
                }
                out.push(c);
            }
            out.push('"');
            out
        }
        FieldValue::List(items) => {
            let items: Vec<String> = items.iter().map(literal).collect();
            format!("[{}]", items.join(", "))
        }
    }
}

/// Negative and non-finite numbers are parenthesized so that substitution
/// never changes how the surrounding operators bind (`x ** 2` with
/// `x = -3` must stay `9`).
fn number_literal(n: f64) -> String {
    if n.is_nan() {
        "(1 / 0 - 1 / 0)".to_string()
    } else if n == f64::INFINITY {
        "(1 / 0)".to_string()
    } else if n == f64::NEG_INFINITY {
        "(-(1 / 0))".to_string()
    } else if n < 0.0 {
        format!("({n})")
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_name_wins() {
        let record = FinancialRecord::new()
            .with("收入", 1.0)
            .with("收入_增长率", 0.35);
        let bound = bind("收入_增长率 > 0.3 and 收入 > 0", &record);
        assert_eq!(bound.text, "0.35 > 0.3 and 1 > 0");
        assert_eq!(bound.evidence.len(), 2);
    }

    #[test]
    fn respects_identifier_boundaries() {
        let record = FinancialRecord::new().with("a", 1.0);
        let bound = bind("ab + a + ba", &record);
        assert_eq!(bound.text, "ab + 1 + ba");
    }

    #[test]
    fn skips_quoted_regions() {
        let record = FinancialRecord::new()
            .with("审计意见", "保留意见")
            .with("保留意见", 1.0);
        let bound = bind("审计意见 == '保留意见'", &record);
        assert_eq!(bound.text, "\"保留意见\" == '保留意见'");
        assert!(!bound.evidence.contains_key("保留意见"));
    }

    #[test]
    fn evidence_only_for_substituted_fields() {
        let record = FinancialRecord::new().with("x", 0.77).with("unused", 5.0);
        let bound = bind("x > 0.7", &record);
        assert_eq!(bound.evidence.len(), 1);
        assert_eq!(bound.evidence.get("x"), Some(&FieldValue::Number(0.77)));
    }

    #[test]
    fn literals() {
        assert_eq!(literal(&FieldValue::Null), "None");
        assert_eq!(literal(&FieldValue::Bool(false)), "False");
        assert_eq!(literal(&FieldValue::Number(50_000_000.0)), "50000000");
        assert_eq!(literal(&FieldValue::Number(-3.0)), "(-3)");
        assert_eq!(literal(&FieldValue::Text("a\"b".into())), r#""a\"b""#);
        assert_eq!(
            literal(&FieldValue::List(vec![FieldValue::Number(1.5), FieldValue::Text("x".into())])),
            r#"[1.5, "x"]"#
        );
        assert_eq!(literal(&FieldValue::Number(f64::INFINITY)), "(1 / 0)");
    }
}
