//! JSONL rulebook parsing.
//!
//! One rule per line. Blank lines (and lines starting with `#`) are
//! ignored. A line that does not decode into a [`Rule`], or that repeats an
//! id already seen, is skipped with a warning; the load carries on.

use std::collections::BTreeSet;
use std::path::Path;

use eagleeye_core::Rule;
use serde::Serialize;

use crate::error::RulebookError;

/// A rulebook line that was not loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line: usize,
    pub reason: String,
}

/// Result of parsing a rulebook: the rules in file order plus every line
/// that was skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleLoad {
    pub rules: Vec<Rule>,
    pub skipped: Vec<SkippedLine>,
}

/// Parse JSONL rulebook text.
pub fn parse_jsonl(text: &str) -> RuleLoad {
    let mut load = RuleLoad::default();
    let mut seen = BTreeSet::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match Rule::from_jsonl_line(line) {
            Ok(rule) if !seen.insert(rule.id.clone()) => {
                tracing::warn!(line = line_no, rule_id = %rule.id, "duplicate rule id, keeping first");
                load.skipped.push(SkippedLine {
                    line: line_no,
                    reason: format!("duplicate rule id {:?}", rule.id),
                });
            }
            Ok(rule) => load.rules.push(rule),
            Err(err) => {
                tracing::warn!(line = line_no, error = %err, "skipping malformed rulebook line");
                load.skipped.push(SkippedLine {
                    line: line_no,
                    reason: err.to_string(),
                });
            }
        }
    }

    load
}

/// Read and parse a rulebook file.
pub fn load_path(path: &Path) -> Result<RuleLoad, RulebookError> {
    let text = std::fs::read_to_string(path).map_err(|source| RulebookError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let load = parse_jsonl(&text);
    tracing::info!(
        path = %path.display(),
        rules = load.rules.len(),
        skipped = load.skipped.len(),
        "rulebook loaded"
    );
    Ok(load)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{"rule_id": "CL-001", "category": "CL", "logic_schema": "x > 1", "priority": "High", "description": "d"}"#;

    #[test]
    fn blank_and_comment_lines_are_ignored() {
        let text = format!("\n# header\n{VALID}\n   \n");
        let load = parse_jsonl(&text);
        assert_eq!(load.rules.len(), 1);
        assert!(load.skipped.is_empty());
    }

    #[test]
    fn malformed_lines_are_skipped_with_line_numbers() {
        let text = format!("{VALID}\n{{not json\n{{\"rule_id\": \"X\"}}\n");
        let load = parse_jsonl(&text);
        assert_eq!(load.rules.len(), 1);
        let lines: Vec<usize> = load.skipped.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![2, 3]);
    }

    #[test]
    fn duplicate_ids_keep_the_first() {
        let second = VALID.replace("x > 1", "x > 2");
        let load = parse_jsonl(&format!("{VALID}\n{second}"));
        assert_eq!(load.rules.len(), 1);
        assert_eq!(load.rules[0].expression, "x > 1");
        assert!(load.skipped[0].reason.contains("duplicate"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_path(Path::new("/nonexistent/rules.jsonl")).unwrap_err();
        assert!(matches!(err, RulebookError::Io { .. }));
    }
}
