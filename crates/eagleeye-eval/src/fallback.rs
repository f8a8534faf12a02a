//! Best-effort numeric helpers that work on raw text rather than a tree.
//!
//! Neither of these ever decides a violation on its own when the
//! structured path succeeds: [`compare_numbers`] is consulted only after a
//! syntax error, and [`extract_threshold`] is for report display.

const FALLBACK_OPERATORS: [&str; 6] = [" >= ", " <= ", " > ", " < ", " == ", " != "];

/// Evaluate text of the exact shape `NUMBER OP NUMBER`.
///
/// Whitespace is collapsed first. Operators are tried in a fixed order;
/// the first one that splits the text into exactly two parts decides, and
/// if either part is not a number the whole attempt fails.
pub fn compare_numbers(text: &str) -> Option<bool> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    for op in FALLBACK_OPERATORS {
        if !collapsed.contains(op) {
            continue;
        }
        let parts: Vec<&str> = collapsed.split(op).collect();
        if parts.len() != 2 {
            continue;
        }
        let left: f64 = parts[0].trim().parse().ok()?;
        let right: f64 = parts[1].trim().parse().ok()?;
        return Some(match op.trim() {
            ">=" => left >= right,
            "<=" => left <= right,
            ">" => left > right,
            "<" => left < right,
            "==" => left == right,
            _ => left != right,
        });
    }
    None
}

/// The first numeric literal that follows a comparison operator in the
/// rule's original text, e.g. `0.5` in `(a / b) < 0.5`.
pub fn extract_threshold(expression: &str) -> Option<f64> {
    let chars: Vec<char> = expression.chars().collect();
    let is_op = |c: char| matches!(c, '>' | '<' | '=' | '!');

    let mut i = 0;
    while i < chars.len() {
        if !is_op(chars[i]) {
            i += 1;
            continue;
        }
        let mut j = i;
        while j < chars.len() && is_op(chars[j]) {
            j += 1;
        }
        let mut k = j;
        while k < chars.len() && chars[k].is_whitespace() {
            k += 1;
        }
        let negative = chars.get(k) == Some(&'-');
        if negative {
            k += 1;
        }
        let digits_start = k;
        while k < chars.len() && (chars[k].is_ascii_digit() || chars[k] == '.') {
            k += 1;
        }
        if k > digits_start {
            let raw: String = chars[digits_start..k].iter().collect();
            let value: f64 = raw.parse().ok()?;
            return Some(if negative { -value } else { value });
        }
        i = j;
    }
    None
}
