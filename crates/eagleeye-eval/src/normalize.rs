//! Normalization: rewrites rulebook spellings into the canonical grammar.
//!
//! All passes are quote-aware: text inside string literals is copied
//! through untouched. Passes run in this order:
//!
//! 1. Connective words. `AND`/`OR`/`NOT` and the standalone ideographic
//!    connectives `且`/`并且`, `或`/`或者`, `非` become `and`/`or`/`not`.
//!    `NULL` becomes `None`.
//! 2. `FIELD 包含 [a, b]` (contains-any) becomes
//!    `sum(1 for __item in [a, b] if __item in FIELD) > 0`.
//! 3. `COUNT(L op V)` becomes `sum(1 for __item in (L) if __item op (V))`.
//!    A `COUNT(x)` whose argument has no top-level comparison becomes
//!    `len(x)`. Only the text inside the parentheses is inspected.
//! 4. `== None` becomes `is None` and `!= None` becomes `is not None`.

use crate::error::{ExprError, ExprResult};
use crate::scan;

/// Loop variable introduced by the `包含` and `COUNT` rewrites.
pub const COMPREHENSION_VAR: &str = "__item";

const CONTAINS: &str = "包含";

/// Rewrite an expression into the canonical grammar.
pub fn normalize(expression: &str) -> ExprResult<String> {
    let text = rewrite_words(expression);
    let text = rewrite_contains(&text)?;
    let text = rewrite_count(&text)?;
    Ok(rewrite_null_tests(&text))
}

fn canonical_word(word: &str) -> Option<&'static str> {
    match word {
        "AND" | "且" | "并且" => Some("and"),
        "OR" | "或" | "或者" => Some("or"),
        "NOT" | "非" => Some("not"),
        "NULL" => Some("None"),
        _ => None,
    }
}

// ─── Pass 1: connective words ────────────────────────────────────────

fn rewrite_words(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if scan::is_quote(c) {
            let end = scan::quoted_end(&chars, i);
            out.extend(&chars[i..end]);
            i = end;
        } else if scan::starts_number(&chars, i) {
            let end = scan::number_end(&chars, i);
            out.extend(&chars[i..end]);
            i = end;
        } else if scan::is_word_start(c) {
            let end = scan::word_end(&chars, i);
            let word: String = chars[i..end].iter().collect();
            match canonical_word(&word) {
                Some(canonical) => out.push_str(canonical),
                None => out.push_str(&word),
            }
            i = end;
        } else {
            out.push(c);
            i += 1;
        }
    }
    out
}

// ─── Pass 2: 包含 ────────────────────────────────────────────────────

fn rewrite_contains(text: &str) -> ExprResult<String> {
    let mut chars: Vec<char> = text.chars().collect();
    let mut cursor = 0;
    while let Some(start) = find_contains(&chars, cursor) {
        let end = start + CONTAINS.chars().count();
        // Left operand: the word immediately before the operator.
        let mut left_end = start;
        while left_end > 0 && chars[left_end - 1].is_whitespace() {
            left_end -= 1;
        }
        let mut left_start = left_end;
        while left_start > 0 && scan::is_word_char(chars[left_start - 1]) {
            left_start -= 1;
        }
        if left_start == left_end {
            return Err(ExprError::syntax(start, "'包含' needs a field name on its left"));
        }

        // Right operand: a bracketed list.
        let open = scan::skip_ws(&chars, end);
        if chars.get(open) != Some(&'[') {
            return Err(ExprError::syntax(open, "'包含' needs a bracketed list on its right"));
        }
        let close = scan::group_end(&chars, open, '[', ']')
            .ok_or_else(|| ExprError::syntax(open, "unclosed '[' after '包含'"))?;

        let field: String = chars[left_start..left_end].iter().collect();
        let list: String = chars[open..close].iter().collect();
        let replacement = format!(
            "sum(1 for {COMPREHENSION_VAR} in {list} if {COMPREHENSION_VAR} in {field}) > 0"
        );
        let replacement: Vec<char> = replacement.chars().collect();
        cursor = left_start + replacement.len();
        chars.splice(left_start..close, replacement);
    }
    Ok(chars.into_iter().collect())
}

// ─── Pass 3: COUNT ───────────────────────────────────────────────────

fn rewrite_count(text: &str) -> ExprResult<String> {
    let mut chars: Vec<char> = text.chars().collect();
    let mut cursor = 0;
    while let Some((start, end)) = find_word(&chars, cursor, "COUNT") {
        let open = scan::skip_ws(&chars, end);
        if chars.get(open) != Some(&'(') {
            // Not a call; leave it for the parser to judge.
            cursor = end;
            continue;
        }
        let close = scan::group_end(&chars, open, '(', ')')
            .ok_or_else(|| ExprError::syntax(open, "unclosed '(' after COUNT"))?;
        let inner: String = chars[open + 1..close - 1].iter().collect();
        let inner = rewrite_count(&inner)?;

        let replacement = match split_comparison(&inner) {
            Some((list, op, value)) => {
                if list.is_empty() || value.is_empty() {
                    return Err(ExprError::syntax(
                        open,
                        format!("COUNT predicate '{inner}' is missing an operand"),
                    ));
                }
                format!(
                    "sum(1 for {COMPREHENSION_VAR} in ({list}) if {COMPREHENSION_VAR} {op} ({value}))"
                )
            }
            None => format!("len({inner})"),
        };
        let replacement: Vec<char> = replacement.chars().collect();
        cursor = start + replacement.len();
        chars.splice(start..close, replacement);
    }
    Ok(chars.into_iter().collect())
}

/// Split `L op V` at the first comparison operator outside brackets and
/// quotes.
fn split_comparison(text: &str) -> Option<(String, &'static str, String)> {
    let chars: Vec<char> = text.chars().collect();
    let mut depth = 0usize;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if scan::is_quote(c) {
            i = scan::quoted_end(&chars, i);
            continue;
        }
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => {
                let next = chars.get(i + 1).copied();
                let op = match (c, next) {
                    ('>', Some('=')) => Some(">="),
                    ('<', Some('=')) => Some("<="),
                    ('=', Some('=')) => Some("=="),
                    ('!', Some('=')) => Some("!="),
                    ('>', _) => Some(">"),
                    ('<', _) => Some("<"),
                    _ => None,
                };
                if let Some(op) = op {
                    let left: String = chars[..i].iter().collect();
                    let right: String = chars[i + op.len()..].iter().collect();
                    return Some((left.trim().to_string(), op, right.trim().to_string()));
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

// ─── Pass 4: null tests ──────────────────────────────────────────────

fn rewrite_null_tests(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if scan::is_quote(c) {
            let end = scan::quoted_end(&chars, i);
            out.extend(&chars[i..end]);
            i = end;
            continue;
        }
        let negated = match (c, chars.get(i + 1)) {
            ('=', Some('=')) => Some(false),
            ('!', Some('=')) => Some(true),
            _ => None,
        };
        if let Some(negated) = negated {
            let operand = scan::skip_ws(&chars, i + 2);
            if is_word_at(&chars, operand, "None") {
                out.push_str(if negated { "is not " } else { "is " });
                i = operand;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }
    out
}

// ─── Helpers ─────────────────────────────────────────────────────────

/// Whether the standalone word `word` starts at `at`.
fn is_word_at(chars: &[char], at: usize, word: &str) -> bool {
    let len = word.chars().count();
    at + len <= chars.len()
        && chars[at..at + len].iter().copied().eq(word.chars())
        && (at == 0 || !scan::is_word_char(chars[at - 1]))
        && chars.get(at + len).map_or(true, |c| !scan::is_word_char(*c))
}

/// Next `包含` operator outside quotes: either a standalone word, or glued
/// to the end of a field name and followed by a list (`关联方包含[...]`).
/// Anywhere else the characters are part of a field name.
fn find_contains(chars: &[char], from: usize) -> Option<usize> {
    let mut i = from;
    while i < chars.len() {
        if scan::is_quote(chars[i]) {
            i = scan::quoted_end(chars, i);
            continue;
        }
        let len = CONTAINS.chars().count();
        if i + len <= chars.len() && chars[i..i + len].iter().copied().eq(CONTAINS.chars()) {
            let has_list = chars.get(scan::skip_ws(chars, i + len)) == Some(&'[');
            if has_list || is_word_at(chars, i, CONTAINS) {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// Next standalone occurrence of `word` outside quotes, from `from`.
fn find_word(chars: &[char], from: usize, word: &str) -> Option<(usize, usize)> {
    let mut i = from;
    while i < chars.len() {
        let c = chars[i];
        if scan::is_quote(c) {
            i = scan::quoted_end(chars, i);
        } else if scan::is_word_char(c) {
            let end = scan::word_end(chars, i);
            if is_word_at(chars, i, word) {
                return Some((i, end));
            }
            i = end;
        } else {
            i += 1;
        }
    }
    None
}
