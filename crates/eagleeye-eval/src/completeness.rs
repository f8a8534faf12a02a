//! Completeness check: finds field names that binding could not resolve.
//!
//! After binding, any identifier left in the text that is not a keyword,
//! a function being called, or a comprehension loop variable must be a
//! field the record does not have.

use std::collections::BTreeSet;

use crate::lexer::KEYWORDS;
use crate::scan;

/// Identifiers in `bound` that still look like field names.
pub fn unresolved_fields(bound: &str) -> BTreeSet<String> {
    let chars: Vec<char> = bound.chars().collect();
    let words = words_outside_literals(&chars);

    let loop_vars: BTreeSet<&str> = words
        .windows(2)
        .filter(|pair| pair[0].text == "for")
        .map(|pair| pair[1].text.as_str())
        .collect();

    words
        .iter()
        .filter(|w| !KEYWORDS.contains(&w.text.as_str()))
        .filter(|w| !loop_vars.contains(w.text.as_str()))
        .filter(|w| chars.get(scan::skip_ws(&chars, w.end)) != Some(&'('))
        .map(|w| w.text.clone())
        .collect()
}

struct Word {
    text: String,
    end: usize,
}

fn words_outside_literals(chars: &[char]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if scan::is_quote(c) {
            i = scan::quoted_end(chars, i);
        } else if scan::starts_number(chars, i) {
            i = scan::number_end(chars, i);
        } else if scan::is_word_start(c) {
            let end = scan::word_end(chars, i);
            words.push(Word {
                text: chars[i..end].iter().collect(),
                end,
            });
            i = end;
        } else {
            i += 1;
        }
    }
    words
}
