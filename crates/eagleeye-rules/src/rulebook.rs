//! # In-Memory Rulebook
//!
//! Rules are kept in file order. Every query returns rules in that order
//! except keyword retrieval, which ranks by score.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use eagleeye_core::{Priority, Rule, RuleCategory};
use serde::Serialize;

use crate::error::RulebookError;
use crate::loader::{self, RuleLoad, SkippedLine};

/// A rule paired with its retrieval score in `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredRule<'a> {
    pub rule: &'a Rule,
    pub score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Rulebook {
    rules: Vec<Rule>,
    index: BTreeMap<String, usize>,
    skipped: Vec<SkippedLine>,
}

impl Rulebook {
    /// Load a JSONL rulebook file. Malformed lines are skipped.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RulebookError> {
        loader::load_path(path.as_ref()).map(Self::from_load)
    }

    /// Parse JSONL rulebook text. Malformed lines are skipped.
    pub fn from_jsonl(text: &str) -> Self {
        Self::from_load(loader::parse_jsonl(text))
    }

    /// Build a rulebook from rules already in memory. A repeated id keeps
    /// its first occurrence.
    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        let mut book = Self::default();
        for rule in rules {
            book.push(rule);
        }
        book
    }

    fn from_load(load: RuleLoad) -> Self {
        let mut book = Self::from_rules(load.rules);
        book.skipped = load.skipped;
        book
    }

    fn push(&mut self, rule: Rule) {
        if self.index.contains_key(&rule.id) {
            tracing::warn!(rule_id = %rule.id, "duplicate rule id, keeping first");
            return;
        }
        self.index.insert(rule.id.clone(), self.rules.len());
        self.rules.push(rule);
    }

    // ─── Lookups ─────────────────────────────────────────────────────

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.index.get(id).map(|&i| &self.rules[i])
    }

    /// Like [`get`](Self::get), for callers that treat absence as an error.
    pub fn require(&self, id: &str) -> Result<&Rule, RulebookError> {
        self.get(id)
            .ok_or_else(|| RulebookError::UnknownRule(id.to_string()))
    }

    pub fn all(&self) -> &[Rule] {
        &self.rules
    }

    pub fn by_category(&self, category: RuleCategory) -> Vec<&Rule> {
        self.rules.iter().filter(|r| r.category == category).collect()
    }

    pub fn by_priority(&self, priority: Priority) -> Vec<&Rule> {
        self.rules.iter().filter(|r| r.priority == priority).collect()
    }

    pub fn critical_rules(&self) -> Vec<&Rule> {
        self.by_priority(Priority::Critical)
    }

    /// Rules whose id, subject, keywords or description contain `term`.
    /// ASCII letters match case-insensitively.
    pub fn search(&self, term: &str) -> Vec<&Rule> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.rules
            .iter()
            .filter(|r| {
                r.id.to_lowercase().contains(&needle)
                    || r.searchable_text().to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Lines skipped while loading, empty for in-memory rulebooks.
    pub fn skipped(&self) -> &[SkippedLine] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    // ─── Keyword retrieval ───────────────────────────────────────────

    /// Rank rules by Jaccard overlap of their trigger keywords with
    /// `keywords`, best first, ties broken by rule id. Rules sharing no
    /// keyword are left out. At most `top_k` rules are returned.
    pub fn retrieve_by_keywords<S: AsRef<str>>(
        &self,
        keywords: &[S],
        top_k: usize,
    ) -> Vec<ScoredRule<'_>> {
        let query: BTreeSet<&str> = keywords
            .iter()
            .map(|k| k.as_ref().trim())
            .filter(|k| !k.is_empty())
            .collect();
        if query.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<ScoredRule<'_>> = self
            .rules
            .iter()
            .filter_map(|rule| {
                let own: BTreeSet<&str> =
                    rule.trigger_keywords.iter().map(|k| k.trim()).collect();
                let shared = own.intersection(&query).count();
                if shared == 0 {
                    return None;
                }
                let union = own.union(&query).count();
                Some(ScoredRule {
                    rule,
                    score: shared as f64 / union as f64,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.rule.id.cmp(&b.rule.id))
        });
        scored.truncate(top_k);
        scored
    }

    /// Retrieve rules for a document. The supplied keywords are augmented
    /// with every rulebook trigger keyword that occurs in the document
    /// text, then ranked as in [`retrieve_by_keywords`](Self::retrieve_by_keywords).
    pub fn retrieve_for_document<S: AsRef<str>>(
        &self,
        text: &str,
        keywords: &[S],
        top_k: usize,
    ) -> Vec<ScoredRule<'_>> {
        let mut query: BTreeSet<String> = keywords
            .iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        for rule in &self.rules {
            for keyword in &rule.trigger_keywords {
                let keyword = keyword.trim();
                if !keyword.is_empty() && text.contains(keyword) {
                    query.insert(keyword.to_string());
                }
            }
        }
        let query: Vec<String> = query.into_iter().collect();
        let ranked = self.retrieve_by_keywords(&query, top_k);
        tracing::debug!(
            keywords = query.len(),
            retrieved = ranked.len(),
            "rules retrieved for document"
        );
        ranked
    }
}

impl FromIterator<Rule> for Rulebook {
    fn from_iter<T: IntoIterator<Item = Rule>>(iter: T) -> Self {
        Self::from_rules(iter)
    }
}
