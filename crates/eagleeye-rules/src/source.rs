//! # Rule Sources
//!
//! The orchestrator asks a [`RuleSource`] for the rules of one run: either
//! every rule, or the rules ranked most relevant to a document. The
//! in-memory [`Rulebook`] answers both directly; [`JsonlRuleSource`] reads
//! a rulebook file on first use and answers from it afterwards.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use eagleeye_core::Rule;

use crate::error::RulebookError;
use crate::rulebook::Rulebook;

/// Supplies the rule set for an audit run.
pub trait RuleSource {
    /// Every rule, in rulebook order.
    fn all_rules(&self) -> Result<Vec<Rule>, RulebookError>;

    /// Up to `top_k` rules relevant to a document, best first.
    fn relevant_rules(
        &self,
        text: &str,
        keywords: &[String],
        top_k: usize,
    ) -> Result<Vec<Rule>, RulebookError>;
}

impl RuleSource for Rulebook {
    fn all_rules(&self) -> Result<Vec<Rule>, RulebookError> {
        Ok(self.all().to_vec())
    }

    fn relevant_rules(
        &self,
        text: &str,
        keywords: &[String],
        top_k: usize,
    ) -> Result<Vec<Rule>, RulebookError> {
        Ok(self
            .retrieve_for_document(text, keywords, top_k)
            .into_iter()
            .map(|scored| scored.rule.clone())
            .collect())
    }
}

/// A rulebook file, loaded lazily and cached for the life of the source.
#[derive(Debug)]
pub struct JsonlRuleSource {
    path: PathBuf,
    book: OnceLock<Rulebook>,
}

impl JsonlRuleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            book: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The loaded rulebook, reading the file on first call.
    pub fn rulebook(&self) -> Result<&Rulebook, RulebookError> {
        if let Some(book) = self.book.get() {
            return Ok(book);
        }
        let loaded = Rulebook::from_path(&self.path)?;
        Ok(self.book.get_or_init(|| loaded))
    }
}

impl RuleSource for JsonlRuleSource {
    fn all_rules(&self) -> Result<Vec<Rule>, RulebookError> {
        self.rulebook()?.all_rules()
    }

    fn relevant_rules(
        &self,
        text: &str,
        keywords: &[String],
        top_k: usize,
    ) -> Result<Vec<Rule>, RulebookError> {
        self.rulebook()?.relevant_rules(text, keywords, top_k)
    }
}
