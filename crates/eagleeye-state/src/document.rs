//! # Document Sources
//!
//! The Parsing phase asks a [`DocumentSource`] for the financial record
//! and the raw text of the audited document. PDF and OCR extraction live
//! outside this crate; anything able to produce a [`ParsedDocument`] can
//! be plugged in.

use serde::{Deserialize, Serialize};

use eagleeye_core::FinancialRecord;

use crate::error::SourceError;

/// What the Parsing phase extracts from a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// Display name, used as the report subject.
    pub name: String,
    pub path: Option<String>,
    /// Structured financial data. `None` when the document was readable
    /// but yielded no figures; such a run fails before evaluation.
    pub record: Option<FinancialRecord>,
    #[serde(default)]
    pub raw_text: String,
    /// Keywords found in the document. When empty, the orchestrator
    /// extracts them from `raw_text`.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl ParsedDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_record(mut self, record: FinancialRecord) -> Self {
        self.record = Some(record);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.raw_text = text.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }
}

/// Produces the document for one audit run.
pub trait DocumentSource {
    fn parse(&self) -> Result<ParsedDocument, SourceError>;
}

/// A document already in memory.
#[derive(Debug, Clone)]
pub struct StaticDocument(ParsedDocument);

impl StaticDocument {
    pub fn new(document: ParsedDocument) -> Self {
        Self(document)
    }

    /// A document consisting of a record and nothing else.
    pub fn from_record(name: impl Into<String>, record: FinancialRecord) -> Self {
        Self(ParsedDocument::new(name).with_record(record))
    }
}

impl DocumentSource for StaticDocument {
    fn parse(&self) -> Result<ParsedDocument, SourceError> {
        Ok(self.0.clone())
    }
}
