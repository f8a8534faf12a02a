//! # JSON Document Source
//!
//! PDF extraction is out of scope for the CLI; audits run on financial
//! data already extracted to JSON. Three layouts are accepted:
//!
//! ```text
//! { "货币资金": 1.2e9, ... }                               plain record
//! { "financial_data": {...}, "raw_text": "...", "name": "..." }
//! { "scenarios": { "<name>": { "financial_data": {...} } } }
//! ```
//!
//! The scenario layout needs `--scenario`. A sidecar text file may supply
//! the document text used for keyword retrieval.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use eagleeye_core::FinancialRecord;
use eagleeye_state::{DocumentSource, ParsedDocument, SourceError};

#[derive(Debug, Clone)]
pub struct JsonDocumentSource {
    path: PathBuf,
    scenario: Option<String>,
    text_path: Option<PathBuf>,
}

impl JsonDocumentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            scenario: None,
            text_path: None,
        }
    }

    pub fn with_scenario(mut self, scenario: Option<String>) -> Self {
        self.scenario = scenario;
        self
    }

    pub fn with_text_file(mut self, path: Option<PathBuf>) -> Self {
        self.text_path = path;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string()
    }

    fn malformed(&self, reason: impl Into<String>) -> SourceError {
        SourceError::Malformed {
            name: self.display_name(),
            reason: reason.into(),
        }
    }

    fn read(path: &Path) -> Result<String, SourceError> {
        std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Pick the object that describes the document.
    fn select<'v>(&self, root: &'v Map<String, Value>) -> Result<&'v Map<String, Value>, SourceError> {
        match (&self.scenario, root.get("scenarios")) {
            (Some(name), Some(Value::Object(scenarios))) => match scenarios.get(name) {
                Some(Value::Object(entry)) => Ok(entry),
                Some(_) => Err(self.malformed(format!("scenario {name:?} is not an object"))),
                None => {
                    let known: Vec<&str> = scenarios.keys().map(String::as_str).collect();
                    Err(self.malformed(format!(
                        "no scenario {name:?} (available: {})",
                        known.join(", ")
                    )))
                }
            },
            (Some(name), _) => Err(self.malformed(format!(
                "scenario {name:?} requested but the file has no \"scenarios\" object"
            ))),
            (None, Some(Value::Object(_))) => Err(self.malformed(
                "file holds several scenarios; choose one with --scenario",
            )),
            (None, _) => Ok(root),
        }
    }
}

impl DocumentSource for JsonDocumentSource {
    fn parse(&self) -> Result<ParsedDocument, SourceError> {
        let text = Self::read(&self.path)?;
        let root: Value =
            serde_json::from_str(&text).map_err(|e| self.malformed(format!("invalid JSON: {e}")))?;
        let Value::Object(root) = root else {
            return Err(self.malformed("top level must be a JSON object"));
        };
        let entry = self.select(&root)?;

        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.display_name());
        let mut document =
            ParsedDocument::new(name).with_path(self.path.display().to_string());

        let record = match entry.get("financial_data") {
            // Extracted but empty: the run fails before evaluation.
            Some(Value::Null) => None,
            Some(data) => Some(
                FinancialRecord::from_json_value(data.clone())
                    .map_err(|e| self.malformed(e.to_string()))?,
            ),
            None => Some(
                FinancialRecord::from_json_value(Value::Object(entry.clone()))
                    .map_err(|e| self.malformed(e.to_string()))?,
            ),
        };
        if let Some(record) = record {
            document = document.with_record(record);
        }

        if let Some(raw) = entry.get("raw_text").and_then(Value::as_str) {
            document = document.with_text(raw);
        }
        if let Some(path) = &self.text_path {
            document = document.with_text(Self::read(path)?);
        }
        if let Some(Value::Array(words)) = entry.get("keywords") {
            let keywords = words
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
            document = document.with_keywords(keywords);
        }

        tracing::info!(
            document = %document.name,
            fields = document.record.as_ref().map_or(0, FinancialRecord::len),
            "document loaded"
        );
        Ok(document)
    }
}
