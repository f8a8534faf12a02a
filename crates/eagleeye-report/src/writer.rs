//! # Report Files
//!
//! Reports are written as `audit_report_<stem>_<YYYYmmdd_HHMMSS>.{md,json}`
//! under an output directory, which is created on first write. The stamp
//! is the run's audit time, so the Markdown and JSON of one run share a
//! base name.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use eagleeye_core::AuditReport;

use crate::error::ReportError;
use crate::render::{render_json, render_markdown};

/// Which files to write for a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Markdown,
    Json,
    #[default]
    Both,
}

impl FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "both" | "all" => Ok(Self::Both),
            _ => Err(ReportError::UnknownFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Markdown => "markdown",
            Self::Json => "json",
            Self::Both => "both",
        })
    }
}

#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `audit_report_<stem>_<stamp>`, without extension.
    pub fn base_name(report: &AuditReport) -> String {
        let stem = Path::new(&report.subject)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("document");
        format!("audit_report_{}_{}", stem, report.audited_at.to_file_stamp())
    }

    /// Write the Markdown report. `file_name` overrides the default name.
    pub fn save_markdown(
        &self,
        report: &AuditReport,
        file_name: Option<&str>,
    ) -> Result<PathBuf, ReportError> {
        let name = file_name
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}.md", Self::base_name(report)));
        self.write(&name, &render_markdown(report))
    }

    /// Write the JSON report. `file_name` overrides the default name.
    pub fn save_json(
        &self,
        report: &AuditReport,
        file_name: Option<&str>,
    ) -> Result<PathBuf, ReportError> {
        let name = file_name
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}.json", Self::base_name(report)));
        self.write(&name, &render_json(report)?)
    }

    /// Write both files under one base name.
    pub fn save_both(
        &self,
        report: &AuditReport,
        base_name: Option<&str>,
    ) -> Result<(PathBuf, PathBuf), ReportError> {
        let base = base_name
            .map(str::to_string)
            .unwrap_or_else(|| Self::base_name(report));
        let md = self.save_markdown(report, Some(&format!("{base}.md")))?;
        let json = self.save_json(report, Some(&format!("{base}.json")))?;
        Ok((md, json))
    }

    /// Write the files `format` asks for, returning their paths.
    pub fn save(&self, report: &AuditReport, format: ReportFormat) -> Result<Vec<PathBuf>, ReportError> {
        match format {
            ReportFormat::Markdown => Ok(vec![self.save_markdown(report, None)?]),
            ReportFormat::Json => Ok(vec![self.save_json(report, None)?]),
            ReportFormat::Both => {
                let (md, json) = self.save_both(report, None)?;
                Ok(vec![md, json])
            }
        }
    }

    fn write(&self, file_name: &str, contents: &str) -> Result<PathBuf, ReportError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| ReportError::Io {
            path: self.output_dir.clone(),
            source,
        })?;
        let path = self.output_dir.join(file_name);
        std::fs::write(&path, contents).map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), bytes = contents.len(), "report written");
        Ok(path)
    }
}
