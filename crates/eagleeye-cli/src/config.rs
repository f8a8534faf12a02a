//! # CLI Configuration
//!
//! Settings are resolved in three layers, later ones winning:
//!
//! 1. Built-in defaults.
//! 2. A YAML file given with `--config`.
//! 3. Environment variables:
//!    - `EAGLEEYE_RULEBOOK`: rulebook JSONL path
//!    - `EAGLEEYE_OUTPUT_DIR`: report directory
//!    - `EAGLEEYE_CHECK_ALL_RULES`: `true`/`false`
//!    - `EAGLEEYE_TOP_K`: rules retrieved in keyword mode
//!    - `EAGLEEYE_REPORT_FORMAT`: `markdown`, `json` or `both`
//!    - `EAGLEEYE_LOG_LEVEL`: tracing filter used when no `-v` is given
//!
//! Command-line flags are applied on top by the subcommand handlers.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use eagleeye_report::ReportFormat;
use eagleeye_rules::DEFAULT_TOP_K;
use eagleeye_state::AuditOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub rulebook: PathBuf,
    pub output_dir: PathBuf,
    pub check_all_rules: bool,
    pub top_k: usize,
    pub report_format: ReportFormat,
    pub log_level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rulebook: PathBuf::from("master_rulebook_v3.jsonl"),
            output_dir: PathBuf::from("output"),
            check_all_rules: true,
            top_k: DEFAULT_TOP_K,
            report_format: ReportFormat::Both,
            log_level: None,
        }
    }
}

impl Settings {
    /// Defaults, then the optional file, then the process environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.apply_env(|var| std::env::var(var).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override fields from environment variables, read through `lookup`.
    pub fn apply_env(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(v) = lookup("EAGLEEYE_RULEBOOK") {
            self.rulebook = PathBuf::from(v);
        }
        if let Some(v) = lookup("EAGLEEYE_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("EAGLEEYE_CHECK_ALL_RULES") {
            self.check_all_rules = parse_bool("EAGLEEYE_CHECK_ALL_RULES", &v)?;
        }
        if let Some(v) = lookup("EAGLEEYE_TOP_K") {
            self.top_k = v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: "EAGLEEYE_TOP_K",
                value: v.clone(),
                expected: "a non-negative integer",
            })?;
        }
        if let Some(v) = lookup("EAGLEEYE_REPORT_FORMAT") {
            self.report_format = v.parse().map_err(|_| ConfigError::InvalidValue {
                var: "EAGLEEYE_REPORT_FORMAT",
                value: v.clone(),
                expected: "markdown, json or both",
            })?;
        }
        if let Some(v) = lookup("EAGLEEYE_LOG_LEVEL") {
            if !v.trim().is_empty() {
                self.log_level = Some(v);
            }
        }
        Ok(self)
    }

    pub fn audit_options(&self) -> AuditOptions {
        AuditOptions {
            check_all_rules: self.check_all_rules,
            top_k: self.top_k,
        }
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: raw.to_string(),
            expected: "true or false",
        }),
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid value {value:?} for {var}: expected {expected}")]
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}
