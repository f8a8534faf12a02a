//! # eagleeye-cli — Command-Line Front End
//!
//! Provides the `eagleeye` binary.
//!
//! ## Subcommands
//!
//! - `eagleeye audit` — Audit extracted financial data against the rulebook
//!   and write Markdown/JSON reports.
//! - `eagleeye eval` — Evaluate one expression against a record.
//! - `eagleeye rules` — List, show, search, and syntax-check rules.
//!
//! ```bash
//! eagleeye audit data/2023.json --text data/2023.txt --rag-only
//! eagleeye rules check --rulebook master_rulebook_v3.jsonl
//! ```
//!
//! Settings come from `--config` (YAML) and `EAGLEEYE_*` environment
//! variables; see [`config`].

pub mod audit;
pub mod config;
pub mod eval;
pub mod rules;
pub mod source;

/// Tracing filter for a `-v` count, or `None` to defer to configuration.
pub fn verbosity_filter(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}
