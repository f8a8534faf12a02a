//! # Audit Subcommand
//!
//! Runs one document through the full audit and writes the reports.
//!
//! Exit codes: `0` when the run completed without Critical findings, `1`
//! when it found Critical issues or did not complete, `2` on operational
//! errors (unreadable rulebook, unwritable output directory).

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use eagleeye_core::{AuditReport, Timestamp};
use eagleeye_report::{executive_summary, render_markdown, text_summary, ReportFormat, ReportWriter};
use eagleeye_rules::JsonlRuleSource;
use eagleeye_state::{AuditOrchestrator, AuditPhase};

use crate::config::Settings;
use crate::source::JsonDocumentSource;

/// Arguments for the `eagleeye audit` subcommand.
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Extracted financial data (JSON).
    #[arg(value_name = "DOCUMENT")]
    pub document: PathBuf,

    /// Scenario to audit when the file holds several.
    #[arg(long)]
    pub scenario: Option<String>,

    /// Plain-text body of the document, used for keyword retrieval.
    #[arg(long, value_name = "PATH")]
    pub text: Option<PathBuf>,

    /// Rulebook JSONL (overrides configuration).
    #[arg(long, value_name = "PATH")]
    pub rulebook: Option<PathBuf>,

    /// Only evaluate rules retrieved by keyword overlap.
    #[arg(long)]
    pub rag_only: bool,

    /// Number of rules to retrieve with --rag-only.
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Report files to write: markdown, json or both.
    #[arg(long)]
    pub format: Option<ReportFormat>,

    /// Also write an executive summary next to the reports.
    #[arg(long)]
    pub executive: bool,

    /// Print the Markdown report to stdout.
    #[arg(long)]
    pub print: bool,

    /// Do not write report files.
    #[arg(long)]
    pub no_save: bool,
}

/// Run the audit subcommand.
pub fn run_audit(args: &AuditArgs, settings: &Settings) -> Result<u8> {
    let rulebook = args.rulebook.as_ref().unwrap_or(&settings.rulebook);
    if !rulebook.is_file() {
        bail!("rulebook not found: {}", rulebook.display());
    }

    let mut options = settings.audit_options();
    if args.rag_only {
        options.check_all_rules = false;
    }
    if let Some(top_k) = args.top_k {
        options.top_k = top_k;
    }

    let document = JsonDocumentSource::new(&args.document)
        .with_scenario(args.scenario.clone())
        .with_text_file(args.text.clone());
    let rules = JsonlRuleSource::new(rulebook);

    tracing::info!(
        document = %args.document.display(),
        rulebook = %rulebook.display(),
        check_all_rules = options.check_all_rules,
        "starting audit"
    );
    let report = AuditOrchestrator::new(options).run_with_progress(&document, &rules, |p| {
        if p.phase == AuditPhase::Evaluating {
            if let Some(rule) = &p.last_rule {
                tracing::debug!(rule = %rule, index = p.rule_index, total = p.rule_total, "rule evaluated");
            }
        }
    });

    println!("{}", text_summary(&report));

    if !args.no_save {
        let format = args.format.unwrap_or(settings.report_format);
        save_reports(&report, &settings.output_dir, format, args.executive)?;
    }
    if args.print {
        println!();
        println!("{}", render_markdown(&report));
    }

    Ok(exit_code(&report))
}

fn save_reports(
    report: &AuditReport,
    output_dir: &std::path::Path,
    format: ReportFormat,
    executive: bool,
) -> Result<()> {
    let writer = ReportWriter::new(output_dir);
    let written = writer
        .save(report, format)
        .with_context(|| format!("failed to write reports to {}", output_dir.display()))?;
    for path in &written {
        println!("报告已保存: {}", path.display());
    }

    if executive {
        let path = output_dir.join(format!("{}_executive.md", ReportWriter::base_name(report)));
        std::fs::write(&path, executive_summary(report, Timestamp::now()))
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("执行摘要已保存: {}", path.display());
    }
    Ok(())
}

/// `1` for Critical findings or an incomplete run, otherwise `0`.
pub fn exit_code(report: &AuditReport) -> u8 {
    if report.status.is_failed() || report.has_critical() {
        1
    } else {
        0
    }
}
