//! # Rules Subcommand
//!
//! Rulebook inspection.
//!
//! - `list` — One line per rule, optionally filtered by category or priority.
//! - `show` — Every field of one rule.
//! - `search` — Free-text search, or keyword retrieval with `--keywords`.
//! - `check` — Parse every rule expression; report lines and rules that
//!   would never evaluate. Exits `1` if anything is reported.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use eagleeye_core::{Priority, Rule, RuleCategory};
use eagleeye_eval::ExpressionEvaluator;
use eagleeye_rules::Rulebook;

use crate::config::Settings;

/// Arguments for the `eagleeye rules` subcommand.
#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Rulebook JSONL (overrides configuration).
    #[arg(long, global = true, value_name = "PATH")]
    pub rulebook: Option<PathBuf>,

    #[command(subcommand)]
    pub command: RulesCommand,
}

/// Rules subcommands.
#[derive(Subcommand, Debug)]
pub enum RulesCommand {
    /// List rules.
    List {
        /// Only this category (CL, FM, LC, OP).
        #[arg(long)]
        category: Option<RuleCategory>,
        /// Only this priority.
        #[arg(long)]
        priority: Option<Priority>,
        /// Print as JSON lines instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show one rule in full.
    Show {
        /// Rule identifier (e.g. "CL-001").
        id: String,
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Search rules by text, or rank them by keyword overlap.
    Search {
        /// Search term, or comma-separated keywords with --keywords.
        term: String,
        /// Treat TERM as keywords and rank by overlap.
        #[arg(long)]
        keywords: bool,
        /// Maximum results with --keywords.
        #[arg(long, default_value_t = eagleeye_rules::DEFAULT_TOP_K)]
        top_k: usize,
    },

    /// Verify that every line loads and every expression parses.
    Check,
}

/// Run the rules subcommand.
pub fn run_rules(args: &RulesArgs, settings: &Settings) -> Result<u8> {
    let path = args.rulebook.as_ref().unwrap_or(&settings.rulebook);
    let book = Rulebook::from_path(path)
        .with_context(|| format!("failed to load rulebook {}", path.display()))?;
    tracing::info!(rules = book.len(), path = %path.display(), "rulebook loaded");

    match &args.command {
        RulesCommand::List {
            category,
            priority,
            json,
        } => {
            let selected: Vec<&Rule> = book
                .all()
                .iter()
                .filter(|r| category.map_or(true, |c| r.category == c))
                .filter(|r| priority.map_or(true, |p| r.priority == p))
                .collect();
            for rule in &selected {
                if *json {
                    println!("{}", serde_json::to_string(rule)?);
                } else {
                    println!("{}", list_line(rule));
                }
            }
            if !*json {
                println!("{} of {} rules", selected.len(), book.len());
            }
            Ok(0)
        }
        RulesCommand::Show { id, json } => {
            let rule = book.require(id)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(rule)?);
            } else {
                println!("{}", describe(rule));
            }
            Ok(0)
        }
        RulesCommand::Search {
            term,
            keywords,
            top_k,
        } => {
            if *keywords {
                let words: Vec<&str> = term.split([',', '，']).map(str::trim).collect();
                let ranked = book.retrieve_by_keywords(&words, *top_k);
                for scored in &ranked {
                    println!("{:.3}  {}", scored.score, list_line(scored.rule));
                }
                println!("{} rules matched", ranked.len());
            } else {
                let found = book.search(term);
                for rule in &found {
                    println!("{}", list_line(rule));
                }
                println!("{} rules matched", found.len());
            }
            Ok(0)
        }
        RulesCommand::Check => {
            let problems = check(&book);
            for line in &problems {
                println!("FAIL: {line}");
            }
            if problems.is_empty() {
                println!("OK: {} rules, all expressions parse", book.len());
                Ok(0)
            } else {
                println!("{} problem(s) in {} rules", problems.len(), book.len());
                Ok(1)
            }
        }
    }
}

fn list_line(rule: &Rule) -> String {
    format!(
        "{:<8} {:<2} {:<8} {}",
        rule.id,
        rule.category.code(),
        rule.priority.as_str(),
        rule.subject
    )
}

fn describe(rule: &Rule) -> String {
    let mut lines = vec![
        format!("{} {}", rule.id, rule.subject),
        format!("  category:    {}", rule.category.display_name()),
        format!("  priority:    {}", rule.priority),
        format!("  expression:  {}", rule.expression),
        format!("  description: {}", rule.description),
    ];
    if !rule.source.is_empty() {
        lines.push(format!("  source:      {}", rule.source));
    }
    if !rule.trigger_keywords.is_empty() {
        lines.push(format!("  keywords:    {}", rule.trigger_keywords.join(", ")));
    }
    if !rule.linked_rules.is_empty() {
        lines.push(format!("  linked:      {}", rule.linked_rules.join(", ")));
    }
    if !rule.procedures.is_empty() {
        lines.push("  procedures:".to_string());
        for (i, step) in rule.procedures.iter().enumerate() {
            lines.push(format!("    {}. {}", i + 1, step));
        }
    }
    lines.join("\n")
}

/// Skipped lines and unparseable expressions, one message each.
pub fn check(book: &Rulebook) -> Vec<String> {
    let evaluator = ExpressionEvaluator::new();
    let skipped = book
        .skipped()
        .iter()
        .map(|s| format!("line {}: {}", s.line, s.reason));
    let unparseable = book.all().iter().filter_map(|rule| {
        evaluator
            .check_syntax(&rule.expression)
            .err()
            .map(|e| format!("{}: {e}", rule.id))
    });
    skipped.chain(unparseable).collect()
}
