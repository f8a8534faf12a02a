//! # Eval Subcommand
//!
//! Evaluates a single expression against a record and prints the outcome
//! as JSON. Useful when writing or debugging rulebook entries:
//!
//! ```bash
//! eagleeye eval "应收账款 / 营业收入 > 0.5" --field 应收账款=6e8 --field 营业收入=1e9
//! eagleeye eval "COUNT(季度经营现金流 < 0) >= 3" --record data.json
//! ```
//!
//! Exits `1` when the expression is violated, `0` otherwise (including
//! insufficient data and evaluation errors, which are in the output).

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use serde::Serialize;

use eagleeye_core::{EvaluationOutcome, FieldValue, FinancialRecord};
use eagleeye_eval::ExpressionEvaluator;

/// Arguments for the `eagleeye eval` subcommand.
#[derive(Args, Debug)]
pub struct EvalArgs {
    /// Rule expression to evaluate.
    #[arg(value_name = "EXPRESSION")]
    pub expression: String,

    /// JSON object of field values.
    #[arg(long, value_name = "PATH")]
    pub record: Option<PathBuf>,

    /// Inline field, `NAME=VALUE`. VALUE is read as JSON when it parses,
    /// otherwise as text. Overrides fields from --record.
    #[arg(long = "field", value_name = "NAME=VALUE")]
    pub fields: Vec<String>,

    /// Only check that the expression parses.
    #[arg(long)]
    pub syntax_only: bool,
}

#[derive(Serialize)]
struct EvalOutput<'a> {
    expression: &'a str,
    #[serde(flatten)]
    outcome: &'a EvaluationOutcome,
}

/// Run the eval subcommand.
pub fn run_eval(args: &EvalArgs) -> Result<u8> {
    let evaluator = ExpressionEvaluator::new();

    if args.syntax_only {
        return match evaluator.check_syntax(&args.expression) {
            Ok(()) => {
                println!("OK: {}", args.expression);
                Ok(0)
            }
            Err(e) => {
                println!("FAIL: {e}");
                Ok(1)
            }
        };
    }

    let record = build_record(args)?;
    let outcome = evaluator.evaluate(&args.expression, &record);
    let output = EvalOutput {
        expression: &args.expression,
        outcome: &outcome,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(u8::from(outcome.violated()))
}

fn build_record(args: &EvalArgs) -> Result<FinancialRecord> {
    let mut record = match &args.record {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            FinancialRecord::from_json_str(&text)
                .with_context(|| format!("invalid record in {}", path.display()))?
        }
        None => FinancialRecord::new(),
    };
    for raw in &args.fields {
        let (name, value) = parse_field(raw)?;
        record.insert(name, value);
    }
    Ok(record)
}

/// Split `NAME=VALUE` on the first `=`.
pub fn parse_field(raw: &str) -> Result<(String, FieldValue)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=VALUE, got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("empty field name in {raw:?}"));
    }
    let value = serde_json::from_str::<FieldValue>(value.trim())
        .unwrap_or_else(|_| FieldValue::Text(value.to_string()));
    Ok((name.to_string(), value))
}
