//! # eagleeye CLI Entry Point
//!
//! Parses arguments, resolves settings, initializes tracing, and
//! dispatches to the subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use eagleeye_cli::audit::{run_audit, AuditArgs};
use eagleeye_cli::config::Settings;
use eagleeye_cli::eval::{run_eval, EvalArgs};
use eagleeye_cli::rules::{run_rules, RulesArgs};
use eagleeye_cli::verbosity_filter;

/// EagleEye financial compliance auditor.
#[derive(Parser, Debug)]
#[command(name = "eagleeye", version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output directory for generated reports.
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Audit a document against the rulebook.
    Audit(AuditArgs),
    /// Evaluate a single rule expression.
    Eval(EvalArgs),
    /// Inspect the rulebook.
    Rules(RulesArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("eagleeye: {e}");
            return ExitCode::from(2);
        }
    };
    if let Some(dir) = cli.output_dir {
        settings.output_dir = dir;
    }

    let directive = verbosity_filter(cli.verbose)
        .map(str::to_string)
        .or_else(|| settings.log_level.clone())
        .unwrap_or_else(|| "warn".to_string());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match &cli.command {
        Commands::Audit(args) => run_audit(args, &settings),
        Commands::Eval(args) => run_eval(args),
        Commands::Rules(args) => run_rules(args, &settings),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("eagleeye: {e:#}");
            ExitCode::from(2)
        }
    }
}
