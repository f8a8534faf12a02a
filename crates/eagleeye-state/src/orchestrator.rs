//! # Audit Orchestrator
//!
//! Drives one audit run through the phase graph. A run is a sequence of
//! [`AuditSession::step`] calls, each of which does one unit of work:
//! parse the document, obtain the rule set, evaluate one rule, or close
//! the report. Batch execution ([`AuditOrchestrator::audit`],
//! [`AuditOrchestrator::run`]) is the same step loop driven to the end, so
//! batch and streamed runs over the same inputs produce the same report.
//!
//! ## Fault handling
//!
//! - A rule whose expression fails to evaluate is counted and skipped.
//! - A panic while evaluating a rule is caught at the rule boundary and
//!   treated the same way.
//! - A source or retrieval failure ends the run in `Failed`; the partial
//!   report is still produced.

use std::panic::{catch_unwind, AssertUnwindSafe};

use eagleeye_core::{Finding, FinancialRecord, Rule, RunStatus};
use eagleeye_eval::ExpressionEvaluator;
use eagleeye_rules::{extract_keywords, RuleSource, RulebookError, DEFAULT_VOCABULARY};

use crate::document::{DocumentSource, StaticDocument};
use crate::phase::AuditPhase;
use crate::workflow::{AuditOptions, Progress, RuleFault, WorkflowState};

/// Subject name given to runs fed a record directly.
pub const DIRECT_INPUT: &str = "direct input";

// ─── Orchestrator ────────────────────────────────────────────────────

/// Configured entry point for audit runs. Holds no per-run state.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditOrchestrator {
    evaluator: ExpressionEvaluator,
    options: AuditOptions,
}

impl AuditOrchestrator {
    pub fn new(options: AuditOptions) -> Self {
        Self {
            evaluator: ExpressionEvaluator::new(),
            options,
        }
    }

    pub fn options(&self) -> &AuditOptions {
        &self.options
    }

    /// Bind the collaborators of one run.
    pub fn session<'a>(
        &'a self,
        document: &'a dyn DocumentSource,
        rules: &'a dyn RuleSource,
    ) -> AuditSession<'a> {
        AuditSession {
            orchestrator: self,
            document,
            rules,
        }
    }

    /// Audit a document against a rule source, start to finish.
    pub fn audit(
        &self,
        document: &dyn DocumentSource,
        rules: &dyn RuleSource,
    ) -> eagleeye_core::AuditReport {
        self.session(document, rules).run_to_end(|_| {})
    }

    /// Audit a record against exactly `rules`, in order.
    ///
    /// No retrieval happens: the given rules are the rule set regardless
    /// of `check_all_rules`.
    pub fn run(&self, record: FinancialRecord, rules: &[Rule]) -> eagleeye_core::AuditReport {
        let direct = Self {
            options: AuditOptions {
                check_all_rules: true,
                ..self.options
            },
            ..*self
        };
        let document = StaticDocument::from_record(DIRECT_INPUT, record);
        let given = GivenRules(rules);
        direct.audit(&document, &given)
    }

    /// Like [`audit`](Self::audit), calling `on_progress` after every step.
    pub fn run_with_progress(
        &self,
        document: &dyn DocumentSource,
        rules: &dyn RuleSource,
        on_progress: impl FnMut(&Progress),
    ) -> eagleeye_core::AuditReport {
        self.session(document, rules).run_to_end(on_progress)
    }

    /// Stream a run as one [`Progress`] snapshot per step.
    pub fn stream<'a>(
        &'a self,
        document: &'a dyn DocumentSource,
        rules: &'a dyn RuleSource,
    ) -> AuditStream<'a> {
        self.session(document, rules).stream()
    }
}

/// A fixed rule list used as-is.
struct GivenRules<'a>(&'a [Rule]);

impl RuleSource for GivenRules<'_> {
    fn all_rules(&self) -> Result<Vec<Rule>, RulebookError> {
        Ok(self.0.to_vec())
    }

    fn relevant_rules(
        &self,
        _text: &str,
        _keywords: &[String],
        _top_k: usize,
    ) -> Result<Vec<Rule>, RulebookError> {
        self.all_rules()
    }
}

// ─── Session ─────────────────────────────────────────────────────────

/// An orchestrator bound to the document and rule source of one run.
#[derive(Clone, Copy)]
pub struct AuditSession<'a> {
    orchestrator: &'a AuditOrchestrator,
    document: &'a dyn DocumentSource,
    rules: &'a dyn RuleSource,
}

impl<'a> AuditSession<'a> {
    /// A fresh run in the Parsing phase.
    pub fn start(&self) -> WorkflowState {
        let state = WorkflowState::new(uuid::Uuid::new_v4().to_string());
        tracing::info!(run_id = %state.run_id, "audit run started");
        state
    }

    /// Advance by one unit of work. A terminal state is returned unchanged.
    pub fn step(&self, mut state: WorkflowState) -> WorkflowState {
        match state.phase {
            AuditPhase::Parsing => self.parse(&mut state),
            AuditPhase::Retrieving => self.retrieve(&mut state),
            AuditPhase::Evaluating => self.evaluate_next(&mut state),
            AuditPhase::Reporting => Self::report(&mut state),
            AuditPhase::Done | AuditPhase::Failed => {}
        }
        state
    }

    pub fn stream(self) -> AuditStream<'a> {
        AuditStream {
            state: Some(self.start()),
            session: self,
            finished: false,
        }
    }

    /// Drive a fresh run to a terminal phase and return its report.
    pub fn run_to_end(&self, mut on_progress: impl FnMut(&Progress)) -> eagleeye_core::AuditReport {
        let mut state = self.start();
        while !state.is_terminal() {
            state = self.step(state);
            on_progress(&state.progress());
        }
        state.into_report()
    }

    // ─── Phases ──────────────────────────────────────────────────────

    fn parse(&self, state: &mut WorkflowState) {
        match self.document.parse() {
            Ok(mut document) => {
                if document.keywords.is_empty() && !document.raw_text.is_empty() {
                    document.keywords = extract_keywords(&document.raw_text, DEFAULT_VOCABULARY);
                }
                let reason = format!(
                    "parsed {} ({} fields, {} keywords)",
                    document.name,
                    document.record.as_ref().map_or(0, |r| r.len()),
                    document.keywords.len()
                );
                state.document = Some(document);
                state.enter(AuditPhase::Retrieving, reason);
            }
            Err(err) => state.fail(format!("document parsing failed: {err}")),
        }
    }

    fn retrieve(&self, state: &mut WorkflowState) {
        let Some(document) = state.document.as_ref() else {
            state.fail("no parsed document");
            return;
        };
        if document.record.is_none() {
            let reason = format!("no financial data extracted from {}", document.name);
            state.fail(reason);
            return;
        }

        let options = &self.orchestrator.options;
        let retrieved = if options.check_all_rules {
            self.rules.all_rules()
        } else {
            self.rules
                .relevant_rules(&document.raw_text, &document.keywords, options.top_k)
        };

        match retrieved {
            Ok(rules) => {
                let reason = if options.check_all_rules {
                    format!("{} rules (full rulebook)", rules.len())
                } else {
                    format!("{} rules (top {} by keyword)", rules.len(), options.top_k)
                };
                state.rules = rules;
                state.index = 0;
                state.enter(AuditPhase::Evaluating, reason);
            }
            Err(err) => state.fail(format!("rule retrieval failed: {err}")),
        }
    }

    fn evaluate_next(&self, state: &mut WorkflowState) {
        let Some(rule) = state.rules.get(state.index) else {
            let reason = format!("{} rules checked", state.rules_checked);
            state.enter(AuditPhase::Reporting, reason);
            return;
        };
        let Some(record) = state.document.as_ref().and_then(|d| d.record.as_ref()) else {
            state.fail("financial record missing during evaluation");
            return;
        };

        tracing::debug!(
            run_id = %state.run_id,
            rule_id = %rule.id,
            position = state.index + 1,
            total = state.rules.len(),
            "evaluating rule"
        );

        let evaluator = self.orchestrator.evaluator;
        let result = catch_unwind(AssertUnwindSafe(|| {
            let outcome = evaluator.evaluate(&rule.expression, record);
            let fault = outcome
                .error()
                .filter(|_| !outcome.is_insufficient_data())
                .map(str::to_string);
            let insufficient = outcome.is_insufficient_data();
            (Finding::from_violation(rule, outcome), fault, insufficient)
        }));

        let rule_id = rule.id.clone();
        state.index += 1;
        state.rules_checked += 1;

        match result {
            Ok((finding, fault, insufficient)) => {
                if insufficient {
                    state.insufficient += 1;
                }
                if let Some(message) = fault {
                    tracing::warn!(run_id = %state.run_id, rule_id = %rule_id, error = %message, "rule evaluation error");
                    state.faults.push(RuleFault { rule_id, message });
                } else if let Some(finding) = finding {
                    tracing::info!(
                        run_id = %state.run_id,
                        rule_id = %finding.rule_id,
                        severity = %finding.severity,
                        "violation found"
                    );
                    state.accumulator.append(finding);
                }
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(run_id = %state.run_id, rule_id = %rule_id, panic = %message, "rule evaluation panicked");
                state.faults.push(RuleFault {
                    rule_id,
                    message: format!("evaluation panicked: {message}"),
                });
            }
        }
    }

    fn report(state: &mut WorkflowState) {
        let report = state.close(RunStatus::Completed);
        let reason = format!(
            "{} violations in {} rules",
            report.total_violations, report.rules_checked
        );
        state.report = Some(report);
        state.enter(AuditPhase::Done, reason);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ─── Streaming ───────────────────────────────────────────────────────

/// Iterator over the steps of one run.
///
/// Yields a [`Progress`] after every step, the terminal one included, then
/// ends. Dropping the stream early abandons the run; [`finish`](Self::finish)
/// drives the remaining steps and returns the report.
pub struct AuditStream<'a> {
    session: AuditSession<'a>,
    state: Option<WorkflowState>,
    finished: bool,
}

impl AuditStream<'_> {
    /// The state as of the last yielded snapshot.
    pub fn state(&self) -> Option<&WorkflowState> {
        self.state.as_ref()
    }

    /// Run the remaining steps and return the report.
    pub fn finish(mut self) -> eagleeye_core::AuditReport {
        for _ in self.by_ref() {}
        match self.state.take() {
            Some(state) => state.into_report(),
            None => self.session.run_to_end(|_| {}),
        }
    }
}

impl Iterator for AuditStream<'_> {
    type Item = Progress;

    fn next(&mut self) -> Option<Progress> {
        if self.finished {
            return None;
        }
        let state = self.state.take()?;
        let state = self.session.step(state);
        self.finished = state.is_terminal();
        let progress = state.progress();
        self.state = Some(state);
        Some(progress)
    }
}
