//! Audit runs end to end: phases, fault isolation, failure paths.

use eagleeye_core::{
    FieldValue, FinancialRecord, Priority, Rule, RuleCategory, RunStatus, Severity,
};
use eagleeye_rules::{RuleSource, Rulebook, RulebookError};
use eagleeye_state::{
    AuditOptions, AuditOrchestrator, AuditPhase, DocumentSource, ParsedDocument, SourceError,
    StaticDocument,
};

fn make_rule(id: &str, priority: Priority, expression: &str) -> Rule {
    Rule {
        id: id.to_string(),
        category: match &id[..2] {
            "CL" => RuleCategory::CrossLedger,
            "FM" => RuleCategory::FinancialManipulation,
            "LC" => RuleCategory::LegalCompliance,
            _ => RuleCategory::OperationalRisk,
        },
        subject: format!("subject of {id}"),
        trigger_keywords: vec![],
        expression: expression.to_string(),
        priority,
        description: format!("description of {id}"),
        source: String::new(),
        linked_rules: vec![],
        procedures: vec!["step one".to_string()],
    }
}

fn make_record() -> FinancialRecord {
    FinancialRecord::new()
        .with("货币资金", 1.2e9)
        .with("总资产", 3.0e9)
        .with("有息债务", 9.0e8)
        .with("应收账款", 5.0e8)
        .with("营业收入", 8.0e8)
        .with("审计意见", "保留意见")
}

fn make_rules() -> Vec<Rule> {
    vec![
        make_rule("FM-003", Priority::Critical, "(货币资金 / 总资产 > 0.3) AND (有息债务 / 总资产 > 0.25)"),
        make_rule("CL-001", Priority::High, "应收账款 / 营业收入 > 0.5"),
        make_rule("LC-001", Priority::Medium, "审计意见 包含 ['保留意见', '无法表示意见']"),
        make_rule("OP-001", Priority::Low, "货币资金 < 0"),
        make_rule("OP-002", Priority::High, "存货 / 总资产 > 0.4"),
    ]
}

struct FailingSource;

impl DocumentSource for FailingSource {
    fn parse(&self) -> Result<ParsedDocument, SourceError> {
        Err(SourceError::Unavailable("ocr backend offline".to_string()))
    }
}

struct BrokenRules;

impl RuleSource for BrokenRules {
    fn all_rules(&self) -> Result<Vec<Rule>, RulebookError> {
        Err(RulebookError::Unavailable("index not built".to_string()))
    }

    fn relevant_rules(&self, _: &str, _: &[String], _: usize) -> Result<Vec<Rule>, RulebookError> {
        self.all_rules()
    }
}

// ─── Batch ───────────────────────────────────────────────────────────

#[test]
fn batch_run_collects_findings_in_rule_order() {
    let report = AuditOrchestrator::default().run(make_record(), &make_rules());

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.rules_checked, 5);
    let ids: Vec<&str> = report.findings.iter().map(|f| f.rule_id.as_str()).collect();
    assert_eq!(ids, vec!["FM-003", "CL-001", "LC-001"]);
    assert_eq!(report.severity.critical, 1);
    assert_eq!(report.severity.high, 1);
    assert_eq!(report.severity.medium, 1);
    assert_eq!(report.severity.low, 0);
    assert_eq!(report.by_category.get(&RuleCategory::CrossLedger), Some(&1));
    assert!(report.has_critical());
    assert_eq!(report.subject, "direct input");
}

#[test]
fn finding_carries_rule_and_evidence() {
    let report = AuditOrchestrator::default().run(make_record(), &make_rules());
    let finding = &report.findings[1];
    assert_eq!(finding.severity, Severity::High);
    assert_eq!(finding.expression, "应收账款 / 营业收入 > 0.5");
    assert_eq!(finding.evidence.get("应收账款"), Some(&FieldValue::Number(5.0e8)));
    assert_eq!(finding.calculated_value, Some(0.625));
    assert_eq!(finding.threshold_value, Some(0.5));
    assert_eq!(finding.procedures, vec!["step one"]);
}

#[test]
fn malformed_rule_is_absorbed() {
    let mut rules = make_rules();
    rules.insert(1, make_rule("FM-999", Priority::Critical, "货币资金 > > 1"));
    rules.insert(3, make_rule("FM-998", Priority::Critical, "__import__('os')"));

    let orchestrator = AuditOrchestrator::default();
    let document = StaticDocument::from_record("report.pdf", make_record());
    let book = Rulebook::from_rules(rules.clone());
    let mut session_state = orchestrator.session(&document, &book).start();
    while !session_state.is_terminal() {
        session_state = orchestrator.session(&document, &book).step(session_state);
    }

    assert_eq!(session_state.phase(), AuditPhase::Done);
    assert_eq!(session_state.rules_checked(), rules.len());
    assert_eq!(session_state.error_count(), 2);
    assert_eq!(session_state.insufficient_data_count(), 1);
    let faulted: Vec<&str> = session_state.faults().iter().map(|f| f.rule_id.as_str()).collect();
    assert_eq!(faulted, vec!["FM-999", "FM-998"]);

    let report = session_state.into_report();
    assert_eq!(report.status, RunStatus::Completed);
    let ids: Vec<&str> = report.findings.iter().map(|f| f.rule_id.as_str()).collect();
    assert_eq!(ids, vec!["FM-003", "CL-001", "LC-001"]);
}

#[test]
fn empty_rule_set_completes_without_findings() {
    let report = AuditOrchestrator::default().run(make_record(), &[]);
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.rules_checked, 0);
    assert!(report.findings.is_empty());
}

// ─── Phases ──────────────────────────────────────────────────────────

#[test]
fn transition_log_follows_the_phase_graph() {
    let orchestrator = AuditOrchestrator::default();
    let document = StaticDocument::from_record("doc", make_record());
    let book = Rulebook::from_rules(make_rules());
    let session = orchestrator.session(&document, &book);

    let mut state = session.start();
    assert_eq!(state.phase(), AuditPhase::Parsing);
    assert!(state.transitions().is_empty());
    while state.should_continue() {
        state = session.step(state);
    }

    let path: Vec<(AuditPhase, AuditPhase)> =
        state.transitions().iter().map(|t| (t.from, t.to)).collect();
    assert_eq!(
        path,
        vec![
            (AuditPhase::Parsing, AuditPhase::Retrieving),
            (AuditPhase::Retrieving, AuditPhase::Evaluating),
            (AuditPhase::Evaluating, AuditPhase::Reporting),
            (AuditPhase::Reporting, AuditPhase::Done),
        ]
    );
    assert!(state.report().is_some());
}

#[test]
fn one_rule_per_step() {
    let orchestrator = AuditOrchestrator::default();
    let document = StaticDocument::from_record("doc", make_record());
    let book = Rulebook::from_rules(make_rules());
    let session = orchestrator.session(&document, &book);

    let mut state = session.step(session.step(session.start()));
    assert_eq!(state.phase(), AuditPhase::Evaluating);
    for expected in 1..=5 {
        state = session.step(state);
        assert_eq!(state.rules_checked(), expected);
        assert_eq!(state.current_index(), expected);
        assert_eq!(state.phase(), AuditPhase::Evaluating);
    }
    state = session.step(state);
    assert_eq!(state.phase(), AuditPhase::Reporting);
}

#[test]
fn violation_count_tracks_findings_at_every_step() {
    let orchestrator = AuditOrchestrator::default();
    let document = StaticDocument::from_record("doc", make_record());
    let book = Rulebook::from_rules(make_rules());
    let session = orchestrator.session(&document, &book);

    let mut state = session.start();
    while !state.is_terminal() {
        state = session.step(state);
        let progress = state.progress();
        assert_eq!(progress.total_violations, state.findings().len());
        assert_eq!(progress.total_violations, state.total_violations());
        assert_eq!(progress.severity.total(), progress.total_violations);
    }
    // FM-003, CL-001 and LC-001 fire; OP-001 holds; OP-002 lacks 存货.
    assert_eq!(state.total_violations(), 3);
    assert_eq!(state.severity_counts().total(), 3);
}

#[test]
fn step_on_terminal_state_is_a_no_op() {
    let orchestrator = AuditOrchestrator::default();
    let document = StaticDocument::from_record("doc", make_record());
    let book = Rulebook::from_rules(make_rules());
    let session = orchestrator.session(&document, &book);

    let mut state = session.start();
    while !state.is_terminal() {
        state = session.step(state);
    }
    let transitions = state.transitions().len();
    let findings = state.findings().len();

    let state = session.step(session.step(state));
    assert_eq!(state.phase(), AuditPhase::Done);
    assert_eq!(state.transitions().len(), transitions);
    assert_eq!(state.findings().len(), findings);
}

#[test]
fn abandoned_run_yields_partial_failed_report() {
    let orchestrator = AuditOrchestrator::default();
    let document = StaticDocument::from_record("doc", make_record());
    let book = Rulebook::from_rules(make_rules());
    let session = orchestrator.session(&document, &book);

    let mut state = session.start();
    for _ in 0..3 {
        state = session.step(state);
    }
    // Parsing, Retrieving, then the first rule.
    assert_eq!(state.rules_checked(), 1);

    let report = state.into_report();
    assert_eq!(report.rules_checked, 1);
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.failure_reason(), Some("audit stopped during EVALUATING"));
}

// ─── Failure paths ───────────────────────────────────────────────────

#[test]
fn source_error_fails_the_run() {
    let report = AuditOrchestrator::default().audit(&FailingSource, &Rulebook::from_rules(make_rules()));
    assert!(report.status.is_failed());
    assert!(report.failure_reason().unwrap().contains("ocr backend offline"));
    assert_eq!(report.rules_checked, 0);
}

#[test]
fn document_without_record_fails_before_evaluation() {
    let document = StaticDocument::new(ParsedDocument::new("scan.pdf").with_text("仅有文字"));
    let orchestrator = AuditOrchestrator::default();
    let book = Rulebook::from_rules(make_rules());
    let session = orchestrator.session(&document, &book);

    let mut state = session.start();
    while !state.is_terminal() {
        state = session.step(state);
    }
    assert_eq!(state.phase(), AuditPhase::Failed);
    assert!(state.error().unwrap().contains("no financial data"));
    let last = state.transitions().last().unwrap();
    assert_eq!((last.from, last.to), (AuditPhase::Retrieving, AuditPhase::Failed));

    let report = state.into_report();
    assert_eq!(report.subject, "scan.pdf");
    assert!(report.status.is_failed());
}

#[test]
fn retrieval_error_fails_the_run() {
    let document = StaticDocument::from_record("doc", make_record());
    let report = AuditOrchestrator::default().audit(&document, &BrokenRules);
    assert!(report.failure_reason().unwrap().starts_with("rule retrieval failed"));
}

// ─── Retrieval mode ──────────────────────────────────────────────────

#[test]
fn keyword_mode_evaluates_only_relevant_rules() {
    let mut rules = make_rules();
    rules[0].trigger_keywords = vec!["有息债务".to_string()];
    rules[2].trigger_keywords = vec!["审计意见".to_string()];
    let book = Rulebook::from_rules(rules);

    let document = StaticDocument::new(
        ParsedDocument::new("annual.pdf")
            .with_record(make_record())
            .with_text("公司有息债务规模较大。"),
    );
    let orchestrator = AuditOrchestrator::new(AuditOptions {
        check_all_rules: false,
        top_k: 10,
    });
    let report = orchestrator.audit(&document, &book);

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.rules_checked, 1);
    assert_eq!(report.findings[0].rule_id, "FM-003");
}

#[test]
fn direct_run_ignores_keyword_mode() {
    let orchestrator = AuditOrchestrator::new(AuditOptions {
        check_all_rules: false,
        top_k: 1,
    });
    let report = orchestrator.run(make_record(), &make_rules());
    assert_eq!(report.rules_checked, 5);
}
