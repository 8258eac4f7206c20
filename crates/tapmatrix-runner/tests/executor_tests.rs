//! Executor tests
//!
//! Sequencing, halting and the report stream, driven by scripted strategies.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use tapmatrix_plan::StrategyKind;
use tapmatrix_runner::{
    Executor, FailureReason, HaltPolicy, RunnerConfig, StrategyError, TapReporter, TestRun,
};
use tapmatrix_test_utils::{descriptors, sample_registry, ScriptedStrategy};

fn report_lines(reporter: TapReporter<Vec<u8>>) -> Vec<String> {
    String::from_utf8(reporter.into_inner())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_third_failure_stops_after_three_invocations() {
    let strategy = Arc::new(ScriptedStrategy::passing(4).fail_at(3));
    let executor = Executor::new(strategy.clone());
    let mut reporter = TapReporter::new(Vec::new());

    let summary = executor.run(descriptors(5), &mut reporter).await;

    assert_eq!(strategy.call_count(), 3);
    assert_eq!(summary.planned, 5);
    assert_eq!(summary.passed, 2);
    assert_eq!(summary.assertions, 8);

    let lines = report_lines(reporter);
    assert_eq!(
        lines,
        vec![
            "1..5",
            r#"ok 1 - suite-1, {"primary":"db"}"#,
            r#"ok 2 - suite-2, {"primary":"db"}"#,
            r#"not ok 3 - suite-3, {"primary":"db"}"#,
            "# 1 of 1 assertions failed",
            "Result: FAIL",
        ]
    );
    assert_eq!(lines.iter().filter(|l| l.starts_with("ok ")).count(), 2);
    assert_eq!(lines.iter().filter(|l| l.starts_with("not ok ")).count(), 1);
}

#[tokio::test]
async fn test_strategy_error_is_a_failure() {
    let strategy = Arc::new(ScriptedStrategy::passing(1).error_at(1, "boom"));
    let executor = Executor::new(strategy.clone());
    let mut reporter = TapReporter::new(Vec::new());

    let summary = executor.run(descriptors(3), &mut reporter).await;

    assert_eq!(strategy.call_count(), 1);
    let failure = summary.failure.as_ref().unwrap();
    assert_eq!(failure.number, 1);
    assert_eq!(failure.descriptor.suite(), "suite-1");
    assert!(matches!(
        failure.reason,
        FailureReason::Error(StrategyError::Suite { .. })
    ));
    assert_eq!(summary.exit_code(HaltPolicy::ExitProcess), 1);
    assert_eq!(summary.exit_code(HaltPolicy::StopAdvancing), 0);

    let lines = report_lines(reporter);
    assert_eq!(lines.last().map(String::as_str), Some("Result: FAIL"));
    assert!(lines.iter().any(|l| l.contains("boom")));
}

#[tokio::test]
async fn test_passing_run_reports_assertion_total() {
    let strategy = Arc::new(ScriptedStrategy::passing(3));
    let executor = Executor::new(strategy);
    let mut reporter = TapReporter::new(Vec::new());

    let summary = executor.run(descriptors(4), &mut reporter).await;

    assert!(summary.passed());
    assert_eq!(summary.exit_code(HaltPolicy::ExitProcess), 0);
    let lines = report_lines(reporter);
    assert_eq!(
        &lines[lines.len() - 2..],
        &["# ran 12 assertions".to_string(), "Result: PASS".to_string()]
    );
}

#[tokio::test]
async fn test_descriptors_run_in_plan_order() {
    let config = RunnerConfig::new().with_registry(sample_registry());
    let strategy = Arc::new(ScriptedStrategy::passing(1));
    let run = TestRun::with_strategy(&config, strategy.clone());
    let planned = run.plan().to_vec();

    let summary = run.execute(&mut TapReporter::new(Vec::new())).await;

    assert!(summary.passed());
    assert_eq!(strategy.calls(), planned);
    let suites: Vec<String> = planned.iter().map(|d| d.suite().to_string()).collect();
    assert_eq!(
        suites,
        vec!["first", "single", "single", "http", "server", "pair", "pair", "pair", "pair"]
    );
}

#[tokio::test]
async fn test_plan_follows_strategy_kind() {
    let config = RunnerConfig::new().with_registry(sample_registry());
    let sandboxed = Arc::new(ScriptedStrategy::passing(1).with_kind(StrategyKind::Sandboxed));

    let run = TestRun::with_strategy(&config, sandboxed);

    assert_eq!(run.plan().len(), 8);
    assert!(run.plan().iter().all(|d| d.suite() != "server"));
}

#[tokio::test]
async fn test_sandboxed_strategy_gets_sandboxed_defaults() {
    let config = RunnerConfig::new().with_registry(sample_registry());
    let sandboxed = Arc::new(ScriptedStrategy::passing(1).with_kind(StrategyKind::Sandboxed));

    let run = TestRun::with_strategy(&config, sandboxed);

    let http = run.plan().iter().find(|d| d.suite() == "http").unwrap();
    assert_eq!(
        http.primary().map(|e| e.as_str()),
        Some("http://localhost:2020/test_suite_db1")
    );
    assert_eq!(run.halt_policy(), HaltPolicy::StopAdvancing);
}
