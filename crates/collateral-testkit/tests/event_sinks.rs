// collateral-testkit/tests/event_sinks.rs
// ============================================================================
// Module: Suite Event Sink Tests
// Description: JSON-lines payloads and file sink behavior.
// ============================================================================
//! ## Overview
//! Validates the serialized shape of suite events and that the file sink
//! appends one JSON object per line.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use collateral_testkit::CaseOutcome;
use collateral_testkit::CaseReport;
use collateral_testkit::FileSuiteSink;
use collateral_testkit::RunOptions;
use collateral_testkit::SuiteEvent;
use collateral_testkit::SuiteEventSink;
use collateral_testkit::SuiteReport;
use collateral_testkit::SuiteSettings;
use collateral_testkit::run_builtin_suite;
use serde_json::Value;

type TestResult = Result<(), String>;

fn failed_case() -> CaseReport {
    CaseReport {
        group: "status".to_string(),
        name: "does not recover from IFFY".to_string(),
        outcome: CaseOutcome::Failed,
        message: Some("status: expected IFFY, got SOUND".to_string()),
        duration_ms: 3,
    }
}

#[test]
fn case_finished_carries_outcome_and_message() -> TestResult {
    let event = SuiteEvent::case_finished("fiat", &failed_case());
    let value = serde_json::to_value(&event).map_err(|err| err.to_string())?;
    assert_eq!(value["event"], "case_finished");
    assert_eq!(value["group"], "status");
    assert_eq!(value["outcome"], "failed");
    assert_eq!(value["message"], "status: expected IFFY, got SOUND");
    assert!(value.get("passed").is_none());
    Ok(())
}

#[test]
fn suite_finished_carries_counts() -> TestResult {
    let mut report = SuiteReport::new("fiat");
    report.cases.push(failed_case());
    report.cases.push(CaseReport { outcome: CaseOutcome::Pending, message: None, ..failed_case() });
    let value =
        serde_json::to_value(SuiteEvent::suite_finished(&report)).map_err(|err| err.to_string())?;
    assert_eq!(value["passed"], 0);
    assert_eq!(value["failed"], 1);
    assert_eq!(value["pending"], 1);
    assert!(value.get("case").is_none());
    assert!(!report.is_success());
    Ok(())
}

#[test]
fn file_sink_appends_json_lines() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("events.jsonl");
    {
        let sink = FileSuiteSink::new(&path).map_err(|err| err.to_string())?;
        sink.record(&SuiteEvent::suite_started("fiat"));
    }
    let sink = FileSuiteSink::new(&path).map_err(|err| err.to_string())?;
    let options = RunOptions { filter: Some("functions".to_string()) };
    let report = run_builtin_suite("fiat", &SuiteSettings::default(), &options, &sink)
        .map_err(|err| err.to_string())?;

    let contents = std::fs::read_to_string(&path).map_err(|err| err.to_string())?;
    let lines: Vec<Value> = contents
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()
        .map_err(|err| err.to_string())?;
    assert_eq!(lines.len(), 1 + 1 + 2 * report.cases.len() + 1);
    assert_eq!(lines[0]["event"], "suite_started");
    assert_eq!(lines[1]["suite"], "FiatCollateral (USDC)");
    assert!(lines.iter().all(|line| line["timestamp_ms"].is_u64()));
    Ok(())
}
