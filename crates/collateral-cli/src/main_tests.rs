// collateral-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing, dispatch, and report output.
// Purpose: Pin exit codes and flag precedence over the config file.
// Dependencies: collateral-cli main helpers
// ============================================================================

//! ## Overview
//! Drives [`super::run`] with parsed arguments and an in-memory writer.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use clap::Parser;
use collateral_config::HarnessConfig;
use collateral_testkit::CaseOutcome;
use collateral_testkit::CaseReport;
use collateral_testkit::SuiteReport;
use serde_json::Value;

use super::Cli;
use super::CliError;
use super::EXIT_CASES_FAILED;
use super::EXIT_SUCCESS;
use super::OutputFormat;
use super::run;
use super::select_suites;
use super::write_text_reports;

// ============================================================================
// SECTION: Helpers
// ============================================================================

type TestResult = Result<(), String>;

fn invoke(args: &[&str]) -> (Result<u8, CliError>, String) {
    let mut argv = vec!["collateral-suite"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).expect("arguments parse");
    let mut out = Vec::new();
    let result = run(cli, &mut out);
    (result, String::from_utf8(out).expect("utf-8 output"))
}

fn write_config(dir: &Path, content: &str) -> String {
    let path = dir.join("collateral-harness.toml");
    fs::write(&path, content).expect("write config");
    path.display().to_string()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn run_arguments_parse_repeated_suites() {
    let cli = Cli::try_parse_from([
        "collateral-suite",
        "run",
        "--suite",
        "fiat",
        "--suite",
        "vault",
        "--format",
        "json",
    ])
    .unwrap();
    let super::Commands::Run(command) = cli.command else {
        panic!("expected run command");
    };
    assert_eq!(command.suites, vec!["fiat".to_string(), "vault".to_string()]);
    assert_eq!(command.format, OutputFormat::Json);
    assert!(command.filter.is_none());
}

#[test]
fn unknown_format_is_rejected_by_parser() {
    assert!(Cli::try_parse_from(["collateral-suite", "run", "--format", "xml"]).is_err());
}

#[test]
fn list_prints_builtin_suites() {
    let (result, output) = invoke(&["list"]);
    assert_eq!(result.unwrap(), EXIT_SUCCESS);
    assert_eq!(output, "fiat\nvault\n");
}

#[test]
fn config_example_is_valid_config() -> TestResult {
    let (result, output) = invoke(&["config", "example"]);
    assert_eq!(result.map_err(|err| err.to_string())?, EXIT_SUCCESS);
    HarnessConfig::from_toml_str(&output).map_err(|err| err.to_string())?;
    Ok(())
}

#[test]
fn config_check_reports_path_or_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[suites]\nenabled = [\"vault\"]\n");
    let (result, output) = invoke(&["config", "check", "--config", &path]);
    assert_eq!(result.unwrap(), EXIT_SUCCESS);
    assert!(output.starts_with("config ok: "));

    let path = write_config(dir.path(), "[logging]\nsink = \"file\"\n");
    let (result, _) = invoke(&["config", "check", "--config", &path]);
    assert!(matches!(result, Err(CliError::Config(_))));
}

#[test]
fn run_writes_json_report_and_events() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let config = write_config(dir.path(), "[suites]\nfilter = \"functions\"\n");
    let events = dir.path().join("events.jsonl");
    let events_arg = events.display().to_string();
    let (result, output) = invoke(&[
        "run",
        "--suite",
        "vault",
        "--config",
        &config,
        "--format",
        "json",
        "--events",
        &events_arg,
    ]);
    assert_eq!(result.map_err(|err| err.to_string())?, EXIT_SUCCESS);

    let document: Value = serde_json::from_str(&output).map_err(|err| err.to_string())?;
    assert_eq!(document["success"], true);
    let suites = document["suites"].as_array().ok_or("suites not an array")?;
    assert_eq!(suites.len(), 1);
    let cases = suites[0]["cases"].as_array().ok_or("cases not an array")?;
    assert!(!cases.is_empty());
    assert!(cases.iter().all(|case| case["group"] == "functions"));

    let lines = fs::read_to_string(&events).map_err(|err| err.to_string())?;
    assert_eq!(lines.lines().count(), 2 + 2 * cases.len());
    Ok(())
}

#[test]
fn flag_filter_overrides_config_filter() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let config = write_config(dir.path(), "[suites]\nfilter = \"functions\"\n");
    let (result, output) =
        invoke(&["run", "--suite", "fiat", "--config", &config, "--filter", "isolation"]);
    assert_eq!(result.map_err(|err| err.to_string())?, EXIT_SUCCESS);
    assert!(output.contains("PASS    isolation: "));
    assert!(!output.contains("functions: "));
    Ok(())
}

#[test]
fn unknown_suite_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    let (result, _) = invoke(&["run", "--suite", "gold", "--config", &config]);
    assert!(matches!(result, Err(CliError::Suite(_))));
}

#[test]
fn missing_explicit_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml").display().to_string();
    let (result, _) = invoke(&["run", "--config", &path]);
    assert!(matches!(result, Err(CliError::Config(_))));
}

#[test]
fn suite_selection_prefers_flags_then_config() {
    let mut config = HarnessConfig::default();
    assert_eq!(select_suites(&[], &config), vec!["fiat".to_string(), "vault".to_string()]);
    config.suites.enabled = vec![" vault ".to_string()];
    assert_eq!(select_suites(&[], &config), vec!["vault".to_string()]);
    assert_eq!(select_suites(&["fiat".to_string()], &config), vec!["fiat".to_string()]);
}

#[test]
fn text_report_shows_failure_messages_and_exit_code() {
    let mut report = SuiteReport::new("Broken (TOK)");
    report.cases.push(CaseReport {
        group: "status".to_string(),
        name: "maintains SOUND under normal conditions".to_string(),
        outcome: CaseOutcome::Failed,
        message: Some("status: expected SOUND, got IFFY".to_string()),
        duration_ms: 4,
    });
    report.cases.push(CaseReport {
        group: "rewards".to_string(),
        name: "claims rewards".to_string(),
        outcome: CaseOutcome::Pending,
        message: None,
        duration_ms: 0,
    });
    let mut out = Vec::new();
    write_text_reports(&mut out, std::slice::from_ref(&report)).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("Broken (TOK)\n"));
    assert!(text.contains(
        "  FAIL    status: maintains SOUND under normal conditions (4 ms): status: expected SOUND, got IFFY"
    ));
    assert!(text.contains("  PENDING rewards: claims rewards (0 ms)"));
    assert!(text.ends_with("  passed 0, failed 1, pending 1\n"));
    assert!(!report.is_success());
    assert_eq!(EXIT_CASES_FAILED, 1);
}
