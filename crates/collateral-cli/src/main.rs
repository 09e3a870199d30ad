// collateral-cli/src/main.rs
// ============================================================================
// Module: Collateral Suite CLI Entry Point
// Description: Command dispatcher for listing and running collateral suites.
// Purpose: Run the common collateral battery from the command line.
// Dependencies: clap, collateral-config, collateral-core, collateral-testkit, serde, thiserror.
// ============================================================================

//! ## Overview
//! `collateral-suite` lists the built-in collateral suites, runs them against
//! a freshly seeded fork, and validates or prints harness configuration.
//! Command-line flags take precedence over the config file. The process exits
//! with `0` when every runnable case passed, `1` when any case failed, and
//! `2` when the command could not run.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use collateral_config::CONFIG_ENV_VAR;
use collateral_config::HarnessConfig;
use collateral_config::LogSink;
use collateral_config::config_toml_example;
use collateral_config::resolve_config_path;
use collateral_core::Timestamp;
use collateral_testkit::CaseOutcome;
use collateral_testkit::FileSuiteSink;
use collateral_testkit::NoopSuiteSink;
use collateral_testkit::RunOptions;
use collateral_testkit::StderrSuiteSink;
use collateral_testkit::SuiteEventSink;
use collateral_testkit::SuiteReport;
use collateral_testkit::SuiteSettings;
use collateral_testkit::builtin_suite_names;
use collateral_testkit::run_builtin_suite;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Exit Codes
// ============================================================================

/// Exit code when every runnable case passed.
const EXIT_SUCCESS: u8 = 0;
/// Exit code when at least one case failed.
const EXIT_CASES_FAILED: u8 = 1;
/// Exit code when the command itself could not run.
const EXIT_ERROR: u8 = 2;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "collateral-suite", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List the built-in collateral suites.
    List,
    /// Run one or more collateral suites.
    Run(RunCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for `run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// Suite to run; repeat for several. Defaults to the configured set.
    #[arg(long = "suite", value_name = "NAME")]
    suites: Vec<String>,
    /// Harness configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Only run cases whose `group: case` name contains this text.
    #[arg(long, value_name = "TEXT")]
    filter: Option<String>,
    /// Report format written to stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Append suite events as JSON lines to this file.
    #[arg(long, value_name = "PATH")]
    events: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a harness configuration file.
    Check(ConfigCheckCommand),
    /// Print an example harness configuration.
    Example,
}

/// Arguments for `config check`.
#[derive(Args, Debug)]
struct ConfigCheckCommand {
    /// Harness configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Report output formats.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// One line per case plus a summary per suite.
    Text,
    /// A single JSON document.
    Json,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI errors; every variant exits with [`EXIT_ERROR`].
#[derive(Debug, Error)]
enum CliError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] collateral_config::ConfigError),
    /// A suite could not be set up.
    #[error(transparent)]
    Suite(#[from] collateral_testkit::SuiteError),
    /// The event log could not be opened.
    #[error("failed to open event log {path}: {error}")]
    EventLog {
        /// Event log path.
        path: String,
        /// Underlying I/O error.
        error: std::io::Error,
    },
    /// Report serialization failed.
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
    /// Writing to stdout failed.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut stdout = std::io::stdout().lock();
    match run(cli, &mut stdout) {
        Ok(code) => ExitCode::from(code),
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run(cli: Cli, out: &mut impl Write) -> CliResult<u8> {
    match cli.command {
        Commands::List => command_list(out),
        Commands::Run(command) => command_run(&command, out),
        Commands::Config {
            command,
        } => command_config(&command, out),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Prints the built-in suite names, one per line.
fn command_list(out: &mut impl Write) -> CliResult<u8> {
    for name in builtin_suite_names() {
        writeln!(out, "{name}")?;
    }
    Ok(EXIT_SUCCESS)
}

/// Runs the selected suites and writes their reports.
fn command_run(command: &RunCommand, out: &mut impl Write) -> CliResult<u8> {
    let config = load_run_config(command.config.as_deref())?;
    let settings = SuiteSettings {
        genesis: Timestamp::from_secs(config.fork.genesis_timestamp),
        overrides: config.defaults.clone(),
    };
    let options = RunOptions {
        filter: command.filter.clone().or_else(|| config.suites.filter.clone()),
    };
    let sink = build_sink(&config, command.events.as_deref())?;
    let names = select_suites(&command.suites, &config);

    let mut reports = Vec::with_capacity(names.len());
    for name in &names {
        reports.push(run_builtin_suite(name, &settings, &options, sink.as_ref())?);
    }

    match command.format {
        OutputFormat::Text => write_text_reports(out, &reports)?,
        OutputFormat::Json => write_json_reports(out, &reports)?,
    }
    if reports.iter().all(SuiteReport::is_success) {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_CASES_FAILED)
    }
}

/// Dispatches config subcommands.
fn command_config(command: &ConfigCommand, out: &mut impl Write) -> CliResult<u8> {
    match command {
        ConfigCommand::Check(command) => {
            let path = resolve_config_path(command.config.as_deref())?;
            HarnessConfig::load(Some(&path))?;
            writeln!(out, "config ok: {}", path.display())?;
        }
        ConfigCommand::Example => {
            out.write_all(config_toml_example().as_bytes())?;
        }
    }
    Ok(EXIT_SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads configuration for `run`.
///
/// A missing default file yields the built-in defaults; an explicit or
/// environment-provided path must exist.
fn load_run_config(path: Option<&Path>) -> CliResult<HarnessConfig> {
    let resolved = resolve_config_path(path)?;
    let implicit = path.is_none() && std::env::var_os(CONFIG_ENV_VAR).is_none();
    if implicit && !resolved.exists() {
        return Ok(HarnessConfig::default());
    }
    Ok(HarnessConfig::load(Some(&resolved))?)
}

/// Picks suites from the flags, then the config, then every built-in suite.
fn select_suites(flags: &[String], config: &HarnessConfig) -> Vec<String> {
    if !flags.is_empty() {
        return flags.to_vec();
    }
    if !config.suites.enabled.is_empty() {
        return config.suites.enabled.iter().map(|name| name.trim().to_string()).collect();
    }
    builtin_suite_names().iter().map(|name| (*name).to_string()).collect()
}

/// Builds the event sink; `--events` overrides the configured sink.
fn build_sink(config: &HarnessConfig, events: Option<&Path>) -> CliResult<Box<dyn SuiteEventSink>> {
    if let Some(path) = events {
        return Ok(Box::new(open_file_sink(path)?));
    }
    match (config.logging.sink, config.logging.path.as_deref()) {
        (LogSink::Stderr, _) => Ok(Box::new(StderrSuiteSink)),
        (LogSink::File, Some(path)) => Ok(Box::new(open_file_sink(Path::new(path.trim()))?)),
        (LogSink::File, None) | (LogSink::None, _) => Ok(Box::new(NoopSuiteSink)),
    }
}

/// Opens an appending JSON-lines sink.
fn open_file_sink(path: &Path) -> CliResult<FileSuiteSink> {
    FileSuiteSink::new(path).map_err(|error| CliError::EventLog {
        path: path.display().to_string(),
        error,
    })
}

/// Writes one line per case and a summary per suite.
fn write_text_reports(out: &mut impl Write, reports: &[SuiteReport]) -> CliResult<()> {
    for report in reports {
        writeln!(out, "{}", report.suite)?;
        for case in &report.cases {
            let label = match case.outcome {
                CaseOutcome::Passed => "PASS",
                CaseOutcome::Failed => "FAIL",
                CaseOutcome::Pending => "PENDING",
            };
            match &case.message {
                Some(message) if case.outcome == CaseOutcome::Failed => writeln!(
                    out,
                    "  {label:<7} {} ({} ms): {message}",
                    case.full_name(),
                    case.duration_ms
                )?,
                _ => writeln!(out, "  {label:<7} {} ({} ms)", case.full_name(), case.duration_ms)?,
            }
        }
        writeln!(
            out,
            "  passed {}, failed {}, pending {}",
            report.passed(),
            report.failed(),
            report.pending()
        )?;
    }
    Ok(())
}

/// JSON document written by `run --format json`.
#[derive(Serialize)]
struct RunOutput<'a> {
    /// True when no case failed.
    success: bool,
    /// Per-suite reports in run order.
    suites: &'a [SuiteReport],
}

/// Writes every report as one pretty-printed JSON document.
fn write_json_reports(out: &mut impl Write, reports: &[SuiteReport]) -> CliResult<()> {
    let output = RunOutput {
        success: reports.iter().all(SuiteReport::is_success),
        suites: reports,
    };
    serde_json::to_writer_pretty(&mut *out, &output)?;
    writeln!(out)?;
    Ok(())
}

/// Emits an error message to stderr and returns the error exit code.
fn emit_error(message: &str) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "collateral-suite: {message}");
    ExitCode::from(EXIT_ERROR)
}
