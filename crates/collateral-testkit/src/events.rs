// collateral-testkit/src/events.rs
// ============================================================================
// Module: Suite Event Logging
// Description: Structured events for suite runs.
// Purpose: Emit JSON-lines progress logs without hard dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The driver emits one event when a suite starts, one per case start and
//! finish, and one summary when the suite ends. Sinks decide where the
//! JSON lines go: stderr, an append-only file, memory (for tests), or
//! nowhere.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::report::CaseOutcome;
use crate::report::CaseReport;
use crate::report::SuiteReport;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Suite event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Suite display name.
    pub suite: String,
    /// Group name for case events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Case name for case events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case: Option<String>,
    /// Case outcome for `case_finished`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<CaseOutcome>,
    /// Failure message for failed cases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Passed count for `suite_finished`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<usize>,
    /// Failed count for `suite_finished`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<usize>,
    /// Pending count for `suite_finished`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<usize>,
}

/// Milliseconds since the unix epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

impl SuiteEvent {
    /// Builds an event with only the common fields set.
    fn bare(event: &'static str, suite: &str) -> Self {
        Self {
            event,
            timestamp_ms: now_ms(),
            suite: suite.to_string(),
            group: None,
            case: None,
            outcome: None,
            message: None,
            passed: None,
            failed: None,
            pending: None,
        }
    }

    /// Suite start.
    #[must_use]
    pub fn suite_started(suite: &str) -> Self {
        Self::bare("suite_started", suite)
    }

    /// Case start.
    #[must_use]
    pub fn case_started(suite: &str, group: &str, case: &str) -> Self {
        Self { group: Some(group.to_string()), case: Some(case.to_string()), ..Self::bare("case_started", suite) }
    }

    /// Case finish.
    #[must_use]
    pub fn case_finished(suite: &str, report: &CaseReport) -> Self {
        Self {
            group: Some(report.group.clone()),
            case: Some(report.name.clone()),
            outcome: Some(report.outcome),
            message: report.message.clone(),
            ..Self::bare("case_finished", suite)
        }
    }

    /// Suite summary.
    #[must_use]
    pub fn suite_finished(report: &SuiteReport) -> Self {
        Self {
            passed: Some(report.passed()),
            failed: Some(report.failed()),
            pending: Some(report.pending()),
            ..Self::bare("suite_finished", &report.suite)
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Suite event sink.
pub trait SuiteEventSink: Send + Sync {
    /// Record an event.
    fn record(&self, event: &SuiteEvent);
}

/// Sink that logs JSON lines to stderr.
pub struct StderrSuiteSink;

impl SuiteEventSink for StderrSuiteSink {
    fn record(&self, event: &SuiteEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Sink that appends JSON lines to a file.
pub struct FileSuiteSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileSuiteSink {
    /// Opens `path` for appending, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns [`io::Error`] when the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file: Mutex::new(file) })
    }
}

impl SuiteEventSink for FileSuiteSink {
    fn record(&self, event: &SuiteEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Sink that drops every event.
pub struct NoopSuiteSink;

impl SuiteEventSink for NoopSuiteSink {
    fn record(&self, _event: &SuiteEvent) {}
}

/// Sink that keeps events in memory.
#[derive(Default)]
pub struct MemorySuiteSink {
    /// Recorded events.
    events: Mutex<Vec<SuiteEvent>>,
}

impl MemorySuiteSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<SuiteEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl SuiteEventSink for MemorySuiteSink {
    fn record(&self, event: &SuiteEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
