// collateral-testkit/src/report.rs
// ============================================================================
// Module: Suite Reports
// Description: Per-case outcomes and suite summaries.
// Purpose: Give the CLI and tests a serializable record of a suite run.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`SuiteReport`] lists every registered case in registration order with
//! its outcome. Pending cases are reported, not dropped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Case outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseOutcome {
    /// Body returned `Ok`.
    Passed,
    /// Setup or body failed.
    Failed,
    /// Registered as pending.
    Pending,
}

impl CaseOutcome {
    /// Returns the lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Pending => "pending",
        }
    }
}

/// Result of one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseReport {
    /// Group name.
    pub group: String,
    /// Case name.
    pub name: String,
    /// Outcome.
    pub outcome: CaseOutcome,
    /// Failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl CaseReport {
    /// Returns `group: name`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}: {}", self.group, self.name)
    }
}

// ============================================================================
// SECTION: Suite Report
// ============================================================================

/// Result of one suite run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Suite display name.
    pub suite: String,
    /// Case results in registration order.
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new(suite: impl Into<String>) -> Self {
        Self { suite: suite.into(), cases: Vec::new() }
    }

    /// Counts cases with `outcome`.
    #[must_use]
    pub fn count(&self, outcome: CaseOutcome) -> usize {
        self.cases.iter().filter(|case| case.outcome == outcome).count()
    }

    /// Number of passed cases.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(CaseOutcome::Passed)
    }

    /// Number of failed cases.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(CaseOutcome::Failed)
    }

    /// Number of pending cases.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.count(CaseOutcome::Pending)
    }

    /// Returns true when no case failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Returns the report for `full_name` (`group: name`).
    #[must_use]
    pub fn case(&self, full_name: &str) -> Option<&CaseReport> {
        self.cases.iter().find(|case| case.full_name() == full_name)
    }
}
