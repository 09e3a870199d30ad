// collateral-testkit/src/suites/mod.rs
// ============================================================================
// Module: Built-in Suites
// Description: Concrete hook bundles for the shipped collateral plugins.
// Purpose: Dispatch suite runs by name for the CLI and tests.
// Dependencies: collateral-core
// ============================================================================

//! ## Overview
//! Each built-in suite turns [`SuiteSettings`] into a hook bundle over the
//! shared fork genesis and hands it to the generic driver.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod fiat;
pub mod fork;
pub mod vault;

// ============================================================================
// SECTION: Imports
// ============================================================================

use collateral_core::CollateralOpts;
use collateral_core::Timestamp;

use crate::driver::RunOptions;
use crate::driver::SuiteError;
use crate::driver::run_collateral_suite;
use crate::events::SuiteEventSink;
use crate::report::SuiteReport;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Inputs shared by all built-in suites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteSettings {
    /// Fork genesis timestamp.
    pub genesis: Timestamp,
    /// Overrides applied to every suite's defaults table.
    pub overrides: CollateralOpts,
}

impl Default for SuiteSettings {
    fn default() -> Self {
        Self {
            genesis: Timestamp::from_secs(fork::FORK_GENESIS_SECS),
            overrides: CollateralOpts::default(),
        }
    }
}

// ============================================================================
// SECTION: Dispatch
// ============================================================================

/// Names accepted by [`run_builtin_suite`].
#[must_use]
pub const fn builtin_suite_names() -> &'static [&'static str] {
    &[fiat::NAME, vault::NAME]
}

/// Runs the built-in suite called `name`.
///
/// # Errors
///
/// Returns [`SuiteError::UnknownSuite`] for unknown names and propagates
/// setup failures.
pub fn run_builtin_suite(
    name: &str,
    settings: &SuiteSettings,
    options: &RunOptions,
    sink: &dyn SuiteEventSink,
) -> Result<SuiteReport, SuiteError> {
    match name {
        fiat::NAME => run_collateral_suite(&fiat::fixtures(settings)?, options, sink),
        vault::NAME => run_collateral_suite(&vault::fixtures(settings)?, options, sink),
        other => Err(SuiteError::UnknownSuite(other.to_string())),
    }
}
