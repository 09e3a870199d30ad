// collateral-testkit/src/lib.rs
// ============================================================================
// Module: Collateral Testkit Library
// Description: Fixture schema, generic suite driver, and built-in suites.
// Purpose: Run one common test battery against any conforming collateral.
// Dependencies: collateral-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A concrete collateral suite supplies a [`CollateralTestSuiteFixtures`]
//! hook bundle: deploy, mint, degrade, reset, and collateral-specific case
//! registration. [`collateral_tests`] registers the common battery against
//! that bundle and [`run_collateral_suite`] executes it case by case on a
//! freshly reset fork, producing a [`SuiteReport`] and JSON-lines
//! [`SuiteEvent`]s.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod driver;
pub mod events;
pub mod fixtures;
pub mod registry;
pub mod report;
pub mod suites;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use driver::RunOptions;
pub use driver::SuiteError;
pub use driver::collateral_tests;
pub use driver::run_collateral_suite;
pub use events::FileSuiteSink;
pub use events::MemorySuiteSink;
pub use events::NoopSuiteSink;
pub use events::StderrSuiteSink;
pub use events::SuiteEvent;
pub use events::SuiteEventSink;
pub use fixtures::BeforeEachRewardsFunc;
pub use fixtures::CollateralFixtureContext;
pub use fixtures::CollateralTestSuiteFixtures;
pub use fixtures::DeployCollateralFunc;
pub use fixtures::Fixture;
pub use fixtures::FixtureContext;
pub use fixtures::HookError;
pub use fixtures::MakeCollateralFixtureFunc;
pub use fixtures::MintCollateralFunc;
pub use fixtures::RefPerTokFunc;
pub use fixtures::RegisterCasesFunc;
pub use fixtures::ResetForkFunc;
pub use fixtures::TestRegistrant;
pub use registry::Case;
pub use registry::CaseBody;
pub use registry::CaseEnv;
pub use registry::CaseFailure;
pub use registry::TestCase;
pub use registry::TestGroup;
pub use registry::TestRegistry;
pub use registry::ensure;
pub use registry::ensure_eq;
pub use registry::expect_error_containing;
pub use report::CaseOutcome;
pub use report::CaseReport;
pub use report::SuiteReport;
pub use suites::SuiteSettings;
pub use suites::builtin_suite_names;
pub use suites::run_builtin_suite;
