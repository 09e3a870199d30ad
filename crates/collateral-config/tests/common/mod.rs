// collateral-config/tests/common/mod.rs
// ============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Keep assertions uniform across config test suites.
// ============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use collateral_config::ConfigError;
use collateral_config::HarnessConfig;

pub type TestResult = Result<(), String>;

/// Parses TOML without validation.
pub fn parse(content: &str) -> Result<HarnessConfig, String> {
    toml::from_str(content).map_err(|err| err.to_string())
}

/// Asserts that `result` is an error whose message contains `needle`.
pub fn assert_invalid<T: std::fmt::Debug>(
    result: Result<T, ConfigError>,
    needle: &str,
) -> TestResult {
    match result {
        Ok(value) => Err(format!("expected error containing {needle:?}, got {value:?}")),
        Err(err) => {
            let message = err.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("expected error containing {needle:?}, got {message:?}"))
            }
        }
    }
}
