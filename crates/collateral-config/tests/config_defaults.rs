// collateral-config/tests/config_defaults.rs
// ============================================================================
// Module: Config Defaults Tests
// Description: Default values and the canonical example.
// Purpose: Pin the shape of an empty config and keep the example loadable.
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use collateral_config::DEFAULT_GENESIS_TIMESTAMP;
use collateral_config::HarnessConfig;
use collateral_config::LogSink;
use collateral_config::config_toml_example;
use collateral_core::CollateralOpts;
use collateral_core::NumberInput;
use common::TestResult;
use common::parse;

#[test]
fn empty_document_uses_defaults() -> TestResult {
    let config = HarnessConfig::from_toml_str("").map_err(|err| err.to_string())?;
    assert_eq!(config, HarnessConfig::default());
    assert_eq!(config.fork.genesis_timestamp, DEFAULT_GENESIS_TIMESTAMP);
    assert_eq!(config.defaults, CollateralOpts::default());
    assert!(config.suites.enabled.is_empty());
    assert!(config.suites.filter.is_none());
    assert_eq!(config.logging.sink, LogSink::None);
    Ok(())
}

#[test]
fn partial_sections_fill_remaining_defaults() -> TestResult {
    let config = parse("[fork]\n\n[logging]\nsink = \"stderr\"\n")?;
    config.validate().map_err(|err| err.to_string())?;
    assert_eq!(config.fork.genesis_timestamp, DEFAULT_GENESIS_TIMESTAMP);
    assert_eq!(config.logging.sink, LogSink::Stderr);
    assert!(config.logging.path.is_none());
    Ok(())
}

#[test]
fn example_config_loads() -> TestResult {
    let config = HarnessConfig::from_toml_str(&config_toml_example()).map_err(|err| err.to_string())?;
    assert_eq!(config.suites.enabled, vec!["fiat".to_string(), "vault".to_string()]);
    assert_eq!(config.logging.sink, LogSink::File);
    assert_eq!(config.defaults.delay_until_default, Some(NumberInput::Integer(86_400)));
    assert_eq!(config.defaults.default_threshold, Some(NumberInput::Text("0.05".to_string())));
    Ok(())
}

#[test]
fn defaults_accept_integers_and_decimal_strings() -> TestResult {
    let config = parse("[defaults]\noracle_timeout = 3600\noracle_error = \"0.01\"\n")?;
    config.validate().map_err(|err| err.to_string())?;
    assert_eq!(config.defaults.oracle_timeout, Some(NumberInput::Integer(3_600)));
    assert_eq!(config.defaults.oracle_error, Some(NumberInput::Text("0.01".to_string())));
    assert!(config.defaults.revenue_hiding.is_none());
    Ok(())
}
