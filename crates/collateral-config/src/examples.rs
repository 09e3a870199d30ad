// collateral-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payloads.
// Purpose: Deterministic examples for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example `collateral-harness.toml`. The example must always
//! load cleanly; the config tests parse it.

/// Returns a canonical example `collateral-harness.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[fork]
genesis_timestamp = 1700000000

[defaults]
oracle_error = "0.0025"
oracle_timeout = 86400
max_trade_volume = 1000000
default_threshold = "0.05"
delay_until_default = 86400
revenue_hiding = "0.000001"

[suites]
enabled = ["fiat", "vault"]

[logging]
sink = "file"
path = "collateral-events.jsonl"
"#,
    )
}
