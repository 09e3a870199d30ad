// collateral-core/src/core/opts.rs
// ============================================================================
// Module: Collateral Deployment Options
// Description: Optional deployment parameters and their resolved configuration.
// Purpose: Merge caller overrides with one defaults table before deployment.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! [`CollateralOpts`] mirrors the constructor arguments of a collateral
//! plugin with every field optional. An omitted field means "use the suite
//! default". [`CollateralOpts::resolve`] merges the overrides onto a
//! [`CollateralConfig`] defaults table and rejects structurally invalid
//! input. Range checks are left to plugin constructors so their messages
//! surface unchanged.
//!
//! Numeric fields accept a [`NumberInput`]: either an integer of whole units
//! or seconds, or a decimal string such as `"0.05"`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::fixed::Fix;
use crate::core::identifiers::Address;
use crate::core::identifiers::TargetName;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Longest allowed delay between IFFY and DISABLED (two weeks).
pub const MAX_DELAY_UNTIL_DEFAULT_SECS: u64 = 1_209_600;
/// Default price decay window (one week).
pub const DEFAULT_PRICE_TIMEOUT_SECS: u64 = 604_800;
/// Default oracle staleness window (one day).
pub const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 86_400;
/// Default IFFY to DISABLED delay (one day).
pub const DEFAULT_DELAY_UNTIL_DEFAULT_SECS: u64 = 86_400;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Option resolution errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptsError {
    /// A supplied field is structurally invalid.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Field name as written in the options.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },
}

/// Builds an [`OptsError::InvalidField`].
fn invalid(field: &'static str, reason: impl fmt::Display) -> OptsError {
    OptsError::InvalidField { field, reason: reason.to_string() }
}

// ============================================================================
// SECTION: Number Input
// ============================================================================

/// Numeric option value: whole integer or decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberInput {
    /// Whole units or seconds.
    Integer(u64),
    /// Decimal text, e.g. `"0.0025"` or `"86400"`.
    Text(String),
}

impl NumberInput {
    /// Interprets the input as a fixed-point quantity.
    ///
    /// # Errors
    ///
    /// Returns [`OptsError`] when the text is not a valid decimal.
    pub fn to_fix(&self, field: &'static str) -> Result<Fix, OptsError> {
        match self {
            Self::Integer(value) => Ok(Fix::from_int(*value)),
            Self::Text(text) => Fix::parse_decimal(text).map_err(|err| invalid(field, err)),
        }
    }

    /// Interprets the input as whole seconds.
    ///
    /// # Errors
    ///
    /// Returns [`OptsError`] when the value is fractional, negative, or too large.
    pub fn to_seconds(&self, field: &'static str) -> Result<u64, OptsError> {
        match self {
            Self::Integer(value) => Ok(*value),
            Self::Text(text) => {
                let value = Fix::parse_decimal(text).map_err(|err| invalid(field, err))?;
                if value.raw() % Fix::ONE.raw() != 0 {
                    return Err(invalid(field, format!("expected whole seconds, got {text}")));
                }
                u64::try_from(value.raw() / Fix::ONE.raw())
                    .map_err(|_| invalid(field, format!("seconds out of range: {text}")))
            }
        }
    }
}

impl From<u64> for NumberInput {
    fn from(value: u64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for NumberInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for NumberInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Fix> for NumberInput {
    fn from(value: Fix) -> Self {
        Self::Text(value.to_string())
    }
}

// ============================================================================
// SECTION: Options
// ============================================================================

/// Optional collateral deployment parameters.
///
/// # Invariants
/// - `None` means "use the default" for that field.
/// - Address fields are validated only when resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollateralOpts {
    /// Collateral token address.
    pub erc20: Option<String>,
    /// Unit of account, e.g. `USD`.
    pub target_name: Option<String>,
    /// Reward token address.
    pub reward_erc20: Option<String>,
    /// Seconds over which a saved price decays once the oracle is stale.
    pub price_timeout: Option<NumberInput>,
    /// Price feed address.
    pub chainlink_feed: Option<String>,
    /// Relative oracle error as a fraction.
    pub oracle_error: Option<NumberInput>,
    /// Seconds before a feed answer is stale.
    pub oracle_timeout: Option<NumberInput>,
    /// Maximum trade volume in units of account.
    pub max_trade_volume: Option<NumberInput>,
    /// Allowed peg deviation as a fraction.
    pub default_threshold: Option<NumberInput>,
    /// Seconds between IFFY and DISABLED.
    pub delay_until_default: Option<NumberInput>,
    /// Fraction of reference-rate growth hidden from the exposed rate.
    pub revenue_hiding: Option<NumberInput>,
}

impl CollateralOpts {
    /// Merges these overrides onto `defaults`.
    ///
    /// # Errors
    ///
    /// Returns [`OptsError`] when a supplied field cannot be parsed.
    pub fn resolve(&self, defaults: &CollateralConfig) -> Result<CollateralConfig, OptsError> {
        Ok(CollateralConfig {
            erc20: resolve_address("erc20", self.erc20.as_deref(), defaults.erc20)?,
            target_name: match &self.target_name {
                Some(name) => {
                    TargetName::new(name.clone()).map_err(|err| invalid("target_name", err))?
                }
                None => defaults.target_name.clone(),
            },
            reward_erc20: resolve_address(
                "reward_erc20",
                self.reward_erc20.as_deref(),
                defaults.reward_erc20,
            )?,
            price_timeout: resolve_seconds(
                "price_timeout",
                self.price_timeout.as_ref(),
                defaults.price_timeout,
            )?,
            chainlink_feed: resolve_address(
                "chainlink_feed",
                self.chainlink_feed.as_deref(),
                defaults.chainlink_feed,
            )?,
            oracle_error: resolve_fix(
                "oracle_error",
                self.oracle_error.as_ref(),
                defaults.oracle_error,
            )?,
            oracle_timeout: resolve_seconds(
                "oracle_timeout",
                self.oracle_timeout.as_ref(),
                defaults.oracle_timeout,
            )?,
            max_trade_volume: resolve_fix(
                "max_trade_volume",
                self.max_trade_volume.as_ref(),
                defaults.max_trade_volume,
            )?,
            default_threshold: resolve_fix(
                "default_threshold",
                self.default_threshold.as_ref(),
                defaults.default_threshold,
            )?,
            delay_until_default: resolve_seconds(
                "delay_until_default",
                self.delay_until_default.as_ref(),
                defaults.delay_until_default,
            )?,
            revenue_hiding: resolve_fix(
                "revenue_hiding",
                self.revenue_hiding.as_ref(),
                defaults.revenue_hiding,
            )?,
        })
    }
}

/// Parses an optional address override.
fn resolve_address(
    field: &'static str,
    value: Option<&str>,
    default: Address,
) -> Result<Address, OptsError> {
    value.map_or(Ok(default), |text| Address::parse(text).map_err(|err| invalid(field, err)))
}

/// Parses an optional fixed-point override.
fn resolve_fix(
    field: &'static str,
    value: Option<&NumberInput>,
    default: Fix,
) -> Result<Fix, OptsError> {
    value.map_or(Ok(default), |input| input.to_fix(field))
}

/// Parses an optional seconds override.
fn resolve_seconds(
    field: &'static str,
    value: Option<&NumberInput>,
    default: u64,
) -> Result<u64, OptsError> {
    value.map_or(Ok(default), |input| input.to_seconds(field))
}

// ============================================================================
// SECTION: Resolved Configuration
// ============================================================================

/// Fully resolved collateral constructor arguments.
///
/// Also serves as the defaults table a suite resolves options against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralConfig {
    /// Collateral token address.
    pub erc20: Address,
    /// Unit of account.
    pub target_name: TargetName,
    /// Reward token address.
    pub reward_erc20: Address,
    /// Price decay window in seconds.
    pub price_timeout: u64,
    /// Price feed address.
    pub chainlink_feed: Address,
    /// Relative oracle error.
    pub oracle_error: Fix,
    /// Oracle staleness window in seconds.
    pub oracle_timeout: u64,
    /// Maximum trade volume.
    pub max_trade_volume: Fix,
    /// Allowed peg deviation.
    pub default_threshold: Fix,
    /// IFFY to DISABLED delay in seconds.
    pub delay_until_default: u64,
    /// Hidden fraction of reference-rate growth.
    pub revenue_hiding: Fix,
}

impl CollateralConfig {
    /// Builds a defaults table for the given token, feed, and reward token.
    ///
    /// Numeric defaults: one-week price timeout, 0.25% oracle error, one-day
    /// oracle timeout, 1,000,000 max trade volume, 5% default threshold,
    /// one-day delay until default, and 0.0001% revenue hiding.
    #[must_use]
    pub fn with_defaults(erc20: Address, chainlink_feed: Address, reward_erc20: Address) -> Self {
        Self {
            erc20,
            target_name: TargetName::usd(),
            reward_erc20,
            price_timeout: DEFAULT_PRICE_TIMEOUT_SECS,
            chainlink_feed,
            oracle_error: Fix::from_raw(2_500_000_000_000_000),
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT_SECS,
            max_trade_volume: Fix::from_int(1_000_000),
            default_threshold: Fix::from_raw(50_000_000_000_000_000),
            delay_until_default: DEFAULT_DELAY_UNTIL_DEFAULT_SECS,
            revenue_hiding: Fix::from_raw(1_000_000_000_000),
        }
    }
}

impl Default for CollateralConfig {
    fn default() -> Self {
        Self::with_defaults(Address::ZERO, Address::ZERO, Address::ZERO)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use super::*;

    #[test]
    fn empty_opts_resolve_to_defaults() {
        let defaults = CollateralConfig::default();
        assert_eq!(CollateralOpts::default().resolve(&defaults).unwrap(), defaults);
    }
}
