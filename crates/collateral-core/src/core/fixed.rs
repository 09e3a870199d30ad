// collateral-core/src/core/fixed.rs
// ============================================================================
// Module: Fixed-Point Numerics
// Description: Unsigned 18-decimal fixed-point values with explicit rounding.
// Purpose: Give prices, rates, and fractions exact, overflow-checked arithmetic.
// Dependencies: bigdecimal, serde, thiserror, uint
// ============================================================================

//! ## Overview
//! [`Fix`] stores a non-negative value scaled by `10^18` in a `u128`. Every
//! multiply and divide goes through a `uint` 256-bit intermediate so products
//! of two large operands do not overflow before the final division. Rounding
//! is always explicit. Decimal strings are parsed exactly through `BigDecimal`
//! and rejected when they carry more than 18 fractional digits or more
//! integer digits than the range allows.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use self::wide::U256;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of fractional decimal digits carried by [`Fix`].
pub const FIX_DECIMALS: u8 = 18;
/// Raw scale factor of [`Fix`] (`10^18`).
pub const FIX_SCALE: u128 = 1_000_000_000_000_000_000;
/// Largest power of ten representable in a `u128`.
const MAX_POW10: u8 = 38;
/// Most integer digits a [`Fix`] can carry (`u128::MAX / 10^18` has 21).
const MAX_INTEGER_DIGITS: i64 = 21;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fixed-point arithmetic and parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixError {
    /// Result does not fit in the fixed-point range.
    #[error("fixed-point overflow")]
    Overflow,
    /// Subtraction would go below zero.
    #[error("fixed-point underflow")]
    Underflow,
    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// Input is not a decimal number.
    #[error("invalid decimal: {0}")]
    Parse(String),
    /// Input is negative.
    #[error("negative value not allowed: {0}")]
    Negative(String),
    /// Input has more fractional digits than the fixed-point scale.
    #[error("decimal exceeds 18 fractional digits: {0}")]
    Precision(String),
    /// Token decimals are beyond the supported range.
    #[error("unsupported token decimals: {0}")]
    Decimals(u8),
}

// ============================================================================
// SECTION: Rounding
// ============================================================================

/// Rounding mode applied when a result is not exactly representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Round toward zero.
    Floor,
    /// Round half up.
    Round,
    /// Round away from zero.
    Ceil,
}

// ============================================================================
// SECTION: Fixed-Point Value
// ============================================================================

/// Unsigned fixed-point value with 18 decimals.
///
/// # Invariants
/// - The raw value is the real value multiplied by [`FIX_SCALE`].
/// - Serializes as its canonical decimal string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fix(u128);

impl Fix {
    /// Zero.
    pub const ZERO: Self = Self(0);
    /// One whole unit.
    pub const ONE: Self = Self(FIX_SCALE);
    /// Largest representable value; used as the "no price" upper bound.
    pub const MAX: Self = Self(u128::MAX);

    /// Creates a value from its raw scaled representation.
    #[must_use]
    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    /// Returns the raw scaled representation.
    #[must_use]
    pub const fn raw(self) -> u128 {
        self.0
    }

    /// Creates a value from a whole number.
    #[must_use]
    pub fn from_int(value: u64) -> Self {
        Self(u128::from(value) * FIX_SCALE)
    }

    /// Returns true when the value is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Adds two values.
    ///
    /// # Errors
    ///
    /// Returns [`FixError::Overflow`] when the sum does not fit.
    pub fn checked_add(self, rhs: Self) -> Result<Self, FixError> {
        self.0.checked_add(rhs.0).map(Self).ok_or(FixError::Overflow)
    }

    /// Subtracts `rhs` from `self`.
    ///
    /// # Errors
    ///
    /// Returns [`FixError::Underflow`] when `rhs > self`.
    pub fn checked_sub(self, rhs: Self) -> Result<Self, FixError> {
        self.0.checked_sub(rhs.0).map(Self).ok_or(FixError::Underflow)
    }

    /// Subtracts `rhs` from `self`, clamping at zero.
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Multiplies two fixed-point values.
    ///
    /// # Errors
    ///
    /// Returns [`FixError::Overflow`] when the product does not fit.
    pub fn mul(self, rhs: Self, rounding: Rounding) -> Result<Self, FixError> {
        mul_div(self.0, rhs.0, FIX_SCALE, rounding).map(Self)
    }

    /// Divides `self` by `rhs`.
    ///
    /// # Errors
    ///
    /// Returns [`FixError::DivisionByZero`] or [`FixError::Overflow`].
    pub fn div(self, rhs: Self, rounding: Rounding) -> Result<Self, FixError> {
        mul_div(self.0, FIX_SCALE, rhs.0, rounding).map(Self)
    }

    /// Multiplies by the ratio `numerator / denominator` of plain integers.
    ///
    /// # Errors
    ///
    /// Returns [`FixError::DivisionByZero`] or [`FixError::Overflow`].
    pub fn mul_ratio(
        self,
        numerator: u64,
        denominator: u64,
        rounding: Rounding,
    ) -> Result<Self, FixError> {
        mul_div(self.0, u128::from(numerator), u128::from(denominator), rounding).map(Self)
    }

    /// Converts a token amount with `decimals` decimals into a fixed-point value.
    ///
    /// Amounts with more than 18 decimals are floored.
    ///
    /// # Errors
    ///
    /// Returns [`FixError::Overflow`] or [`FixError::Decimals`].
    pub fn from_units(units: u128, decimals: u8) -> Result<Self, FixError> {
        if decimals <= FIX_DECIMALS {
            let factor = pow10(FIX_DECIMALS - decimals)?;
            units.checked_mul(factor).map(Self).ok_or(FixError::Overflow)
        } else {
            let factor = pow10(decimals - FIX_DECIMALS)?;
            Ok(Self(units / factor))
        }
    }

    /// Converts the value into a token amount with `decimals` decimals.
    ///
    /// # Errors
    ///
    /// Returns [`FixError::Overflow`] or [`FixError::Decimals`].
    pub fn to_units(self, decimals: u8, rounding: Rounding) -> Result<u128, FixError> {
        if decimals <= FIX_DECIMALS {
            let factor = pow10(FIX_DECIMALS - decimals)?;
            div_rounded(self.0, factor, rounding)
        } else {
            let factor = pow10(decimals - FIX_DECIMALS)?;
            self.0.checked_mul(factor).ok_or(FixError::Overflow)
        }
    }

    /// Parses an exact decimal string such as `"0.05"` or `"1e6"`.
    ///
    /// # Errors
    ///
    /// Returns [`FixError`] when the text is not a non-negative decimal with at
    /// most 18 fractional digits that fits the fixed-point range.
    pub fn parse_decimal(text: &str) -> Result<Self, FixError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(FixError::Parse("empty input".to_string()));
        }
        let decimal = BigDecimal::from_str(trimmed)
            .map_err(|err| FixError::Parse(format!("{trimmed}: {err}")))?;
        let (digits, scale) = decimal.as_bigint_and_exponent();
        let rendered = digits.to_string();
        if rendered.starts_with('-') {
            return Err(FixError::Negative(trimmed.to_string()));
        }
        let significant = rendered.trim_end_matches('0');
        if significant.is_empty() {
            return Ok(Self::ZERO);
        }
        // Value is `significant * 10^-exponent`; bound it before any rescale.
        let stripped = i64::try_from(rendered.len() - significant.len())
            .map_err(|_| FixError::Overflow)?;
        let exponent = scale.saturating_sub(stripped);
        if exponent > i64::from(FIX_DECIMALS) {
            return Err(FixError::Precision(trimmed.to_string()));
        }
        let width = i64::try_from(significant.len()).map_err(|_| FixError::Overflow)?;
        if width.saturating_sub(exponent) > MAX_INTEGER_DIGITS {
            return Err(FixError::Overflow);
        }
        let shift =
            u8::try_from(i64::from(FIX_DECIMALS) - exponent).map_err(|_| FixError::Overflow)?;
        let mantissa = significant.parse::<u128>().map_err(|_| FixError::Overflow)?;
        mantissa.checked_mul(pow10(shift)?).map(Self).ok_or(FixError::Overflow)
    }
}

impl fmt::Display for Fix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / FIX_SCALE;
        let fraction = self.0 % FIX_SCALE;
        if fraction == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{fraction:018}");
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl FromStr for Fix {
    type Err = FixError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse_decimal(value)
    }
}

impl TryFrom<String> for Fix {
    type Error = FixError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_decimal(&value)
    }
}

impl From<Fix> for String {
    fn from(value: Fix) -> Self {
        value.to_string()
    }
}

// ============================================================================
// SECTION: Wide Arithmetic
// ============================================================================

/// 256-bit unsigned integer backing [`mul_div`].
mod wide {
    #![allow(
        unsafe_code,
        unexpected_cfgs,
        missing_docs,
        dead_code,
        clippy::all,
        clippy::pedantic,
        clippy::nursery,
        clippy::missing_docs_in_private_items,
        clippy::undocumented_unsafe_blocks,
        clippy::multiple_unsafe_ops_per_block,
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        clippy::use_debug,
        reason = "Items are generated by uint::construct_uint."
    )]

    uint::construct_uint! {
        /// Four-limb unsigned integer.
        pub struct U256(4);
    }
}

/// Computes `a * b / denominator` with a 256-bit intermediate.
///
/// # Errors
///
/// Returns [`FixError::DivisionByZero`] or [`FixError::Overflow`].
pub fn mul_div(a: u128, b: u128, denominator: u128, rounding: Rounding) -> Result<u128, FixError> {
    if denominator == 0 {
        return Err(FixError::DivisionByZero);
    }
    let product = U256::from(a).checked_mul(U256::from(b)).ok_or(FixError::Overflow)?;
    let (quotient, remainder) = product.div_mod(U256::from(denominator));
    if quotient.bits() > 128 {
        return Err(FixError::Overflow);
    }
    apply_rounding(quotient.low_u128(), remainder.low_u128(), denominator, rounding)
}

/// Divides with the requested rounding.
fn div_rounded(numerator: u128, denominator: u128, rounding: Rounding) -> Result<u128, FixError> {
    if denominator == 0 {
        return Err(FixError::DivisionByZero);
    }
    apply_rounding(numerator / denominator, numerator % denominator, denominator, rounding)
}

/// Adjusts a truncated quotient according to the remainder.
fn apply_rounding(
    quotient: u128,
    remainder: u128,
    denominator: u128,
    rounding: Rounding,
) -> Result<u128, FixError> {
    let bump = match rounding {
        Rounding::Floor => false,
        Rounding::Ceil => remainder > 0,
        Rounding::Round => remainder >= denominator - remainder,
    };
    if bump { quotient.checked_add(1).ok_or(FixError::Overflow) } else { Ok(quotient) }
}

/// Returns `10^exponent` for exponents that fit a `u128`.
fn pow10(exponent: u8) -> Result<u128, FixError> {
    if exponent > MAX_POW10 {
        return Err(FixError::Decimals(exponent));
    }
    10_u128.checked_pow(u32::from(exponent)).ok_or(FixError::Decimals(exponent))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::*;

    #[test]
    fn mul_div_rejects_quotients_beyond_u128() {
        assert_eq!(mul_div(u128::MAX, 2, 1, Rounding::Floor), Err(FixError::Overflow));
        assert_eq!(mul_div(u128::MAX, u128::MAX, u128::MAX, Rounding::Ceil), Ok(u128::MAX));
        assert_eq!(mul_div(1, 1, 0, Rounding::Floor), Err(FixError::DivisionByZero));
    }

    #[test]
    fn mul_div_rounds_wide_remainders() {
        assert_eq!(mul_div(u128::MAX, 3, 2, Rounding::Floor), Err(FixError::Overflow));
        let half = u128::MAX / 2;
        assert_eq!(mul_div(half, 3, 3, Rounding::Floor), Ok(half));
        assert_eq!(mul_div(u128::MAX, u128::MAX - 1, u128::MAX, Rounding::Floor), Ok(u128::MAX - 1));
        assert_eq!(mul_div(u128::MAX, 5, 10, Rounding::Round), Ok(u128::MAX / 2 + 1));
        assert_eq!(mul_div(u128::MAX, 5, 10, Rounding::Floor), Ok(u128::MAX / 2));
    }

    #[test]
    fn parse_rejects_huge_exponents_without_rescaling() {
        assert_eq!(Fix::parse_decimal("1e1000000"), Err(FixError::Overflow));
        assert_eq!(Fix::parse_decimal("1e99999999"), Err(FixError::Overflow));
        assert!(matches!(Fix::parse_decimal("1e-1000000"), Err(FixError::Precision(_))));
        assert!(matches!(Fix::parse_decimal("-1e1000000"), Err(FixError::Negative(_))));
        assert_eq!(Fix::parse_decimal("0e1000000"), Ok(Fix::ZERO));
    }

    #[test]
    fn parse_accepts_trailing_zeros_and_range_edges() {
        assert_eq!(Fix::parse_decimal("1.500000000000000000000").unwrap().to_string(), "1.5");
        assert_eq!(Fix::parse_decimal("1e20").unwrap(), Fix::from_raw(10_u128.pow(38)));
        assert_eq!(Fix::parse_decimal("1e21"), Err(FixError::Overflow));
        assert_eq!(Fix::parse_decimal("1e22"), Err(FixError::Overflow));
    }

    #[test]
    fn mul_div_handles_products_beyond_u128() {
        let big = 10_u128.pow(30);
        let result = mul_div(big, big, 10_u128.pow(25), Rounding::Floor).unwrap();
        assert_eq!(result, 10_u128.pow(35));
    }

    #[test]
    fn display_trims_trailing_zeros() {
        assert_eq!(Fix::from_raw(1_500_000_000_000_000_000).to_string(), "1.5");
        assert_eq!(Fix::from_int(42).to_string(), "42");
        assert_eq!(Fix::from_raw(1).to_string(), "0.000000000000000001");
    }
}
