// collateral-core/tests/proptest_fixed.rs
// ============================================================================
// Module: Fixed-Point Property-Based Tests
// Description: Property tests for fixed-point rounding and the default timer.
// Purpose: Detect rounding drift and lifecycle regressions across wide inputs.
// ============================================================================

//! Property-based tests for fixed-point arithmetic and status monotonicity.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use collateral_core::CollateralStatus;
use collateral_core::DefaultLifecycle;
use collateral_core::Fix;
use collateral_core::Rounding;
use collateral_core::Timestamp;
use collateral_core::fixed::mul_div;
use proptest::prelude::*;

fn status_strategy() -> impl Strategy<Value = CollateralStatus> {
    prop_oneof![
        Just(CollateralStatus::Sound),
        Just(CollateralStatus::Iffy),
        Just(CollateralStatus::Disabled),
    ]
}

proptest! {
    #[test]
    fn mul_div_floor_matches_native_when_product_fits(
        a in any::<u64>(),
        b in any::<u64>(),
        d in 1_u128..,
    ) {
        let (a, b) = (u128::from(a), u128::from(b));
        prop_assert_eq!(mul_div(a, b, d, Rounding::Floor).unwrap(), a * b / d);
    }

    #[test]
    fn ceil_is_floor_plus_remainder_flag(a in any::<u64>(), b in any::<u64>(), d in 1_u128..) {
        let (a, b) = (u128::from(a), u128::from(b));
        let floor = mul_div(a, b, d, Rounding::Floor).unwrap();
        let ceil = mul_div(a, b, d, Rounding::Ceil).unwrap();
        let expected = if (a * b) % d == 0 { floor } else { floor + 1 };
        prop_assert_eq!(ceil, expected);
    }

    #[test]
    fn round_lies_between_floor_and_ceil(a in any::<u64>(), b in any::<u64>(), d in 1_u128..) {
        let (a, b) = (u128::from(a), u128::from(b));
        let floor = mul_div(a, b, d, Rounding::Floor).unwrap();
        let round = mul_div(a, b, d, Rounding::Round).unwrap();
        let ceil = mul_div(a, b, d, Rounding::Ceil).unwrap();
        prop_assert!(floor <= round && round <= ceil);
    }

    #[test]
    fn display_then_parse_is_identity(raw in any::<u128>()) {
        let value = Fix::from_raw(raw);
        prop_assert_eq!(Fix::parse_decimal(&value.to_string()).unwrap(), value);
    }

    #[test]
    fn units_conversion_is_exact_below_eighteen_decimals(units in any::<u64>(), decimals in 0_u8..=18) {
        let value = Fix::from_units(u128::from(units), decimals).unwrap();
        prop_assert_eq!(value.to_units(decimals, Rounding::Floor).unwrap(), u128::from(units));
    }

    #[test]
    fn lifecycle_never_recovers(
        marks in prop::collection::vec((status_strategy(), 0_u64..10_000), 1..32),
        delay in 0_u64..5_000,
    ) {
        let mut lifecycle = DefaultLifecycle::new();
        let mut now = Timestamp::from_secs(1_000);
        let mut previous = lifecycle.status(now);
        for (status, step) in marks {
            now = now.saturating_add(step);
            let before_mark = lifecycle.status(now);
            prop_assert!(previous.can_transition_to(before_mark));
            lifecycle.mark(status, now, delay);
            let after = lifecycle.status(now);
            prop_assert!(before_mark.can_transition_to(after));
            previous = after;
        }
    }
}

#[test]
fn parse_rejects_excess_precision_and_negatives() {
    assert!(Fix::parse_decimal("0.0000000000000000001").is_err());
    assert!(Fix::parse_decimal("-1").is_err());
    assert!(Fix::parse_decimal("abc").is_err());
    assert_eq!(Fix::parse_decimal("1e3").unwrap(), Fix::from_int(1_000));
    assert_eq!(Fix::parse_decimal("0.05").unwrap(), Fix::from_raw(50_000_000_000_000_000));
}

#[test]
fn mul_and_div_round_as_requested() {
    let third = Fix::ONE.div(Fix::from_int(3), Rounding::Floor).unwrap();
    assert_eq!(third.raw(), 333_333_333_333_333_333);
    let third_up = Fix::ONE.div(Fix::from_int(3), Rounding::Ceil).unwrap();
    assert_eq!(third_up.raw(), 333_333_333_333_333_334);
    assert!(Fix::MAX.mul(Fix::from_int(2), Rounding::Floor).is_err());
    assert!(Fix::ONE.div(Fix::ZERO, Rounding::Floor).is_err());
}
