// collateral-core/tests/collateral_plugins.rs
// ============================================================================
// Module: Collateral Plugin Tests
// Description: Constructor validation, pricing, and status transitions.
// ============================================================================
//! ## Overview
//! Exercises the fiat and appreciating plugins directly against a small
//! hand-built chain.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use collateral_core::Address;
use collateral_core::AppreciatingCollateral;
use collateral_core::Chain;
use collateral_core::ChainEvent;
use collateral_core::Collateral;
use collateral_core::CollateralConfig;
use collateral_core::CollateralError;
use collateral_core::CollateralOpts;
use collateral_core::CollateralStatus;
use collateral_core::FeedHandle;
use collateral_core::FiatCollateral;
use collateral_core::Fix;
use collateral_core::PriceRange;
use collateral_core::Timestamp;
use collateral_core::TokenHandle;
use collateral_core::VaultHandle;

type TestResult = Result<(), String>;

struct Setup {
    chain: Chain,
    usdc: TokenHandle,
    comp: TokenHandle,
    feed: FeedHandle,
    vault: VaultHandle,
}

fn setup() -> Setup {
    let mut chain = Chain::new(Timestamp::from_secs(1_700_000_000));
    let usdc = chain.deploy_token("USD Coin", "USDC", 6);
    let comp = chain.deploy_token("Compound", "COMP", 18);
    let feed = chain.deploy_feed(8, 100_000_000);
    let vault = chain
        .deploy_vault(usdc.address(), "Vault USDC", "vUSDC", 8, Fix::parse_decimal("1.02").unwrap())
        .unwrap();
    Setup { chain, usdc, comp, feed, vault }
}

fn fiat_defaults(setup: &Setup) -> CollateralConfig {
    CollateralConfig::with_defaults(
        setup.usdc.address(),
        setup.feed.address(),
        setup.comp.address(),
    )
}

fn vault_defaults(setup: &Setup) -> CollateralConfig {
    CollateralConfig::with_defaults(
        setup.vault.address(),
        setup.feed.address(),
        setup.comp.address(),
    )
}

fn assert_invalid<T>(result: Result<T, CollateralError>, needle: &str) -> TestResult {
    match result {
        Err(CollateralError::InvalidConfig(message)) if message.contains(needle) => Ok(()),
        Err(other) => Err(format!("expected '{needle}', got {other}")),
        Ok(_) => Err(format!("expected '{needle}', deploy succeeded")),
    }
}

#[test]
fn fiat_deploys_sound_with_oracle_error_band() -> TestResult {
    let mut setup = setup();
    let defaults = fiat_defaults(&setup);
    let collateral = FiatCollateral::deploy(&mut setup.chain, &CollateralOpts::default(), &defaults)
        .map_err(|err| err.to_string())?;
    assert_eq!(collateral.status(&setup.chain), CollateralStatus::Sound);
    assert_eq!(collateral.when_default(), Timestamp::NEVER);
    let price = collateral.price(&setup.chain);
    assert_eq!(price.low.to_string(), "0.9975");
    assert_eq!(price.high.to_string(), "1.0025");
    assert_eq!(collateral.last_save(), setup.chain.now());
    Ok(())
}

#[test]
fn fiat_constructor_rejects_bad_parameters() -> TestResult {
    let mut setup = setup();
    let defaults = fiat_defaults(&setup);
    let cases: Vec<(CollateralOpts, &str)> = vec![
        (
            CollateralOpts { erc20: Some(Address::ZERO.to_string()), ..CollateralOpts::default() },
            "missing erc20",
        ),
        (
            CollateralOpts { target_name: Some(String::new()), ..CollateralOpts::default() },
            "targetName missing",
        ),
        (
            CollateralOpts {
                chainlink_feed: Some(Address::ZERO.to_string()),
                ..CollateralOpts::default()
            },
            "missing chainlink feed",
        ),
        (
            CollateralOpts { price_timeout: Some(0.into()), ..CollateralOpts::default() },
            "price timeout zero",
        ),
        (
            CollateralOpts { oracle_error: Some(1.into()), ..CollateralOpts::default() },
            "oracle error out of range",
        ),
        (
            CollateralOpts { oracle_timeout: Some(0.into()), ..CollateralOpts::default() },
            "oracleTimeout zero",
        ),
        (
            CollateralOpts { max_trade_volume: Some(0.into()), ..CollateralOpts::default() },
            "invalid max trade volume",
        ),
        (
            CollateralOpts {
                delay_until_default: Some(1_209_601.into()),
                ..CollateralOpts::default()
            },
            "delayUntilDefault too long",
        ),
        (
            CollateralOpts { delay_until_default: Some(0.into()), ..CollateralOpts::default() },
            "delayUntilDefault zero",
        ),
        (
            CollateralOpts {
                reward_erc20: Some(setup.usdc.address().to_string()),
                ..CollateralOpts::default()
            },
            "reward token must differ from collateral token",
        ),
    ];
    for (opts, needle) in cases {
        assert_invalid(FiatCollateral::deploy(&mut setup.chain, &opts, &defaults), needle)?;
    }
    Ok(())
}

#[test]
fn structurally_invalid_options_fail_before_validation() {
    let mut setup = setup();
    let defaults = fiat_defaults(&setup);
    let opts = CollateralOpts { erc20: Some("not-an-address".to_string()), ..CollateralOpts::default() };
    let result = FiatCollateral::deploy(&mut setup.chain, &opts, &defaults);
    assert!(matches!(result, Err(CollateralError::Opts(_))));
}

#[test]
fn peg_deviation_goes_iffy_then_disabled_without_recovery() -> TestResult {
    let mut setup = setup();
    let defaults = fiat_defaults(&setup);
    let mut collateral =
        FiatCollateral::deploy(&mut setup.chain, &CollateralOpts::default(), &defaults)
            .map_err(|err| err.to_string())?;
    let mark = setup.chain.event_mark();

    setup.feed.update_answer(&mut setup.chain, 80_000_000).map_err(|err| err.to_string())?;
    let status = collateral.refresh(&mut setup.chain).map_err(|err| err.to_string())?;
    assert_eq!(status, CollateralStatus::Iffy);
    let deadline = setup.chain.now().saturating_add(defaults.delay_until_default);
    assert_eq!(collateral.when_default(), deadline);

    setup.chain.advance_time(defaults.delay_until_default);
    setup.feed.update_answer(&mut setup.chain, 100_000_000).map_err(|err| err.to_string())?;
    let status = collateral.refresh(&mut setup.chain).map_err(|err| err.to_string())?;
    assert_eq!(status, CollateralStatus::Disabled);
    assert_eq!(collateral.when_default(), deadline);

    let changes: Vec<(CollateralStatus, CollateralStatus)> = setup
        .chain
        .events_since(mark)
        .iter()
        .filter_map(|event| match event {
            ChainEvent::CollateralStatusChanged { old_status, new_status, .. } => {
                Some((*old_status, *new_status))
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        changes,
        vec![
            (CollateralStatus::Sound, CollateralStatus::Iffy),
            (CollateralStatus::Iffy, CollateralStatus::Disabled),
        ]
    );
    Ok(())
}

#[test]
fn stale_oracle_marks_iffy_and_price_decays() -> TestResult {
    let mut setup = setup();
    let defaults = fiat_defaults(&setup);
    let mut collateral =
        FiatCollateral::deploy(&mut setup.chain, &CollateralOpts::default(), &defaults)
            .map_err(|err| err.to_string())?;
    let saved = collateral.price(&setup.chain);

    setup.chain.advance_time(defaults.oracle_timeout + 1);
    assert!(collateral.try_price(&setup.chain).is_err());
    let decayed = collateral.price(&setup.chain);
    assert!(decayed.low < saved.low);
    assert!(decayed.high > saved.high);

    let status = collateral.refresh(&mut setup.chain).map_err(|err| err.to_string())?;
    assert_eq!(status, CollateralStatus::Iffy);

    setup.chain.advance_time(defaults.price_timeout);
    assert_eq!(collateral.price(&setup.chain), PriceRange::UNPRICED);
    Ok(())
}

#[test]
fn zero_price_marks_iffy() -> TestResult {
    let mut setup = setup();
    let defaults = fiat_defaults(&setup);
    let mut collateral =
        FiatCollateral::deploy(&mut setup.chain, &CollateralOpts::default(), &defaults)
            .map_err(|err| err.to_string())?;
    setup.feed.update_answer(&mut setup.chain, 0).map_err(|err| err.to_string())?;
    let quote = collateral.try_price(&setup.chain).map_err(|err| err.to_string())?;
    assert!(quote.low.is_zero());
    let status = collateral.refresh(&mut setup.chain).map_err(|err| err.to_string())?;
    assert_eq!(status, CollateralStatus::Iffy);
    Ok(())
}

#[test]
fn zero_threshold_disables_peg_checks() -> TestResult {
    let mut setup = setup();
    let defaults = fiat_defaults(&setup);
    let opts = CollateralOpts {
        default_threshold: Some(0.into()),
        delay_until_default: Some(0.into()),
        ..CollateralOpts::default()
    };
    let mut collateral =
        FiatCollateral::deploy(&mut setup.chain, &opts, &defaults).map_err(|err| err.to_string())?;
    setup.feed.update_answer(&mut setup.chain, 200_000_000).map_err(|err| err.to_string())?;
    let status = collateral.refresh(&mut setup.chain).map_err(|err| err.to_string())?;
    assert_eq!(status, CollateralStatus::Sound);
    Ok(())
}

#[test]
fn appreciating_tracks_rate_with_revenue_hiding() -> TestResult {
    let mut setup = setup();
    let defaults = vault_defaults(&setup);
    let opts = CollateralOpts { revenue_hiding: Some("0.01".into()), ..CollateralOpts::default() };
    let mut collateral = AppreciatingCollateral::deploy(&mut setup.chain, &opts, &defaults)
        .map_err(|err| err.to_string())?;
    let initial = collateral.ref_per_tok(&setup.chain).map_err(|err| err.to_string())?;
    assert_eq!(initial.to_string(), "1.0098");

    setup
        .vault
        .set_rate(&mut setup.chain, Fix::parse_decimal("1.015").unwrap())
        .map_err(|err| err.to_string())?;
    let status = collateral.refresh(&mut setup.chain).map_err(|err| err.to_string())?;
    assert_eq!(status, CollateralStatus::Sound);
    assert_eq!(collateral.ref_per_tok(&setup.chain).map_err(|err| err.to_string())?, initial);

    setup
        .vault
        .set_rate(&mut setup.chain, Fix::parse_decimal("1.1").unwrap())
        .map_err(|err| err.to_string())?;
    collateral.refresh(&mut setup.chain).map_err(|err| err.to_string())?;
    let grown = collateral.ref_per_tok(&setup.chain).map_err(|err| err.to_string())?;
    assert_eq!(grown.to_string(), "1.089");
    Ok(())
}

#[test]
fn appreciating_rate_drop_is_hard_default() -> TestResult {
    let mut setup = setup();
    let defaults = vault_defaults(&setup);
    let mut collateral =
        AppreciatingCollateral::deploy(&mut setup.chain, &CollateralOpts::default(), &defaults)
            .map_err(|err| err.to_string())?;
    setup
        .vault
        .set_rate(&mut setup.chain, Fix::parse_decimal("0.9").unwrap())
        .map_err(|err| err.to_string())?;
    let status = collateral.refresh(&mut setup.chain).map_err(|err| err.to_string())?;
    assert_eq!(status, CollateralStatus::Disabled);
    assert_eq!(collateral.when_default(), setup.chain.now());

    setup
        .vault
        .set_rate(&mut setup.chain, Fix::parse_decimal("0.8").unwrap())
        .map_err(|err| err.to_string())?;
    collateral.refresh(&mut setup.chain).map_err(|err| err.to_string())?;
    let rate = collateral.ref_per_tok(&setup.chain).map_err(|err| err.to_string())?;
    assert_eq!(rate.to_string(), "0.8");
    assert_eq!(collateral.status(&setup.chain), CollateralStatus::Disabled);
    Ok(())
}

#[test]
fn appreciating_constructor_specific_checks() -> TestResult {
    let mut setup = setup();
    let defaults = vault_defaults(&setup);
    let opts = CollateralOpts { default_threshold: Some(0.into()), ..CollateralOpts::default() };
    assert_invalid(
        AppreciatingCollateral::deploy(&mut setup.chain, &opts, &defaults),
        "defaultThreshold zero",
    )?;
    let opts = CollateralOpts { revenue_hiding: Some(1.into()), ..CollateralOpts::default() };
    assert_invalid(
        AppreciatingCollateral::deploy(&mut setup.chain, &opts, &defaults),
        "revenueHiding out of range",
    )
}

#[test]
fn appreciating_claims_vault_rewards() -> TestResult {
    let mut setup = setup();
    let defaults = vault_defaults(&setup);
    let mut collateral =
        AppreciatingCollateral::deploy(&mut setup.chain, &CollateralOpts::default(), &defaults)
            .map_err(|err| err.to_string())?;
    let alice = setup.chain.signer("alice").address();
    setup.usdc.mint(&mut setup.chain, alice, 10_000_000).map_err(|err| err.to_string())?;
    setup
        .vault
        .mint_shares(&mut setup.chain, alice, collateral.address(), 100_000_000)
        .map_err(|err| err.to_string())?;
    setup
        .chain
        .set_vault_reward_stream(
            setup.vault.address(),
            setup.comp.address(),
            Fix::parse_decimal("0.0001").unwrap(),
        )
        .map_err(|err| err.to_string())?;
    setup.chain.advance_time(3_600);
    let claims = collateral.claim_rewards(&mut setup.chain).map_err(|err| err.to_string())?;
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0].erc20, setup.comp.address());
    assert!(claims[0].amount > 0);
    let balance = setup
        .comp
        .balance_of(&setup.chain, collateral.address())
        .map_err(|err| err.to_string())?;
    assert_eq!(balance, claims[0].amount);
    Ok(())
}
