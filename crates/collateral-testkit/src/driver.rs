// collateral-testkit/src/driver.rs
// ============================================================================
// Module: Generic Suite Driver
// Description: Common collateral battery and the sequential case runner.
// Purpose: Run one battery against any collateral that supplies the hooks.
// Dependencies: collateral-core, thiserror
// ============================================================================

//! ## Overview
//! [`collateral_tests`] registers the common battery (constructor
//! validation, functions, rewards, prices, status, isolation) against a
//! hook bundle. [`run_collateral_suite`] executes every registered case in
//! order on a freshly reset fork and reports each outcome.
//!
//! ## Invariants
//! - Each case starts from `reset_fork`; no state carries between cases.
//! - Capability-dependent cases are registered through
//!   [`TestRegistrant`](crate::fixtures::TestRegistrant),
//!   so unsupported capabilities surface as pending cases.
//! - Case failures never abort the suite; only setup failures do.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Instant;

use collateral_core::Address;
use collateral_core::Chain;
use collateral_core::ChainEvent;
use collateral_core::CollateralOpts;
use collateral_core::CollateralStatus;
use collateral_core::Fix;
use collateral_core::MAX_DELAY_UNTIL_DEFAULT_SECS;
use collateral_core::NumberInput;
use collateral_core::OptsError;
use collateral_core::PriceRange;
use collateral_core::Rounding;
use collateral_core::Signer;
use collateral_core::Timestamp;
use thiserror::Error;

use crate::events::SuiteEvent;
use crate::events::SuiteEventSink;
use crate::fixtures::CollateralTestSuiteFixtures;
use crate::fixtures::FixtureContext;
use crate::registry::Case;
use crate::registry::CaseBody;
use crate::registry::CaseEnv;
use crate::registry::CaseFailure;
use crate::registry::TestGroup;
use crate::registry::TestRegistry;
use crate::registry::ensure;
use crate::registry::ensure_eq;
use crate::registry::expect_error_containing;
use crate::report::CaseOutcome;
use crate::report::CaseReport;
use crate::report::SuiteReport;

// ============================================================================
// SECTION: Errors and Options
// ============================================================================

/// Suite-level failures that stop a run before any case executes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuiteError {
    /// The fork could not be prepared.
    #[error("suite setup failed: {0}")]
    Setup(String),
    /// No built-in suite has this name.
    #[error("unknown suite: {0}")]
    UnknownSuite(String),
    /// Default overrides could not be resolved.
    #[error("invalid collateral defaults: {0}")]
    Opts(#[from] OptsError),
}

/// Run-time options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Only run cases whose `group: case` name contains this text.
    pub filter: Option<String>,
}

impl RunOptions {
    /// Returns true when `full_name` passes the filter.
    #[must_use]
    pub fn selects(&self, full_name: &str) -> bool {
        self.filter.as_deref().is_none_or(|filter| full_name.contains(filter))
    }
}

/// Whole tokens per case mint.
const MINT_WHOLE_TOKENS: u128 = 100;

/// Blocks mined before a reward claim.
const REWARD_BLOCKS: u64 = 1_000;

// ============================================================================
// SECTION: Battery
// ============================================================================

/// Registers the common battery against `fixtures`.
#[must_use]
pub fn collateral_tests<T: FixtureContext + 'static>(
    fixtures: &CollateralTestSuiteFixtures<T>,
) -> TestRegistry<T> {
    let mut registry = TestRegistry::new();
    registry.add_group(constructor_group(fixtures));
    registry.add_group(functions_group());
    registry.add_group(rewards_group(fixtures));
    registry.add_group(prices_group(fixtures));
    registry.add_group(status_group(fixtures));
    registry.add_group(isolation_group());
    registry
}

/// Deployment and constructor validation cases.
fn constructor_group<T: FixtureContext + 'static>(
    fixtures: &CollateralTestSuiteFixtures<T>,
) -> TestGroup<T> {
    let mut group = TestGroup::without_context("constructor validation");
    group.it("deploys with default options", deploys_with_defaults);
    for (name, needle, opts) in constructor_rejections() {
        group.it(name, move |env| expect_error_containing(env.deploy(&opts), needle));
    }
    group.it("rejects a reward token equal to the collateral token", rejects_shared_reward_token);
    (fixtures.collateral_specific_constructor_tests)(&mut group);
    group
}

/// Options that each break exactly one common constructor rule.
fn constructor_rejections() -> Vec<(&'static str, &'static str, CollateralOpts)> {
    let zero = Address::ZERO.to_string();
    vec![
        (
            "rejects a missing erc20",
            "missing erc20",
            CollateralOpts { erc20: Some(zero.clone()), ..CollateralOpts::default() },
        ),
        (
            "rejects a missing target name",
            "targetName missing",
            CollateralOpts { target_name: Some(String::new()), ..CollateralOpts::default() },
        ),
        (
            "rejects a missing price feed",
            "missing chainlink feed",
            CollateralOpts { chainlink_feed: Some(zero), ..CollateralOpts::default() },
        ),
        (
            "rejects a zero price timeout",
            "price timeout zero",
            CollateralOpts { price_timeout: Some(NumberInput::Integer(0)), ..CollateralOpts::default() },
        ),
        (
            "rejects a zero oracle error",
            "oracle error out of range",
            CollateralOpts { oracle_error: Some(NumberInput::Integer(0)), ..CollateralOpts::default() },
        ),
        (
            "rejects an oracle error of one",
            "oracle error out of range",
            CollateralOpts { oracle_error: Some(NumberInput::Integer(1)), ..CollateralOpts::default() },
        ),
        (
            "rejects a zero oracle timeout",
            "oracleTimeout zero",
            CollateralOpts { oracle_timeout: Some(NumberInput::Integer(0)), ..CollateralOpts::default() },
        ),
        (
            "rejects a zero max trade volume",
            "invalid max trade volume",
            CollateralOpts {
                max_trade_volume: Some(NumberInput::Integer(0)),
                ..CollateralOpts::default()
            },
        ),
        (
            "rejects a delay until default above the maximum",
            "delayUntilDefault too long",
            CollateralOpts {
                delay_until_default: Some(NumberInput::Integer(
                    MAX_DELAY_UNTIL_DEFAULT_SECS.saturating_add(1),
                )),
                ..CollateralOpts::default()
            },
        ),
        (
            "rejects a zero delay until default",
            "delayUntilDefault zero",
            CollateralOpts {
                delay_until_default: Some(NumberInput::Integer(0)),
                ..CollateralOpts::default()
            },
        ),
        (
            "rejects a default threshold of one",
            "defaultThreshold out of range",
            CollateralOpts {
                default_threshold: Some(NumberInput::Integer(1)),
                ..CollateralOpts::default()
            },
        ),
    ]
}

/// Empty options deploy a usable SOUND collateral.
fn deploys_with_defaults<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
) -> Result<(), CaseFailure> {
    let collateral = env.deploy(&CollateralOpts::default())?;
    ensure_eq(collateral.status(env.chain), CollateralStatus::Sound, "status")?;
    ensure_eq(collateral.when_default(), Timestamp::NEVER, "when default")?;
    ensure(collateral.is_collateral(), "deployed asset is not collateral")?;
    ensure(!collateral.target_name().is_empty(), "target name is empty")?;
    ensure(!collateral.max_trade_volume().is_zero(), "max trade volume is zero")?;
    let price = collateral.price(env.chain);
    ensure(!price.low.is_zero() && price.high < Fix::MAX, "default deploy is unpriced")
}

/// Reward token may not be the collateral token.
fn rejects_shared_reward_token<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
) -> Result<(), CaseFailure> {
    let erc20 = env.deploy(&CollateralOpts::default())?.erc20();
    let opts =
        CollateralOpts { reward_erc20: Some(erc20.to_string()), ..CollateralOpts::default() };
    expect_error_containing(env.deploy(&opts), "reward token must differ from collateral token")
}

/// Balance and minting cases.
fn functions_group<T: FixtureContext + 'static>() -> TestGroup<T> {
    let mut group = TestGroup::new("functions");
    group.it("returns balances in whole tokens", returns_balance_in_whole_tokens);
    group.it("minting increases the recipient balance", minting_increases_balance);
    group
}

/// Raw units for `whole` tokens at `decimals`.
fn whole_tokens(whole: u128, decimals: u8) -> Result<u128, CaseFailure> {
    10_u128
        .checked_pow(u32::from(decimals))
        .and_then(|unit| unit.checked_mul(whole))
        .ok_or_else(|| CaseFailure::new("token amount overflow"))
}

/// `bal` reports minted units in whole tokens.
fn returns_balance_in_whole_tokens<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
) -> Result<(), CaseFailure> {
    let decimals = env.ctx()?.base().tok_decimals;
    let holder = env.alice.address();
    let before = env.collateral()?.bal(env.chain, holder)?;
    let amount = whole_tokens(MINT_WHOLE_TOKENS, decimals)?;
    env.mint_collateral_to(amount, holder)?;
    let after = env.collateral()?.bal(env.chain, holder)?;
    let expected = before.checked_add(Fix::from_units(amount, decimals)?)?;
    ensure_eq(after, expected, "balance")
}

/// Minting raises the recipient's raw balance.
fn minting_increases_balance<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
) -> Result<(), CaseFailure> {
    let (tok, decimals) = {
        let base = env.ctx()?.base();
        (base.tok, base.tok_decimals)
    };
    let recipient = env.chain.signer("bob").address();
    let before = tok.balance_of(env.chain, recipient)?;
    env.mint_collateral_to(whole_tokens(1, decimals)?, recipient)?;
    let after = tok.balance_of(env.chain, recipient)?;
    ensure(after > before, format!("balance did not increase: {before} -> {after}"))
}

/// Reward claim cases.
fn rewards_group<T: FixtureContext + 'static>(
    fixtures: &CollateralTestSuiteFixtures<T>,
) -> TestGroup<T> {
    let mut group = TestGroup::rewards("rewards");
    group.register(fixtures.it_claims_rewards, "claims rewards", claims_rewards);
    group
}

/// Claiming after some blocks pays the reward token.
fn claims_rewards<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
) -> Result<(), CaseFailure> {
    let (reward_token, holder) = {
        let base = env.ctx()?.base();
        (base.reward_token, base.collateral.address())
    };
    let before = reward_token.balance_of(env.chain, holder)?;
    env.chain.advance_blocks(REWARD_BLOCKS);
    let claims = env.claim_rewards()?;
    let after = reward_token.balance_of(env.chain, holder)?;
    ensure(after > before, format!("reward balance did not increase: {before} -> {after}"))?;
    ensure(
        claims.iter().any(|claim| claim.erc20 == reward_token.address() && claim.amount > 0),
        "no reward claim reported for the reward token",
    )
}

/// Pricing cases.
fn prices_group<T: FixtureContext + 'static>(
    fixtures: &CollateralTestSuiteFixtures<T>,
) -> TestGroup<T> {
    let mut group = TestGroup::new("prices");
    group.it("prices change as the feed price changes", prices_follow_feed);
    group.register(
        fixtures.it_checks_ref_per_tok_default,
        "prices change as refPerTok changes",
        prices_follow_ref_per_tok,
    );
    group.it("reverts when the oracle is stale", reverts_on_stale_oracle);
    group.it("decays the saved price once the oracle is stale", decays_saved_price);
    group.it("handles a zero price", handles_zero_price);
    group.it("handles a negative price", handles_negative_price);
    group
}

/// Doubling the feed answer doubles the peg and shifts the band.
fn prices_follow_feed<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
) -> Result<(), CaseFailure> {
    let before = env.collateral()?.try_price(env.chain)?;
    let feed = env.ctx()?.base().chainlink_feed;
    feed.scale_answer(env.chain, 2, 1)?;
    env.refresh()?;
    let collateral = env.collateral()?;
    let after = collateral.try_price(env.chain)?;
    ensure_eq(after.peg, before.peg.checked_add(before.peg)?, "peg price")?;
    let ref_per_tok = collateral.ref_per_tok(env.chain)?;
    let error = after.peg.mul(collateral.config().oracle_error, Rounding::Ceil)?;
    let expected_low = after.peg.saturating_sub(error).mul(ref_per_tok, Rounding::Floor)?;
    ensure_eq(after.low, expected_low, "low price")?;
    ensure(
        after.low > before.low && after.high > before.high,
        "price band did not rise with the feed",
    )
}

/// Raising the reference rate raises the price band.
fn prices_follow_ref_per_tok<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
) -> Result<(), CaseFailure> {
    let before = env.price()?;
    env.increase_ref_per_tok()?;
    env.refresh()?;
    let after = env.price()?;
    ensure(
        after.low > before.low && after.high > before.high,
        "price band did not rise with refPerTok",
    )
}

/// Stale answers make `try_price` fail.
fn reverts_on_stale_oracle<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
) -> Result<(), CaseFailure> {
    let timeout = env.collateral()?.config().oracle_timeout;
    env.chain.advance_time(timeout.saturating_add(1));
    expect_error_containing(env.collateral()?.try_price(env.chain), "stale price")
}

/// Saved price widens after the oracle timeout and expires after the price timeout.
fn decays_saved_price<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
) -> Result<(), CaseFailure> {
    let (oracle_timeout, price_timeout) = {
        let config = env.collateral()?.config();
        (config.oracle_timeout, config.price_timeout)
    };
    let saved = env.price()?;
    env.chain.advance_time(oracle_timeout.saturating_add(price_timeout / 2));
    let decayed = env.price()?;
    ensure(
        decayed.low < saved.low && decayed.high > saved.high,
        "saved price did not decay after the oracle timeout",
    )?;
    env.chain.advance_time(price_timeout);
    ensure(env.price()? == PriceRange::UNPRICED, "price not unpriced after the price timeout")
}

/// Zero answers price at zero and mark IFFY.
fn handles_zero_price<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
) -> Result<(), CaseFailure> {
    env.set_answer(0)?;
    let quote = env.collateral()?.try_price(env.chain)?;
    ensure(quote.low.is_zero(), "zero answer produced a non-zero low price")?;
    ensure_eq(env.refresh()?, CollateralStatus::Iffy, "status")
}

/// Negative answers are invalid and mark IFFY.
fn handles_negative_price<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
) -> Result<(), CaseFailure> {
    env.set_answer(-1)?;
    expect_error_containing(env.collateral()?.try_price(env.chain), "invalid price")?;
    ensure_eq(env.refresh()?, CollateralStatus::Iffy, "status")
}

/// Status lifecycle cases.
fn status_group<T: FixtureContext + 'static>(
    fixtures: &CollateralTestSuiteFixtures<T>,
) -> TestGroup<T> {
    let mut group = TestGroup::new("status");
    group.it("maintains SOUND under normal conditions", maintains_sound);
    group.it("enters IFFY when the oracle is stale", iffy_on_stale_oracle);
    group.it("goes IFFY then DISABLED on a peg deviation", peg_deviation_defaults);
    group.it("does not recover from IFFY", no_recovery_from_iffy);
    group.it("does not recover from DISABLED", no_recovery_from_disabled);
    group.it("emits status change events", emits_status_events);
    group.register(
        fixtures.it_checks_ref_per_tok_default,
        "enters DISABLED when refPerTok decreases",
        disabled_on_ref_per_tok_drop,
    );
    group.register(
        fixtures.it_checks_ref_per_tok_default,
        "reduce refPerTok strictly decreases refPerTok",
        reduce_is_strictly_decreasing,
    );
    group.register(
        fixtures.it_checks_ref_per_tok_default,
        "never returns to SOUND after refPerTok defaults",
        ref_per_tok_default_is_one_way,
    );
    group.register(
        fixtures.it_has_revenue_hiding,
        "hides refPerTok drops within the revenue hiding margin",
        hides_revenue,
    );
    (fixtures.collateral_specific_status_tests)(&mut group);
    group
}

/// Publishes an answer `numerator / denominator` of the peg answer.
pub(crate) fn move_off_peg<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
    numerator: i128,
    denominator: i128,
) -> Result<(), CaseFailure> {
    let answer = env
        .fixtures
        .chainlink_default_answer
        .checked_mul(numerator)
        .and_then(|value| value.checked_div(denominator))
        .ok_or_else(|| CaseFailure::new("feed answer overflow"))?;
    env.set_answer(answer)
}

/// Restores the peg answer.
fn restore_peg<T: FixtureContext + 'static>(env: &mut CaseEnv<'_, T>) -> Result<(), CaseFailure> {
    let answer = env.fixtures.chainlink_default_answer;
    env.set_answer(answer)
}

/// Reads the configured IFFY to DISABLED delay.
fn delay_until_default<T: FixtureContext + 'static>(
    env: &CaseEnv<'_, T>,
) -> Result<u64, CaseFailure> {
    Ok(env.collateral()?.config().delay_until_default)
}

/// Fresh on-peg answers keep the collateral SOUND.
fn maintains_sound<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
) -> Result<(), CaseFailure> {
    ensure_eq(env.refresh()?, CollateralStatus::Sound, "status")?;
    env.chain.advance_time(3_600);
    restore_peg(env)?;
    ensure_eq(env.refresh()?, CollateralStatus::Sound, "status")?;
    ensure_eq(env.collateral()?.when_default(), Timestamp::NEVER, "when default")
}

/// Stale oracle marks IFFY and schedules the default.
fn iffy_on_stale_oracle<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
) -> Result<(), CaseFailure> {
    let timeout = env.collateral()?.config().oracle_timeout;
    let delay = delay_until_default(env)?;
    env.chain.advance_time(timeout.saturating_add(1));
    ensure_eq(env.refresh()?, CollateralStatus::Iffy, "status")?;
    let deadline = env.chain.now().saturating_add(delay);
    ensure_eq(env.collateral()?.when_default(), deadline, "when default")
}

/// A 20% deviation marks IFFY and defaults after the delay.
fn peg_deviation_defaults<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
) -> Result<(), CaseFailure> {
    let delay = delay_until_default(env)?;
    move_off_peg(env, 4, 5)?;
    ensure_eq(env.refresh()?, CollateralStatus::Iffy, "status")?;
    let deadline = env.chain.now().saturating_add(delay);
    ensure_eq(env.collateral()?.when_default(), deadline, "when default")?;
    env.chain.advance_time(delay);
    ensure_eq(env.status()?, CollateralStatus::Disabled, "status")?;
    ensure_eq(env.refresh()?, CollateralStatus::Disabled, "status")
}

/// Returning to peg leaves the default timer running.
fn no_recovery_from_iffy<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
) -> Result<(), CaseFailure> {
    move_off_peg(env, 4, 5)?;
    ensure_eq(env.refresh()?, CollateralStatus::Iffy, "status")?;
    let deadline = env.collateral()?.when_default();
    restore_peg(env)?;
    ensure_eq(env.refresh()?, CollateralStatus::Iffy, "status")?;
    ensure_eq(env.collateral()?.when_default(), deadline, "when default")
}

/// DISABLED is terminal.
fn no_recovery_from_disabled<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
) -> Result<(), CaseFailure> {
    let delay = delay_until_default(env)?;
    move_off_peg(env, 4, 5)?;
    env.refresh()?;
    env.chain.advance_time(delay);
    ensure_eq(env.refresh()?, CollateralStatus::Disabled, "status")?;
    restore_peg(env)?;
    ensure_eq(env.refresh()?, CollateralStatus::Disabled, "status")
}

/// Each observed transition is logged once, in order.
fn emits_status_events<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
) -> Result<(), CaseFailure> {
    let delay = delay_until_default(env)?;
    let collateral = env.collateral()?.address();
    let mark = env.chain.event_mark();
    move_off_peg(env, 4, 5)?;
    env.refresh()?;
    env.chain.advance_time(delay);
    env.refresh()?;
    let changes: Vec<(CollateralStatus, CollateralStatus)> = env
        .chain
        .events_since(mark)
        .iter()
        .filter_map(|event| match event {
            ChainEvent::CollateralStatusChanged { collateral: source, old_status, new_status }
                if *source == collateral =>
            {
                Some((*old_status, *new_status))
            }
            _ => None,
        })
        .collect();
    ensure(
        changes
            == [
                (CollateralStatus::Sound, CollateralStatus::Iffy),
                (CollateralStatus::Iffy, CollateralStatus::Disabled),
            ],
        format!("unexpected status change events: {}", describe_changes(&changes)),
    )
}

/// Renders status transitions as `A->B` pairs.
fn describe_changes(changes: &[(CollateralStatus, CollateralStatus)]) -> String {
    changes.iter().map(|(old, new)| format!("{old}->{new}")).collect::<Vec<_>>().join(", ")
}

/// A reference rate drop is a hard default.
fn disabled_on_ref_per_tok_drop<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
) -> Result<(), CaseFailure> {
    env.reduce_ref_per_tok()?;
    ensure_eq(env.refresh()?, CollateralStatus::Disabled, "status")?;
    ensure_eq(env.collateral()?.when_default(), env.chain.now(), "when default")
}

/// Two reductions give two strictly lower rates.
fn reduce_is_strictly_decreasing<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
) -> Result<(), CaseFailure> {
    let initial = env.ref_per_tok()?;
    env.reduce_ref_per_tok()?;
    env.refresh()?;
    let first = env.ref_per_tok()?;
    env.reduce_ref_per_tok()?;
    env.refresh()?;
    let second = env.ref_per_tok()?;
    ensure(
        second < first && first < initial,
        format!("refPerTok not strictly decreasing: {initial} -> {first} -> {second}"),
    )
}

/// Repeated drops then the default delay only ever worsen the status.
fn ref_per_tok_default_is_one_way<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
) -> Result<(), CaseFailure> {
    let delay = delay_until_default(env)?;
    let mut observed = vec![env.refresh()?];
    for _ in 0..3 {
        env.reduce_ref_per_tok()?;
        observed.push(env.refresh()?);
    }
    env.chain.advance_time(delay.saturating_add(1));
    observed.push(env.refresh()?);
    let rendered = observed.iter().map(ToString::to_string).collect::<Vec<_>>().join(" -> ");
    ensure(
        observed.first() == Some(&CollateralStatus::Sound)
            && observed.last() == Some(&CollateralStatus::Disabled),
        format!("expected SOUND ... DISABLED, got {rendered}"),
    )?;
    ensure(
        observed.windows(2).all(|pair| pair[0].can_transition_to(pair[1])),
        format!("status recovered: {rendered}"),
    )
}

/// A drop smaller than the hidden margin keeps the exposed rate.
fn hides_revenue<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
) -> Result<(), CaseFailure> {
    env.load_fixture(CollateralOpts {
        revenue_hiding: Some(NumberInput::from("0.1")),
        ..CollateralOpts::default()
    })?;
    let exposed = env.ref_per_tok()?;
    env.reduce_ref_per_tok()?;
    ensure_eq(env.refresh()?, CollateralStatus::Sound, "status")?;
    ensure_eq(env.ref_per_tok()?, exposed, "refPerTok")
}

/// Fork isolation cases.
fn isolation_group<T: FixtureContext + 'static>() -> TestGroup<T> {
    let mut group = TestGroup::without_context("isolation");
    group.it("reset fork leaves no balance carryover", reset_clears_balances);
    group.it("fixture loads are independent", fixture_loads_are_independent);
    group
}

/// Balances minted before a reset are gone after it.
fn reset_clears_balances<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
) -> Result<(), CaseFailure> {
    env.load_fixture(CollateralOpts::default())?;
    let (tok, decimals) = {
        let base = env.ctx()?.base();
        (base.tok, base.tok_decimals)
    };
    let holder = env.alice.address();
    env.mint_collateral_to(whole_tokens(MINT_WHOLE_TOKENS, decimals)?, holder)?;
    ensure(tok.balance_of(env.chain, holder)? > 0, "mint left no balance")?;
    env.reset_fork()?;
    ensure(env.ctx.is_none(), "context survived the fork reset")?;
    env.load_fixture(CollateralOpts::default())?;
    ensure_eq(env.collateral()?.bal(env.chain, holder)?, Fix::ZERO, "balance after reset")
}

/// A second load reverts the first load's writes.
fn fixture_loads_are_independent<T: FixtureContext + 'static>(
    env: &mut CaseEnv<'_, T>,
) -> Result<(), CaseFailure> {
    let mut fixture =
        (env.fixtures.make_collateral_fixture_context)(env.alice.clone(), CollateralOpts::default());
    let first = fixture.load(env.chain)?;
    let holder = env.alice.address();
    let decimals = first.base().tok_decimals;
    env.ctx = Some(first);
    env.mint_collateral_to(whole_tokens(MINT_WHOLE_TOKENS, decimals)?, holder)?;
    ensure(!env.collateral()?.bal(env.chain, holder)?.is_zero(), "mint left no balance")?;
    let second = fixture.load(env.chain)?;
    ensure_eq(second.base().collateral.bal(env.chain, holder)?, Fix::ZERO, "balance in second load")?;
    ensure_eq(
        second.base().collateral.status(env.chain),
        CollateralStatus::Sound,
        "status in second load",
    )
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Runs the common battery for `fixtures`.
///
/// Each selected case runs on a freshly reset fork: `reset_fork`, a
/// default fixture load for context groups, `before_each_rewards_test` for
/// reward groups, then the body. Failing cases are recorded and the run
/// continues.
///
/// # Errors
///
/// Returns [`SuiteError::Setup`] when the initial fork reset fails.
pub fn run_collateral_suite<T: FixtureContext + 'static>(
    fixtures: &CollateralTestSuiteFixtures<T>,
    options: &RunOptions,
    sink: &dyn SuiteEventSink,
) -> Result<SuiteReport, SuiteError> {
    let suite = fixtures.collateral_name.as_str();
    let mut chain = Chain::new(Timestamp::ZERO);
    (fixtures.reset_fork)(&mut chain).map_err(|err| SuiteError::Setup(err.to_string()))?;
    let registry = collateral_tests(fixtures);
    sink.record(&SuiteEvent::suite_started(suite));

    let mut report = SuiteReport::new(suite);
    for group in registry.groups() {
        for case in group.cases() {
            let full_name = format!("{}: {}", group.name(), case.name);
            if !options.selects(&full_name) {
                continue;
            }
            sink.record(&SuiteEvent::case_started(suite, group.name(), &case.name));
            let started = Instant::now();
            let (outcome, message) = match &case.case {
                Case::Pending => (CaseOutcome::Pending, None),
                Case::Runnable(body) => match run_case(&mut chain, fixtures, group, body) {
                    Ok(()) => (CaseOutcome::Passed, None),
                    Err(failure) => (CaseOutcome::Failed, Some(failure.message)),
                },
            };
            let case_report = CaseReport {
                group: group.name().to_string(),
                name: case.name.clone(),
                outcome,
                message,
                duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            };
            sink.record(&SuiteEvent::case_finished(suite, &case_report));
            report.cases.push(case_report);
        }
    }
    sink.record(&SuiteEvent::suite_finished(&report));
    Ok(report)
}

/// Prepares a fresh environment and runs one body.
fn run_case<T: FixtureContext + 'static>(
    chain: &mut Chain,
    fixtures: &CollateralTestSuiteFixtures<T>,
    group: &TestGroup<T>,
    body: &CaseBody<T>,
) -> Result<(), CaseFailure> {
    (fixtures.reset_fork)(chain)?;
    let mut env = CaseEnv { chain, ctx: None, alice: Signer::new("alice"), fixtures };
    if group.with_context() {
        env.load_fixture(CollateralOpts::default())?;
    }
    if group.is_rewards() {
        env.prepare_rewards()?;
    }
    body(&mut env)
}
