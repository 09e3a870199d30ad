// collateral-testkit/src/suites/fiat.rs
// ============================================================================
// Module: Fiat Collateral Suite
// Description: Hook bundle for FiatCollateral over USDC.
// Purpose: Run the common battery against a pegged, non-appreciating token.
// Dependencies: collateral-core
// ============================================================================

//! ## Overview
//! USDC has a fixed reference rate and earns no rewards, so the reward,
//! refPerTok and revenue hiding cases are registered as pending and the
//! refPerTok hooks report [`HookError::Unsupported`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use collateral_core::Address;
use collateral_core::Chain;
use collateral_core::Collateral;
use collateral_core::CollateralConfig;
use collateral_core::CollateralOpts;
use collateral_core::CollateralStatus;
use collateral_core::FeedHandle;
use collateral_core::FiatCollateral;
use collateral_core::NumberInput;
use collateral_core::Signer;
use collateral_core::TokenHandle;

use super::SuiteSettings;
use super::fork::USDC_FEED_ANSWER;
use super::fork::fork_assets;
use super::fork::seed_fork;
use super::fork::whale;
use crate::driver::SuiteError;
use crate::driver::move_off_peg;
use crate::fixtures::CollateralFixtureContext;
use crate::fixtures::CollateralTestSuiteFixtures;
use crate::fixtures::Fixture;
use crate::fixtures::HookError;
use crate::fixtures::TestRegistrant;
use crate::registry::TestGroup;
use crate::registry::ensure_eq;

// ============================================================================
// SECTION: Hooks
// ============================================================================

/// Suite name used for dispatch.
pub const NAME: &str = "fiat";

/// Context type of this suite.
type Ctx = CollateralFixtureContext;

/// Deploys a fiat collateral over `defaults` with `opts` applied.
fn deploy(
    chain: &mut Chain,
    opts: &CollateralOpts,
    defaults: &CollateralConfig,
) -> Result<Box<dyn Collateral>, HookError> {
    let collateral: Box<dyn Collateral> = Box::new(FiatCollateral::deploy(chain, opts, defaults)?);
    Ok(collateral)
}

/// Deploys and wraps a collateral into a fresh context.
fn build_context(
    chain: &mut Chain,
    alice: &Signer,
    opts: &CollateralOpts,
    defaults: &CollateralConfig,
) -> Result<Ctx, HookError> {
    let collateral = deploy(chain, opts, defaults)?;
    let tok = TokenHandle::new(collateral.erc20());
    let tok_decimals = tok.decimals(chain)?;
    Ok(CollateralFixtureContext {
        chainlink_feed: FeedHandle::new(collateral.config().chainlink_feed),
        reward_token: TokenHandle::new(collateral.reward_erc20()),
        collateral,
        tok,
        tok_decimals,
        alice: Some(alice.clone()),
    })
}

/// Routes USDC from the whale through `user` to `recipient`.
fn mint_collateral_to(
    chain: &mut Chain,
    ctx: &Ctx,
    amount: u128,
    user: &Signer,
    recipient: Address,
) -> Result<(), HookError> {
    ctx.tok.transfer(chain, whale().address(), user.address(), amount)?;
    ctx.tok.transfer(chain, user.address(), recipient, amount)?;
    Ok(())
}

/// Fiat tokens have a fixed reference rate.
fn fixed_ref_per_tok(_chain: &mut Chain, _ctx: &mut Ctx) -> Result<(), HookError> {
    Err(HookError::Unsupported("fiat collateral has a fixed refPerTok".to_string()))
}

// ============================================================================
// SECTION: Specific Cases
// ============================================================================

/// Constructor cases specific to fiat collateral.
fn constructor_tests(group: &mut TestGroup<Ctx>) {
    group.it("allows a zero delay until default when the threshold is zero", |env| {
        let collateral = env.deploy(&CollateralOpts {
            default_threshold: Some(NumberInput::Integer(0)),
            delay_until_default: Some(NumberInput::Integer(0)),
            ..CollateralOpts::default()
        })?;
        ensure_eq(collateral.status(env.chain), CollateralStatus::Sound, "status")
    });
}

/// Status cases specific to fiat collateral.
fn status_tests(group: &mut TestGroup<Ctx>) {
    group.it("enters IFFY above the peg", |env| {
        move_off_peg(env, 6, 5)?;
        ensure_eq(env.refresh()?, CollateralStatus::Iffy, "status")
    });
    group.it("ignores peg deviations when the threshold is zero", |env| {
        env.load_fixture(CollateralOpts {
            default_threshold: Some(NumberInput::Integer(0)),
            ..CollateralOpts::default()
        })?;
        move_off_peg(env, 4, 5)?;
        ensure_eq(env.refresh()?, CollateralStatus::Sound, "status")
    });
}

// ============================================================================
// SECTION: Bundle
// ============================================================================

/// Builds the fiat hook bundle.
///
/// # Errors
///
/// Returns [`SuiteError::Opts`] when the settings overrides do not resolve.
pub fn fixtures(settings: &SuiteSettings) -> Result<CollateralTestSuiteFixtures<Ctx>, SuiteError> {
    let assets = fork_assets();
    let defaults = settings.overrides.resolve(&CollateralConfig::with_defaults(
        assets.usdc.address(),
        assets.usdc_feed.address(),
        assets.comp.address(),
    ))?;
    let genesis = settings.genesis;
    let deploy_defaults = defaults.clone();
    Ok(CollateralTestSuiteFixtures {
        deploy_collateral: Box::new(move |chain, opts| deploy(chain, opts, &deploy_defaults)),
        collateral_specific_constructor_tests: Box::new(constructor_tests),
        collateral_specific_status_tests: Box::new(status_tests),
        before_each_rewards_test: Box::new(|_chain, _ctx| Ok(())),
        make_collateral_fixture_context: Box::new(move |alice, opts| {
            let defaults = defaults.clone();
            Fixture::new(move |chain| build_context(chain, &alice, &opts, &defaults))
        }),
        mint_collateral_to: Box::new(mint_collateral_to),
        reduce_ref_per_tok: Box::new(fixed_ref_per_tok),
        increase_ref_per_tok: Box::new(fixed_ref_per_tok),
        it_claims_rewards: TestRegistrant::Pending,
        it_checks_ref_per_tok_default: TestRegistrant::Pending,
        it_has_revenue_hiding: TestRegistrant::Pending,
        reset_fork: Box::new(move |chain| {
            seed_fork(chain, genesis)?;
            Ok(())
        }),
        collateral_name: "FiatCollateral (USDC)".to_string(),
        chainlink_default_answer: USDC_FEED_ANSWER,
    })
}
