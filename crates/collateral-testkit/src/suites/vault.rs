// collateral-testkit/src/suites/vault.rs
// ============================================================================
// Module: Vault Collateral Suite
// Description: Hook bundle for AppreciatingCollateral over vUSDC shares.
// Purpose: Run the common battery against a yield-bearing vault share.
// Dependencies: collateral-core
// ============================================================================

//! ## Overview
//! The vault context extends the base context with the vault and its
//! underlying token. Every capability is supported: shares stream COMP
//! rewards, and the refPerTok hooks move the vault rate by 5%.

// ============================================================================
// SECTION: Imports
// ============================================================================

use collateral_core::Address;
use collateral_core::AppreciatingCollateral;
use collateral_core::Chain;
use collateral_core::ChainError;
use collateral_core::Collateral;
use collateral_core::CollateralConfig;
use collateral_core::CollateralOpts;
use collateral_core::CollateralStatus;
use collateral_core::FeedHandle;
use collateral_core::Fix;
use collateral_core::NumberInput;
use collateral_core::Rounding;
use collateral_core::Signer;
use collateral_core::TokenHandle;
use collateral_core::VaultHandle;

use super::SuiteSettings;
use super::fork::USDC_FEED_ANSWER;
use super::fork::VAULT_SHARE_DECIMALS;
use super::fork::fork_assets;
use super::fork::seed_fork;
use super::fork::whale;
use crate::driver::SuiteError;
use crate::fixtures::CollateralFixtureContext;
use crate::fixtures::CollateralTestSuiteFixtures;
use crate::fixtures::Fixture;
use crate::fixtures::FixtureContext;
use crate::fixtures::HookError;
use crate::fixtures::TestRegistrant;
use crate::registry::TestGroup;
use crate::registry::ensure;
use crate::registry::ensure_eq;
use crate::registry::expect_error_containing;

// ============================================================================
// SECTION: Context
// ============================================================================

/// Suite name used for dispatch.
pub const NAME: &str = "vault";

/// Rate multiplier applied by `reduce_ref_per_tok` (0.95).
const REDUCE_FACTOR: Fix = Fix::from_raw(950_000_000_000_000_000);

/// Rate multiplier applied by `increase_ref_per_tok` (1.05).
const INCREASE_FACTOR: Fix = Fix::from_raw(1_050_000_000_000_000_000);

/// Whole shares minted to the collateral before each reward case.
const REWARD_SHARES: u128 = 1_000;

/// Scenario context for vault collateral.
pub struct VaultFixtureContext {
    /// Shared context; `tok` is the vault share token.
    pub base: CollateralFixtureContext,
    /// Vault issuing the shares.
    pub vault: VaultHandle,
    /// Token the vault holds.
    pub underlying: TokenHandle,
}

impl FixtureContext for VaultFixtureContext {
    fn base(&self) -> &CollateralFixtureContext {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CollateralFixtureContext {
        &mut self.base
    }
}

// ============================================================================
// SECTION: Hooks
// ============================================================================

/// Deploys a vault collateral over `defaults` with `opts` applied.
fn deploy(
    chain: &mut Chain,
    opts: &CollateralOpts,
    defaults: &CollateralConfig,
) -> Result<Box<dyn Collateral>, HookError> {
    let collateral: Box<dyn Collateral> =
        Box::new(AppreciatingCollateral::deploy(chain, opts, defaults)?);
    Ok(collateral)
}

/// Deploys and wraps a collateral into a fresh context.
fn build_context(
    chain: &mut Chain,
    alice: &Signer,
    opts: &CollateralOpts,
    defaults: &CollateralConfig,
) -> Result<VaultFixtureContext, HookError> {
    let collateral = deploy(chain, opts, defaults)?;
    let vault = VaultHandle::new(collateral.erc20());
    let underlying = TokenHandle::new(chain.vault(vault.address())?.underlying());
    let tok = TokenHandle::new(vault.address());
    let tok_decimals = tok.decimals(chain)?;
    let base = CollateralFixtureContext {
        chainlink_feed: FeedHandle::new(collateral.config().chainlink_feed),
        reward_token: TokenHandle::new(collateral.reward_erc20()),
        collateral,
        tok,
        tok_decimals,
        alice: Some(alice.clone()),
    };
    Ok(VaultFixtureContext { base, vault, underlying })
}

/// Deposits whale USDC for shares held by `user`, then moves them to `recipient`.
fn mint_collateral_to(
    chain: &mut Chain,
    ctx: &VaultFixtureContext,
    amount: u128,
    user: &Signer,
    recipient: Address,
) -> Result<(), HookError> {
    ctx.vault.mint_shares(chain, whale().address(), user.address(), amount)?;
    ctx.base.tok.transfer(chain, user.address(), recipient, amount)?;
    Ok(())
}

/// Multiplies the vault rate by `factor`.
fn scale_rate(chain: &mut Chain, vault: VaultHandle, factor: Fix) -> Result<(), HookError> {
    let rate = vault.rate(chain)?;
    let scaled = rate.mul(factor, Rounding::Floor).map_err(ChainError::from)?;
    vault.set_rate(chain, scaled)?;
    Ok(())
}

/// Lowers the vault rate by 5%.
fn reduce_ref_per_tok(chain: &mut Chain, ctx: &mut VaultFixtureContext) -> Result<(), HookError> {
    scale_rate(chain, ctx.vault, REDUCE_FACTOR)
}

/// Raises the vault rate by 5%.
fn increase_ref_per_tok(
    chain: &mut Chain,
    ctx: &mut VaultFixtureContext,
) -> Result<(), HookError> {
    scale_rate(chain, ctx.vault, INCREASE_FACTOR)
}

/// Gives the collateral a share position that accrues rewards.
fn before_each_rewards(chain: &mut Chain, ctx: &mut VaultFixtureContext) -> Result<(), HookError> {
    let shares = 10_u128
        .checked_pow(u32::from(VAULT_SHARE_DECIMALS))
        .and_then(|unit| unit.checked_mul(REWARD_SHARES))
        .ok_or(ChainError::Overflow)?;
    let holder = ctx.base.collateral.address();
    ctx.vault.mint_shares(chain, whale().address(), holder, shares)?;
    Ok(())
}

// ============================================================================
// SECTION: Specific Cases
// ============================================================================

/// Constructor cases specific to vault collateral.
fn constructor_tests(group: &mut TestGroup<VaultFixtureContext>) {
    group.it("rejects a zero default threshold", |env| {
        let opts = CollateralOpts {
            default_threshold: Some(NumberInput::Integer(0)),
            ..CollateralOpts::default()
        };
        expect_error_containing(env.deploy(&opts), "defaultThreshold zero")
    });
    group.it("rejects a revenue hiding of one", |env| {
        let opts = CollateralOpts {
            revenue_hiding: Some(NumberInput::Integer(1)),
            ..CollateralOpts::default()
        };
        expect_error_containing(env.deploy(&opts), "revenueHiding out of range")
    });
}

/// Status cases specific to vault collateral.
fn status_tests(group: &mut TestGroup<VaultFixtureContext>) {
    group.it("stays DISABLED after the vault rate recovers", |env| {
        let vault = env.ctx()?.vault;
        let rate = vault.rate(env.chain)?;
        vault.set_rate(env.chain, rate.mul(REDUCE_FACTOR, Rounding::Floor)?)?;
        ensure_eq(env.refresh()?, CollateralStatus::Disabled, "status")?;
        vault.set_rate(env.chain, rate)?;
        ensure_eq(env.refresh()?, CollateralStatus::Disabled, "status")
    });
    group.it("tracks rate growth through the hidden margin", |env| {
        let before = env.ref_per_tok()?;
        let vault = env.ctx()?.vault;
        let rate = vault.rate(env.chain)?;
        vault.set_rate(env.chain, rate.mul(INCREASE_FACTOR, Rounding::Floor)?)?;
        ensure_eq(env.refresh()?, CollateralStatus::Sound, "status")?;
        let after = env.ref_per_tok()?;
        let showing = Fix::ONE.checked_sub(env.collateral()?.config().revenue_hiding)?;
        let expected = vault.rate(env.chain)?.mul(showing, Rounding::Floor)?;
        ensure_eq(after, expected, "refPerTok")?;
        ensure(after > before, format!("refPerTok did not grow: {before} -> {after}"))
    });
}

// ============================================================================
// SECTION: Bundle
// ============================================================================

/// Builds the vault hook bundle.
///
/// # Errors
///
/// Returns [`SuiteError::Opts`] when the settings overrides do not resolve.
pub fn fixtures(
    settings: &SuiteSettings,
) -> Result<CollateralTestSuiteFixtures<VaultFixtureContext>, SuiteError> {
    let assets = fork_assets();
    let defaults = settings.overrides.resolve(&CollateralConfig::with_defaults(
        assets.vault.address(),
        assets.usdc_feed.address(),
        assets.comp.address(),
    ))?;
    let genesis = settings.genesis;
    let deploy_defaults = defaults.clone();
    Ok(CollateralTestSuiteFixtures {
        deploy_collateral: Box::new(move |chain, opts| deploy(chain, opts, &deploy_defaults)),
        collateral_specific_constructor_tests: Box::new(constructor_tests),
        collateral_specific_status_tests: Box::new(status_tests),
        before_each_rewards_test: Box::new(before_each_rewards),
        make_collateral_fixture_context: Box::new(move |alice, opts| {
            let defaults = defaults.clone();
            Fixture::new(move |chain| build_context(chain, &alice, &opts, &defaults))
        }),
        mint_collateral_to: Box::new(mint_collateral_to),
        reduce_ref_per_tok: Box::new(reduce_ref_per_tok),
        increase_ref_per_tok: Box::new(increase_ref_per_tok),
        it_claims_rewards: TestRegistrant::Active,
        it_checks_ref_per_tok_default: TestRegistrant::Active,
        it_has_revenue_hiding: TestRegistrant::Active,
        reset_fork: Box::new(move |chain| {
            seed_fork(chain, genesis)?;
            Ok(())
        }),
        collateral_name: "AppreciatingCollateral (vUSDC)".to_string(),
        chainlink_default_answer: USDC_FEED_ANSWER,
    })
}
