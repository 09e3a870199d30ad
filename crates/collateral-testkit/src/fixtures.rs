// collateral-testkit/src/fixtures.rs
// ============================================================================
// Module: Fixture Contract Schema
// Description: Scenario context, hook signatures, and the suite hook bundle.
// Purpose: Make every concrete collateral suite interchangeable for the driver.
// Dependencies: collateral-core, thiserror
// ============================================================================

//! ## Overview
//! This module is the schema a concrete collateral suite fills in:
//!
//! - [`CollateralFixtureContext`]: live state of one scenario.
//! - [`FixtureContext`]: extension point for suite-specific contexts that
//!   embed the base context.
//! - [`Fixture`]: repeatable scenario builder; every load yields a fresh,
//!   independent context.
//! - Hook aliases ([`DeployCollateralFunc`], [`MintCollateralFunc`], ...)
//!   and the [`CollateralTestSuiteFixtures`] bundle.
//! - [`TestRegistrant`]: registers a capability-dependent case as runnable
//!   or pending, so the driver never branches on plugin capabilities.
//!
//! ## Invariants
//! - Deploy hooks return a refreshed, usable collateral or an error.
//! - Mint hooks raise the recipient balance by at least `amount` or fail.
//! - Hooks for unsupported capabilities return [`HookError::Unsupported`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use collateral_core::Address;
use collateral_core::Chain;
use collateral_core::ChainError;
use collateral_core::Checkpoint;
use collateral_core::Collateral;
use collateral_core::CollateralError;
use collateral_core::CollateralOpts;
use collateral_core::FeedHandle;
use collateral_core::OptsError;
use collateral_core::Signer;
use collateral_core::TokenHandle;
use thiserror::Error;

use crate::registry::TestGroup;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Hook failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    /// Collateral deploy or call failed.
    #[error("collateral error: {0}")]
    Collateral(#[from] CollateralError),
    /// Chain operation failed.
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),
    /// Options could not be resolved.
    #[error("options error: {0}")]
    Opts(#[from] OptsError),
    /// The collateral kind lacks the requested capability.
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// A fixture context broke its invariants.
    #[error("fixture invariant violated: {0}")]
    Fixture(String),
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Live state of one scenario.
pub struct CollateralFixtureContext {
    /// Deployed collateral.
    pub collateral: Box<dyn Collateral>,
    /// Price feed driving the collateral.
    pub chainlink_feed: FeedHandle,
    /// Collateral token.
    pub tok: TokenHandle,
    /// Decimals of `tok`.
    pub tok_decimals: u8,
    /// Reward token.
    pub reward_token: TokenHandle,
    /// Primary actor.
    pub alice: Option<Signer>,
}

impl CollateralFixtureContext {
    /// Checks the context invariants against the chain.
    ///
    /// # Errors
    ///
    /// Returns [`HookError::Fixture`] when `tok` equals `reward_token` or
    /// `tok_decimals` disagrees with the ledger.
    pub fn validate(&self, chain: &Chain) -> Result<(), HookError> {
        if self.tok == self.reward_token {
            return Err(HookError::Fixture(
                "collateral token and reward token must differ".to_string(),
            ));
        }
        let decimals = self.tok.decimals(chain)?;
        if decimals != self.tok_decimals {
            return Err(HookError::Fixture(format!(
                "tok_decimals {} does not match token decimals {decimals}",
                self.tok_decimals
            )));
        }
        Ok(())
    }
}

/// Scenario context usable by the generic driver.
pub trait FixtureContext {
    /// Returns the embedded base context.
    fn base(&self) -> &CollateralFixtureContext;

    /// Returns the embedded base context mutably.
    fn base_mut(&mut self) -> &mut CollateralFixtureContext;
}

impl FixtureContext for CollateralFixtureContext {
    fn base(&self) -> &CollateralFixtureContext {
        self
    }

    fn base_mut(&mut self) -> &mut CollateralFixtureContext {
        self
    }
}

// ============================================================================
// SECTION: Fixture
// ============================================================================

/// Scenario builder signature.
pub type FixtureBuilder<T> = Box<dyn Fn(&mut Chain) -> Result<T, HookError>>;

/// Repeatable scenario builder.
///
/// The first load checkpoints the chain before building; every later load
/// restores that checkpoint first, so loads never observe each other or any
/// other fixture on the same chain. A fixture is scoped to one fork: after
/// a reset its loads fail with [`ChainError::StaleFork`].
pub struct Fixture<T> {
    /// Builds the context on the current chain state.
    build: FixtureBuilder<T>,
    /// Pre-build state captured by the first load.
    checkpoint: Option<Checkpoint>,
}

impl<T> Fixture<T> {
    /// Wraps a builder.
    #[must_use]
    pub fn new(build: impl Fn(&mut Chain) -> Result<T, HookError> + 'static) -> Self {
        Self { build: Box::new(build), checkpoint: None }
    }

    /// Builds a fresh context.
    ///
    /// # Errors
    ///
    /// Returns [`HookError::Chain`] when the fork was reset since the first
    /// load, or the builder's error.
    pub fn load(&mut self, chain: &mut Chain) -> Result<T, HookError> {
        match &self.checkpoint {
            Some(checkpoint) => chain.restore(checkpoint)?,
            None => self.checkpoint = Some(chain.checkpoint()),
        }
        (self.build)(chain)
    }
}

// ============================================================================
// SECTION: Hook Signatures
// ============================================================================

/// Deploys a collateral from options.
pub type DeployCollateralFunc =
    Box<dyn Fn(&mut Chain, &CollateralOpts) -> Result<Box<dyn Collateral>, HookError>>;

/// Builds a fixture for `alice` deploying with the given options.
pub type MakeCollateralFixtureFunc<T> = Box<dyn Fn(Signer, CollateralOpts) -> Fixture<T>>;

/// Mints `amount` collateral tokens from `user` to `recipient`.
pub type MintCollateralFunc<T> =
    Box<dyn Fn(&mut Chain, &T, u128, &Signer, Address) -> Result<(), HookError>>;

/// Moves the collateral's underlying reference rate.
pub type RefPerTokFunc<T> = Box<dyn Fn(&mut Chain, &mut T) -> Result<(), HookError>>;

/// Prepares a context before each reward case.
pub type BeforeEachRewardsFunc<T> = Box<dyn Fn(&mut Chain, &mut T) -> Result<(), HookError>>;

/// Restores the chain to the suite's forked genesis.
pub type ResetForkFunc = Box<dyn Fn(&mut Chain) -> Result<(), HookError>>;

/// Registers collateral-specific cases into a group.
pub type RegisterCasesFunc<T> = Box<dyn Fn(&mut TestGroup<T>)>;

// ============================================================================
// SECTION: Registrant
// ============================================================================

/// Whether a capability-dependent case runs or is reported as pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestRegistrant {
    /// Register a runnable case.
    Active,
    /// Register a pending case.
    Pending,
}

// ============================================================================
// SECTION: Hook Bundle
// ============================================================================

/// Hooks a concrete collateral suite hands to the generic driver.
pub struct CollateralTestSuiteFixtures<T> {
    /// Deploys a collateral from options.
    pub deploy_collateral: DeployCollateralFunc,
    /// Adds constructor cases specific to this collateral.
    pub collateral_specific_constructor_tests: RegisterCasesFunc<T>,
    /// Adds status cases specific to this collateral.
    pub collateral_specific_status_tests: RegisterCasesFunc<T>,
    /// Runs before each reward case.
    pub before_each_rewards_test: BeforeEachRewardsFunc<T>,
    /// Builds scenario fixtures.
    pub make_collateral_fixture_context: MakeCollateralFixtureFunc<T>,
    /// Mints collateral tokens.
    pub mint_collateral_to: MintCollateralFunc<T>,
    /// Lowers the underlying reference rate.
    pub reduce_ref_per_tok: RefPerTokFunc<T>,
    /// Raises the underlying reference rate.
    pub increase_ref_per_tok: RefPerTokFunc<T>,
    /// Gates the reward claim case.
    pub it_claims_rewards: TestRegistrant,
    /// Gates cases that move the reference rate.
    pub it_checks_ref_per_tok_default: TestRegistrant,
    /// Gates the revenue hiding case.
    pub it_has_revenue_hiding: TestRegistrant,
    /// Restores the forked genesis.
    pub reset_fork: ResetForkFunc,
    /// Display name of the suite.
    pub collateral_name: String,
    /// Raw feed answer that prices the collateral at its peg.
    pub chainlink_default_answer: i128,
}
