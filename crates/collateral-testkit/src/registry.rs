// collateral-testkit/src/registry.rs
// ============================================================================
// Module: Case Registry
// Description: Named case groups, case bodies, and the per-case environment.
// Purpose: Hold the registered battery until the driver runs it.
// Dependencies: collateral-core, thiserror
// ============================================================================

//! ## Overview
//! Cases are registered into [`TestGroup`]s. A group either loads a fresh
//! fixture context before each case or leaves context construction to the
//! case body; reward groups additionally run the suite's
//! `before_each_rewards_test` hook. Case bodies receive a [`CaseEnv`] and
//! report failures as [`CaseFailure`] values instead of panicking.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use collateral_core::Address;
use collateral_core::Chain;
use collateral_core::ChainError;
use collateral_core::Collateral;
use collateral_core::CollateralError;
use collateral_core::CollateralOpts;
use collateral_core::CollateralStatus;
use collateral_core::Fix;
use collateral_core::FixError;
use collateral_core::PriceRange;
use collateral_core::RewardsClaimed;
use collateral_core::Signer;
use thiserror::Error;

use crate::fixtures::CollateralTestSuiteFixtures;
use crate::fixtures::FixtureContext;
use crate::fixtures::HookError;
use crate::fixtures::TestRegistrant;

// ============================================================================
// SECTION: Failures
// ============================================================================

/// Failed assertion or hook inside a case body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CaseFailure {
    /// Human-readable reason.
    pub message: String,
}

impl CaseFailure {
    /// Creates a failure.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<HookError> for CaseFailure {
    fn from(error: HookError) -> Self {
        Self::new(error.to_string())
    }
}

impl From<CollateralError> for CaseFailure {
    fn from(error: CollateralError) -> Self {
        Self::new(error.to_string())
    }
}

impl From<ChainError> for CaseFailure {
    fn from(error: ChainError) -> Self {
        Self::new(error.to_string())
    }
}

impl From<FixError> for CaseFailure {
    fn from(error: FixError) -> Self {
        Self::new(error.to_string())
    }
}

/// Fails with `message` unless `condition` holds.
///
/// # Errors
///
/// Returns [`CaseFailure`] when `condition` is false.
pub fn ensure(condition: bool, message: impl Into<String>) -> Result<(), CaseFailure> {
    if condition { Ok(()) } else { Err(CaseFailure::new(message)) }
}

/// Fails unless `actual == expected`.
///
/// # Errors
///
/// Returns [`CaseFailure`] naming `what` and both values.
pub fn ensure_eq<V: PartialEq + fmt::Display>(
    actual: V,
    expected: V,
    what: &str,
) -> Result<(), CaseFailure> {
    if actual == expected {
        Ok(())
    } else {
        Err(CaseFailure::new(format!("{what}: expected {expected}, got {actual}")))
    }
}

/// Fails unless `result` is an error whose message contains `needle`.
///
/// # Errors
///
/// Returns [`CaseFailure`] on success or on an unrelated error.
pub fn expect_error_containing<V, E: fmt::Display>(
    result: Result<V, E>,
    needle: &str,
) -> Result<(), CaseFailure> {
    match result {
        Ok(_) => Err(CaseFailure::new(format!("expected error containing '{needle}', got success"))),
        Err(error) => {
            let message = error.to_string();
            ensure(
                message.contains(needle),
                format!("expected error containing '{needle}', got '{message}'"),
            )
        }
    }
}

// ============================================================================
// SECTION: Case Environment
// ============================================================================

/// State lent to one case body.
pub struct CaseEnv<'a, T> {
    /// Chain, freshly reset for this case.
    pub chain: &'a mut Chain,
    /// Context loaded for the case, when the group loads one.
    pub ctx: Option<T>,
    /// Primary actor.
    pub alice: Signer,
    /// Suite hooks.
    pub fixtures: &'a CollateralTestSuiteFixtures<T>,
}

impl<T: FixtureContext + 'static> CaseEnv<'_, T> {
    /// Returns the loaded context.
    ///
    /// # Errors
    ///
    /// Returns [`CaseFailure`] when no context is loaded.
    pub fn ctx(&self) -> Result<&T, CaseFailure> {
        self.ctx.as_ref().ok_or_else(|| CaseFailure::new("no fixture context loaded"))
    }

    /// Returns the loaded context mutably.
    ///
    /// # Errors
    ///
    /// Returns [`CaseFailure`] when no context is loaded.
    pub fn ctx_mut(&mut self) -> Result<&mut T, CaseFailure> {
        self.ctx.as_mut().ok_or_else(|| CaseFailure::new("no fixture context loaded"))
    }

    /// Returns the context's collateral.
    ///
    /// # Errors
    ///
    /// Returns [`CaseFailure`] when no context is loaded.
    pub fn collateral(&self) -> Result<&dyn Collateral, CaseFailure> {
        Ok(self.ctx()?.base().collateral.as_ref())
    }

    /// Deploys a collateral through the suite hook.
    ///
    /// # Errors
    ///
    /// Returns [`HookError`] when the deploy hook fails.
    pub fn deploy(&mut self, opts: &CollateralOpts) -> Result<Box<dyn Collateral>, HookError> {
        (self.fixtures.deploy_collateral)(self.chain, opts)
    }

    /// Builds a fixture with `opts` and replaces the loaded context.
    ///
    /// # Errors
    ///
    /// Returns [`CaseFailure`] when the fixture fails to load or validate.
    pub fn load_fixture(&mut self, opts: CollateralOpts) -> Result<(), CaseFailure> {
        let mut fixture = (self.fixtures.make_collateral_fixture_context)(self.alice.clone(), opts);
        let ctx = fixture.load(self.chain)?;
        ctx.base().validate(self.chain)?;
        self.ctx = Some(ctx);
        Ok(())
    }

    /// Refreshes the context's collateral.
    ///
    /// # Errors
    ///
    /// Returns [`CaseFailure`] when no context is loaded or refresh fails.
    pub fn refresh(&mut self) -> Result<CollateralStatus, CaseFailure> {
        let ctx = self.ctx.as_mut().ok_or_else(|| CaseFailure::new("no fixture context loaded"))?;
        Ok(ctx.base_mut().collateral.refresh(self.chain)?)
    }

    /// Returns the collateral status.
    ///
    /// # Errors
    ///
    /// Returns [`CaseFailure`] when no context is loaded.
    pub fn status(&self) -> Result<CollateralStatus, CaseFailure> {
        Ok(self.collateral()?.status(self.chain))
    }

    /// Returns the collateral reference rate.
    ///
    /// # Errors
    ///
    /// Returns [`CaseFailure`] when no context is loaded or the rate read fails.
    pub fn ref_per_tok(&self) -> Result<Fix, CaseFailure> {
        Ok(self.collateral()?.ref_per_tok(self.chain)?)
    }

    /// Returns the collateral price range.
    ///
    /// # Errors
    ///
    /// Returns [`CaseFailure`] when no context is loaded.
    pub fn price(&self) -> Result<PriceRange, CaseFailure> {
        Ok(self.collateral()?.price(self.chain))
    }

    /// Publishes a raw answer on the context's feed.
    ///
    /// # Errors
    ///
    /// Returns [`CaseFailure`] when no context is loaded or the feed is unknown.
    pub fn set_answer(&mut self, answer: i128) -> Result<(), CaseFailure> {
        let feed = self.ctx()?.base().chainlink_feed;
        Ok(feed.update_answer(self.chain, answer)?)
    }

    /// Mints `amount` collateral tokens from `alice` to `recipient`.
    ///
    /// # Errors
    ///
    /// Returns [`CaseFailure`] when no context is loaded or the hook fails.
    pub fn mint_collateral_to(&mut self, amount: u128, recipient: Address) -> Result<(), CaseFailure> {
        let ctx = self.ctx.as_ref().ok_or_else(|| CaseFailure::new("no fixture context loaded"))?;
        Ok((self.fixtures.mint_collateral_to)(self.chain, ctx, amount, &self.alice, recipient)?)
    }

    /// Lowers the underlying reference rate through the suite hook.
    ///
    /// # Errors
    ///
    /// Returns [`CaseFailure`] when no context is loaded or the hook fails.
    pub fn reduce_ref_per_tok(&mut self) -> Result<(), CaseFailure> {
        let ctx = self.ctx.as_mut().ok_or_else(|| CaseFailure::new("no fixture context loaded"))?;
        Ok((self.fixtures.reduce_ref_per_tok)(self.chain, ctx)?)
    }

    /// Raises the underlying reference rate through the suite hook.
    ///
    /// # Errors
    ///
    /// Returns [`CaseFailure`] when no context is loaded or the hook fails.
    pub fn increase_ref_per_tok(&mut self) -> Result<(), CaseFailure> {
        let ctx = self.ctx.as_mut().ok_or_else(|| CaseFailure::new("no fixture context loaded"))?;
        Ok((self.fixtures.increase_ref_per_tok)(self.chain, ctx)?)
    }

    /// Runs the suite's `before_each_rewards_test` hook on the context.
    ///
    /// # Errors
    ///
    /// Returns [`CaseFailure`] when no context is loaded or the hook fails.
    pub fn prepare_rewards(&mut self) -> Result<(), CaseFailure> {
        let ctx = self.ctx.as_mut().ok_or_else(|| CaseFailure::new("no fixture context loaded"))?;
        Ok((self.fixtures.before_each_rewards_test)(self.chain, ctx)?)
    }

    /// Claims rewards on the context's collateral.
    ///
    /// # Errors
    ///
    /// Returns [`CaseFailure`] when no context is loaded or the claim fails.
    pub fn claim_rewards(&mut self) -> Result<Vec<RewardsClaimed>, CaseFailure> {
        let ctx = self.ctx.as_mut().ok_or_else(|| CaseFailure::new("no fixture context loaded"))?;
        Ok(ctx.base_mut().collateral.claim_rewards(self.chain)?)
    }

    /// Restores the forked genesis through the suite hook and drops the context.
    ///
    /// # Errors
    ///
    /// Returns [`CaseFailure`] when the hook fails.
    pub fn reset_fork(&mut self) -> Result<(), CaseFailure> {
        self.ctx = None;
        Ok((self.fixtures.reset_fork)(self.chain)?)
    }
}

// ============================================================================
// SECTION: Cases
// ============================================================================

/// Case body signature.
pub type CaseBody<T> = Box<dyn Fn(&mut CaseEnv<'_, T>) -> Result<(), CaseFailure>>;

/// Registered case kind.
pub enum Case<T> {
    /// Runs the body.
    Runnable(CaseBody<T>),
    /// Reported as pending without running.
    Pending,
}

/// Named case.
pub struct TestCase<T> {
    /// Case name.
    pub name: String,
    /// Case kind.
    pub case: Case<T>,
}

/// Group of cases sharing setup.
pub struct TestGroup<T> {
    /// Group name.
    name: String,
    /// Whether a fixture context is loaded before each case.
    with_context: bool,
    /// Whether `before_each_rewards_test` runs before each case.
    rewards: bool,
    /// Registered cases in order.
    cases: Vec<TestCase<T>>,
}

impl<T: 'static> TestGroup<T> {
    /// Creates a group that loads a context before each case.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), with_context: true, rewards: false, cases: Vec::new() }
    }

    /// Creates a group whose cases build their own state.
    #[must_use]
    pub fn without_context(name: impl Into<String>) -> Self {
        Self { name: name.into(), with_context: false, rewards: false, cases: Vec::new() }
    }

    /// Creates a reward group: context plus `before_each_rewards_test`.
    #[must_use]
    pub fn rewards(name: impl Into<String>) -> Self {
        Self { name: name.into(), with_context: true, rewards: true, cases: Vec::new() }
    }

    /// Registers a runnable case.
    pub fn it(
        &mut self,
        name: impl Into<String>,
        body: impl Fn(&mut CaseEnv<'_, T>) -> Result<(), CaseFailure> + 'static,
    ) {
        self.cases.push(TestCase { name: name.into(), case: Case::Runnable(Box::new(body)) });
    }

    /// Registers a pending case.
    pub fn pending(&mut self, name: impl Into<String>) {
        self.cases.push(TestCase { name: name.into(), case: Case::Pending });
    }

    /// Registers a case as runnable or pending according to `registrant`.
    pub fn register(
        &mut self,
        registrant: TestRegistrant,
        name: impl Into<String>,
        body: impl Fn(&mut CaseEnv<'_, T>) -> Result<(), CaseFailure> + 'static,
    ) {
        match registrant {
            TestRegistrant::Active => self.it(name, body),
            TestRegistrant::Pending => self.pending(name),
        }
    }

    /// Returns the group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true when a context is loaded before each case.
    #[must_use]
    pub const fn with_context(&self) -> bool {
        self.with_context
    }

    /// Returns true for reward groups.
    #[must_use]
    pub const fn is_rewards(&self) -> bool {
        self.rewards
    }

    /// Returns the registered cases.
    #[must_use]
    pub fn cases(&self) -> &[TestCase<T>] {
        &self.cases
    }
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Ordered collection of groups.
pub struct TestRegistry<T> {
    /// Registered groups in order.
    groups: Vec<TestGroup<T>>,
}

impl<T: 'static> Default for TestRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> TestRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self { groups: Vec::new() }
    }

    /// Appends a group.
    pub fn add_group(&mut self, group: TestGroup<T>) {
        self.groups.push(group);
    }

    /// Returns the groups.
    #[must_use]
    pub fn groups(&self) -> &[TestGroup<T>] {
        &self.groups
    }

    /// Returns the total number of cases.
    #[must_use]
    pub fn case_count(&self) -> usize {
        self.groups.iter().map(|group| group.cases.len()).sum()
    }

    /// Returns `group: case` names in registration order.
    #[must_use]
    pub fn case_names(&self) -> Vec<String> {
        self.groups
            .iter()
            .flat_map(|group| {
                group.cases.iter().map(move |case| format!("{}: {}", group.name, case.name))
            })
            .collect()
    }
}
