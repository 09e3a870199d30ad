// collateral-core/src/interfaces/mod.rs
// ============================================================================
// Module: Collateral Interfaces
// Description: Backend-agnostic interface every collateral plugin implements.
// Purpose: Let one generic test battery drive any collateral kind.
// Dependencies: crate::{chain, core}, serde, thiserror
// ============================================================================

//! ## Overview
//! [`Collateral`] is the seam between the harness and concrete plugins. It
//! exposes configuration accessors, status, reference and target rates,
//! pricing, balances, `refresh`, and reward claims. All chain access goes
//! through the borrowed [`Chain`], so a plugin never owns network state.
//!
//! Security posture: plugin constructors are the only validation point for
//! deployment parameters; callers may pass anything a user could.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::chain::Chain;
use crate::chain::ChainError;
use crate::chain::oracle::OracleError;
use crate::core::fixed::Fix;
use crate::core::fixed::FixError;
use crate::core::identifiers::Address;
use crate::core::identifiers::TargetName;
use crate::core::opts::CollateralConfig;
use crate::core::opts::OptsError;
use crate::core::status::CollateralStatus;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Collateral plugin errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollateralError {
    /// Constructor argument rejected.
    #[error("{0}")]
    InvalidConfig(String),
    /// Price feed read failed.
    #[error(transparent)]
    Oracle(#[from] OracleError),
    /// Chain access failed.
    #[error(transparent)]
    Chain(#[from] ChainError),
    /// Arithmetic failed.
    #[error(transparent)]
    Math(#[from] FixError),
    /// Options could not be resolved.
    #[error(transparent)]
    Opts(#[from] OptsError),
}

// ============================================================================
// SECTION: Price Types
// ============================================================================

/// Price range in units of account per token.
///
/// # Invariants
/// - `low <= high`.
/// - `(0, Fix::MAX)` means "no price".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    /// Lower bound.
    pub low: Fix,
    /// Upper bound.
    pub high: Fix,
}

impl PriceRange {
    /// The "no price" range.
    pub const UNPRICED: Self = Self { low: Fix::ZERO, high: Fix::MAX };
}

/// Live price quote with the peg price used for default checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Lower bound.
    pub low: Fix,
    /// Upper bound.
    pub high: Fix,
    /// Units of target per reference unit.
    pub peg: Fix,
}

impl PriceQuote {
    /// Drops the peg price.
    #[must_use]
    pub const fn range(self) -> PriceRange {
        PriceRange { low: self.low, high: self.high }
    }
}

/// One reward token paid out by a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardsClaimed {
    /// Reward token.
    pub erc20: Address,
    /// Amount in token units.
    pub amount: u128,
}

// ============================================================================
// SECTION: Collateral
// ============================================================================

/// Collateral plugin.
pub trait Collateral {
    /// Returns the plugin address.
    fn address(&self) -> Address;

    /// Returns the plugin kind, e.g. `fiat`.
    fn kind(&self) -> &'static str;

    /// Returns the resolved constructor arguments.
    fn config(&self) -> &CollateralConfig;

    /// Returns the collateral token.
    fn erc20(&self) -> Address {
        self.config().erc20
    }

    /// Returns the unit of account.
    fn target_name(&self) -> &TargetName {
        &self.config().target_name
    }

    /// Returns the reward token.
    fn reward_erc20(&self) -> Address {
        self.config().reward_erc20
    }

    /// Returns the maximum trade volume.
    fn max_trade_volume(&self) -> Fix {
        self.config().max_trade_volume
    }

    /// Returns true; every plugin here is a collateral.
    fn is_collateral(&self) -> bool {
        true
    }

    /// Returns the status at the current block time.
    fn status(&self, chain: &Chain) -> CollateralStatus;

    /// Returns the scheduled default time, [`Timestamp::NEVER`] when SOUND.
    fn when_default(&self) -> Timestamp;

    /// Returns reference units per token as of the last refresh.
    ///
    /// # Errors
    ///
    /// Returns [`CollateralError`] when the rate source cannot be read.
    fn ref_per_tok(&self, chain: &Chain) -> Result<Fix, CollateralError>;

    /// Returns target units per reference unit.
    fn target_per_ref(&self) -> Fix;

    /// Quotes a live price.
    ///
    /// # Errors
    ///
    /// Returns [`CollateralError::Oracle`] when the feed is stale or invalid.
    fn try_price(&self, chain: &Chain) -> Result<PriceQuote, CollateralError>;

    /// Returns the live price, falling back to the decayed saved price.
    fn price(&self, chain: &Chain) -> PriceRange;

    /// Returns when prices were last saved.
    fn last_save(&self) -> Timestamp;

    /// Returns the collateral token balance of `account` in whole tokens.
    ///
    /// # Errors
    ///
    /// Returns [`CollateralError::Chain`] for unknown tokens.
    fn bal(&self, chain: &Chain, account: Address) -> Result<Fix, CollateralError>;

    /// Updates rates, saved prices, and status.
    ///
    /// # Errors
    ///
    /// Returns [`CollateralError`] only for failures that cannot be
    /// expressed as a status change.
    fn refresh(&mut self, chain: &mut Chain) -> Result<CollateralStatus, CollateralError>;

    /// Claims rewards owed to the plugin.
    ///
    /// # Errors
    ///
    /// Returns [`CollateralError`] when the reward source fails.
    fn claim_rewards(&mut self, chain: &mut Chain) -> Result<Vec<RewardsClaimed>, CollateralError>;
}
