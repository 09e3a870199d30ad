// collateral-core/src/plugins/fiat.rs
// ============================================================================
// Module: Fiat Collateral
// Description: Collateral pegged one-to-one to its unit of account.
// Purpose: Reference plugin for stablecoins priced by a single feed.
// Dependencies: crate::{chain, core, interfaces, plugins}
// ============================================================================

//! ## Overview
//! A fiat collateral's token is its own reference unit (`refPerTok = 1`) and
//! one reference unit is one target unit. Health depends only on the feed:
//! an off-peg or zero price, or a failing feed, marks IFFY.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::chain::Chain;
use crate::core::fixed::Fix;
use crate::core::identifiers::Address;
use crate::core::opts::CollateralConfig;
use crate::core::opts::CollateralOpts;
use crate::core::status::CollateralStatus;
use crate::core::time::Timestamp;
use crate::interfaces::Collateral;
use crate::interfaces::CollateralError;
use crate::interfaces::PriceQuote;
use crate::interfaces::PriceRange;
use crate::interfaces::RewardsClaimed;
use crate::plugins::base::CollateralBase;

// ============================================================================
// SECTION: Plugin
// ============================================================================

/// Fiat-pegged collateral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiatCollateral {
    /// Shared state.
    base: CollateralBase,
}

impl FiatCollateral {
    /// Plugin kind label.
    pub const KIND: &'static str = "fiat";

    /// Validates `config` and deploys the plugin, then refreshes once.
    ///
    /// # Errors
    ///
    /// Returns [`CollateralError::InvalidConfig`] when validation fails.
    pub fn new(chain: &mut Chain, config: CollateralConfig) -> Result<Self, CollateralError> {
        let mut collateral = Self { base: CollateralBase::new(chain, config)? };
        collateral.refresh(chain)?;
        Ok(collateral)
    }

    /// Resolves `opts` against `defaults` and deploys.
    ///
    /// # Errors
    ///
    /// Returns [`CollateralError`] when options or validation fail.
    pub fn deploy(
        chain: &mut Chain,
        opts: &CollateralOpts,
        defaults: &CollateralConfig,
    ) -> Result<Self, CollateralError> {
        Self::new(chain, opts.resolve(defaults)?)
    }

    /// Returns the shared state.
    #[must_use]
    pub const fn base(&self) -> &CollateralBase {
        &self.base
    }
}

impl Collateral for FiatCollateral {
    fn address(&self) -> Address {
        self.base.address()
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn config(&self) -> &CollateralConfig {
        self.base.config()
    }

    fn status(&self, chain: &Chain) -> CollateralStatus {
        self.base.status(chain)
    }

    fn when_default(&self) -> Timestamp {
        self.base.lifecycle().when_default()
    }

    fn ref_per_tok(&self, _chain: &Chain) -> Result<Fix, CollateralError> {
        Ok(Fix::ONE)
    }

    fn target_per_ref(&self) -> Fix {
        Fix::ONE
    }

    fn try_price(&self, chain: &Chain) -> Result<PriceQuote, CollateralError> {
        self.base.quote(chain, Fix::ONE)
    }

    fn price(&self, chain: &Chain) -> PriceRange {
        self.base.price(chain, self.try_price(chain))
    }

    fn last_save(&self) -> Timestamp {
        self.base.saved().last_save()
    }

    fn bal(&self, chain: &Chain, account: Address) -> Result<Fix, CollateralError> {
        self.base.bal(chain, account)
    }

    fn refresh(&mut self, chain: &mut Chain) -> Result<CollateralStatus, CollateralError> {
        let now = chain.now();
        if !self.base.lifecycle().already_defaulted(now) {
            let quote = self.try_price(chain);
            let observed = self.base.assess_quote(now, quote)?;
            self.base.mark(observed, now);
        }
        Ok(self.base.finish_refresh(chain))
    }

    fn claim_rewards(&mut self, _chain: &mut Chain) -> Result<Vec<RewardsClaimed>, CollateralError> {
        Ok(Vec::new())
    }
}
