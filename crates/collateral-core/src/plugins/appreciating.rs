// collateral-core/src/plugins/appreciating.rs
// ============================================================================
// Module: Appreciating Collateral
// Description: Collateral whose token accrues value in its reference unit.
// Purpose: Reference plugin for yield-bearing vault shares with revenue hiding.
// Dependencies: crate::{chain, core, interfaces, plugins}
// ============================================================================

//! ## Overview
//! The collateral token is a [`crate::RateVault`] share whose underlying
//! rate only ever grows in normal operation. The plugin exposes a slightly
//! discounted rate (`underlying * (1 - revenue_hiding)`) so that small
//! rounding dips in the underlying do not default it. A drop below the
//! exposed rate is a hard default.
//!
//! ## Invariants
//! - The exposed `refPerTok` never decreases unless the collateral defaults.
//! - Once DISABLED the exposed rate still tracks the underlying downward.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::chain::Chain;
use crate::chain::events::ChainEvent;
use crate::core::fixed::Fix;
use crate::core::fixed::Rounding;
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

/// Appreciating vault-share collateral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppreciatingCollateral {
    /// Shared state.
    base: CollateralBase,
    /// `1 - revenue_hiding`.
    revenue_showing: Fix,
    /// Reference rate reported to callers.
    exposed_ref_per_tok: Fix,
}

impl AppreciatingCollateral {
    /// Plugin kind label.
    pub const KIND: &'static str = "appreciating";

    /// Validates `config` and deploys the plugin, then refreshes once.
    ///
    /// # Errors
    ///
    /// Returns [`CollateralError::InvalidConfig`] when validation fails or
    /// the collateral token is not a vault share.
    pub fn new(chain: &mut Chain, config: CollateralConfig) -> Result<Self, CollateralError> {
        if config.default_threshold.is_zero() {
            return Err(CollateralError::InvalidConfig("defaultThreshold zero".to_string()));
        }
        if config.revenue_hiding >= Fix::ONE {
            return Err(CollateralError::InvalidConfig("revenueHiding out of range".to_string()));
        }
        let revenue_showing = Fix::ONE.checked_sub(config.revenue_hiding)?;
        let base = CollateralBase::new(chain, config)?;
        let underlying = chain.vault_rate(base.config().erc20)?;
        let exposed_ref_per_tok = underlying.mul(revenue_showing, Rounding::Floor)?;
        let mut collateral = Self { base, revenue_showing, exposed_ref_per_tok };
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

    /// Returns the live underlying rate.
    ///
    /// # Errors
    ///
    /// Returns [`CollateralError::Chain`] when the vault is gone.
    pub fn underlying_ref_per_tok(&self, chain: &Chain) -> Result<Fix, CollateralError> {
        Ok(chain.vault_rate(self.base.config().erc20)?)
    }
}

impl Collateral for AppreciatingCollateral {
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
        Ok(self.exposed_ref_per_tok)
    }

    fn target_per_ref(&self) -> Fix {
        Fix::ONE
    }

    fn try_price(&self, chain: &Chain) -> Result<PriceQuote, CollateralError> {
        let underlying = self.underlying_ref_per_tok(chain)?;
        self.base.quote(chain, underlying)
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
        let underlying = self.underlying_ref_per_tok(chain)?;
        if underlying < self.exposed_ref_per_tok {
            self.exposed_ref_per_tok = underlying;
            self.base.mark(CollateralStatus::Disabled, now);
        } else {
            let hidden = underlying.mul(self.revenue_showing, Rounding::Floor)?;
            if hidden > self.exposed_ref_per_tok {
                self.exposed_ref_per_tok = hidden;
            }
        }
        if !self.base.lifecycle().already_defaulted(now) {
            let quote = self.try_price(chain);
            let observed = self.base.assess_quote(now, quote)?;
            self.base.mark(observed, now);
        }
        Ok(self.base.finish_refresh(chain))
    }

    fn claim_rewards(&mut self, chain: &mut Chain) -> Result<Vec<RewardsClaimed>, CollateralError> {
        let collateral = self.base.address();
        let Some((erc20, amount)) = chain.claim_vault_rewards(self.base.config().erc20, collateral)?
        else {
            return Ok(Vec::new());
        };
        chain.emit(ChainEvent::RewardsClaimed { collateral, erc20, amount });
        Ok(vec![RewardsClaimed { erc20, amount }])
    }
}
