// collateral-core/src/plugins/base.rs
// ============================================================================
// Module: Collateral Base
// Description: Shared constructor validation, pricing, and status bookkeeping.
// Purpose: Keep per-kind plugins down to their reference-rate logic.
// Dependencies: crate::{chain, core, interfaces}
// ============================================================================

//! ## Overview
//! [`CollateralBase`] carries what every plugin kind shares: the resolved
//! configuration, the default timer, the saved price, and the peg window.
//! Plugins call [`CollateralBase::quote`] with their underlying reference
//! rate and feed the result to [`CollateralBase::assess_quote`] during
//! refresh.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::chain::Chain;
use crate::chain::events::ChainEvent;
use crate::chain::oracle::read_feed_price;
use crate::core::fixed::Fix;
use crate::core::fixed::Rounding;
use crate::core::identifiers::Address;
use crate::core::opts::CollateralConfig;
use crate::core::opts::MAX_DELAY_UNTIL_DEFAULT_SECS;
use crate::core::status::CollateralStatus;
use crate::core::time::Timestamp;
use crate::interfaces::CollateralError;
use crate::interfaces::PriceQuote;
use crate::interfaces::PriceRange;
use crate::plugins::lifecycle::DefaultLifecycle;
use crate::plugins::lifecycle::SavedPrice;

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Builds a constructor rejection.
fn reject(message: &str) -> CollateralError {
    CollateralError::InvalidConfig(message.to_string())
}

/// Checks the constructor arguments common to every plugin kind.
///
/// # Errors
///
/// Returns [`CollateralError::InvalidConfig`] with the first failing rule.
pub fn validate_common(config: &CollateralConfig) -> Result<(), CollateralError> {
    if config.erc20.is_zero() {
        return Err(reject("missing erc20"));
    }
    if config.target_name.is_empty() {
        return Err(reject("targetName missing"));
    }
    if config.chainlink_feed.is_zero() {
        return Err(reject("missing chainlink feed"));
    }
    if config.price_timeout == 0 {
        return Err(reject("price timeout zero"));
    }
    if config.oracle_error.is_zero() || config.oracle_error >= Fix::ONE {
        return Err(reject("oracle error out of range"));
    }
    if config.oracle_timeout == 0 {
        return Err(reject("oracleTimeout zero"));
    }
    if config.max_trade_volume.is_zero() {
        return Err(reject("invalid max trade volume"));
    }
    if config.delay_until_default > MAX_DELAY_UNTIL_DEFAULT_SECS {
        return Err(reject("delayUntilDefault too long"));
    }
    if !config.default_threshold.is_zero() && config.delay_until_default == 0 {
        return Err(reject("delayUntilDefault zero"));
    }
    if config.default_threshold >= Fix::ONE {
        return Err(reject("defaultThreshold out of range"));
    }
    if config.reward_erc20 == config.erc20 {
        return Err(reject("reward token must differ from collateral token"));
    }
    Ok(())
}

// ============================================================================
// SECTION: Base State
// ============================================================================

/// State shared by all plugin kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollateralBase {
    /// Plugin address.
    address: Address,
    /// Resolved constructor arguments.
    config: CollateralConfig,
    /// Default timer.
    lifecycle: DefaultLifecycle,
    /// Last good price.
    saved: SavedPrice,
    /// Lowest acceptable peg price.
    peg_bottom: Fix,
    /// Highest acceptable peg price.
    peg_top: Fix,
    /// Status observed by the last refresh.
    reported: CollateralStatus,
}

impl CollateralBase {
    /// Validates `config` and allocates a plugin address.
    ///
    /// # Errors
    ///
    /// Returns [`CollateralError::InvalidConfig`] when validation fails.
    pub fn new(chain: &mut Chain, config: CollateralConfig) -> Result<Self, CollateralError> {
        validate_common(&config)?;
        let target_per_ref = Fix::ONE;
        let delta = target_per_ref.mul(config.default_threshold, Rounding::Floor)?;
        let peg_bottom = target_per_ref.saturating_sub(delta);
        let peg_top = target_per_ref.checked_add(delta)?;
        let address = chain.next_address("collateral");
        Ok(Self {
            address,
            config,
            lifecycle: DefaultLifecycle::new(),
            saved: SavedPrice::default(),
            peg_bottom,
            peg_top,
            reported: CollateralStatus::Sound,
        })
    }

    /// Returns the plugin address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Returns the resolved constructor arguments.
    #[must_use]
    pub const fn config(&self) -> &CollateralConfig {
        &self.config
    }

    /// Returns the default timer.
    #[must_use]
    pub const fn lifecycle(&self) -> &DefaultLifecycle {
        &self.lifecycle
    }

    /// Returns the saved price.
    #[must_use]
    pub const fn saved(&self) -> &SavedPrice {
        &self.saved
    }

    /// Returns the status at the chain's current time.
    #[must_use]
    pub fn status(&self, chain: &Chain) -> CollateralStatus {
        self.lifecycle.status(chain.now())
    }

    /// Quotes a live price for a token worth `ref_per_tok` reference units.
    ///
    /// # Errors
    ///
    /// Returns [`CollateralError::Oracle`] for stale or invalid feeds and
    /// [`CollateralError::Math`] on overflow.
    pub fn quote(&self, chain: &Chain, ref_per_tok: Fix) -> Result<PriceQuote, CollateralError> {
        let price = read_feed_price(chain, self.config.chainlink_feed, self.config.oracle_timeout)?;
        let error = price.mul(self.config.oracle_error, Rounding::Ceil)?;
        let low = price.saturating_sub(error).mul(ref_per_tok, Rounding::Floor)?;
        let high = price.checked_add(error)?.mul(ref_per_tok, Rounding::Ceil)?;
        Ok(PriceQuote { low, high, peg: price })
    }

    /// Returns `quote` when usable, otherwise the decayed saved price.
    #[must_use]
    pub fn price(&self, chain: &Chain, quote: Result<PriceQuote, CollateralError>) -> PriceRange {
        match quote {
            Ok(quote) if quote.high < Fix::MAX => quote.range(),
            _ => self.saved.decayed(
                chain.now(),
                self.config.oracle_timeout,
                self.config.price_timeout,
            ),
        }
    }

    /// Saves a usable quote and returns the status it implies.
    ///
    /// Oracle and math failures imply IFFY. Chain failures propagate.
    ///
    /// # Errors
    ///
    /// Returns [`CollateralError`] for failures unrelated to pricing.
    pub fn assess_quote(
        &mut self,
        now: Timestamp,
        quote: Result<PriceQuote, CollateralError>,
    ) -> Result<CollateralStatus, CollateralError> {
        match quote {
            Ok(quote) => {
                if quote.high < Fix::MAX {
                    self.saved.save(quote.range(), now);
                }
                let off_peg = !self.config.default_threshold.is_zero()
                    && (quote.peg < self.peg_bottom || quote.peg > self.peg_top);
                if off_peg || quote.low.is_zero() {
                    Ok(CollateralStatus::Iffy)
                } else {
                    Ok(CollateralStatus::Sound)
                }
            }
            Err(CollateralError::Oracle(_) | CollateralError::Math(_)) => {
                Ok(CollateralStatus::Iffy)
            }
            Err(other) => Err(other),
        }
    }

    /// Applies a status observation.
    pub fn mark(&mut self, status: CollateralStatus, now: Timestamp) {
        self.lifecycle.mark(status, now, self.config.delay_until_default);
    }

    /// Records the current status, emitting an event when it changed since
    /// the last refresh.
    pub fn finish_refresh(&mut self, chain: &mut Chain) -> CollateralStatus {
        let new = self.status(chain);
        if new != self.reported {
            chain.emit(ChainEvent::CollateralStatusChanged {
                collateral: self.address,
                old_status: self.reported,
                new_status: new,
            });
            self.reported = new;
        }
        new
    }

    /// Returns the collateral token balance of `account` in whole tokens.
    ///
    /// # Errors
    ///
    /// Returns [`CollateralError::Chain`] for unknown tokens.
    pub fn bal(&self, chain: &Chain, account: Address) -> Result<Fix, CollateralError> {
        let token = chain.token(self.config.erc20)?;
        Ok(Fix::from_units(token.balance_of(account), token.decimals())?)
    }
}
