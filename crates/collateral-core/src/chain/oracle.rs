// collateral-core/src/chain/oracle.rs
// ============================================================================
// Module: Mock Price Feeds
// Description: Chainlink-style aggregators and a checked price reader.
// Purpose: Drive collateral pricing from test-controlled feed answers.
// Dependencies: crate::chain, crate::core, thiserror
// ============================================================================

//! ## Overview
//! A [`MockV3Aggregator`] holds the latest round of a price feed. Tests move
//! the answer with [`Chain::update_answer`] and age it by advancing time.
//! [`read_feed_price`] is the single checked read used by every plugin:
//! it rejects stale and negative answers and scales the answer to 18
//! decimals.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::chain::Chain;
use crate::chain::ChainError;
use crate::chain::events::ChainEvent;
use crate::core::fixed::Fix;
use crate::core::fixed::FixError;
use crate::core::identifiers::Address;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Price feed read errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// Feed was never updated or the answer is older than the timeout.
    #[error("stale price from {feed} (updated at {updated_at})")]
    StalePrice {
        /// Feed address.
        feed: Address,
        /// Last update time.
        updated_at: Timestamp,
    },
    /// Feed answer is negative.
    #[error("invalid price {answer} from {feed}")]
    InvalidPrice {
        /// Feed address.
        feed: Address,
        /// Raw answer.
        answer: i128,
    },
    /// Feed lookup failed.
    #[error(transparent)]
    Chain(#[from] ChainError),
    /// Answer scaling failed.
    #[error(transparent)]
    Math(#[from] FixError),
}

// ============================================================================
// SECTION: Aggregator
// ============================================================================

/// Latest round as reported by an aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundData {
    /// Round identifier.
    pub round_id: u64,
    /// Raw answer in feed decimals.
    pub answer: i128,
    /// Update time; zero when never updated.
    pub updated_at: Timestamp,
    /// Round in which the answer was computed.
    pub answered_in_round: u64,
}

/// Mock Chainlink V3 aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockV3Aggregator {
    /// Answer decimals.
    decimals: u8,
    /// Latest round.
    round: RoundData,
}

impl MockV3Aggregator {
    /// Creates a feed whose first round is answered at `now`.
    #[must_use]
    pub const fn new(decimals: u8, initial_answer: i128, now: Timestamp) -> Self {
        Self {
            decimals,
            round: RoundData {
                round_id: 1,
                answer: initial_answer,
                updated_at: now,
                answered_in_round: 1,
            },
        }
    }

    /// Returns the answer decimals.
    #[must_use]
    pub const fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Returns the latest round.
    #[must_use]
    pub const fn latest_round_data(&self) -> RoundData {
        self.round
    }

    /// Returns the latest raw answer.
    #[must_use]
    pub const fn latest_answer(&self) -> i128 {
        self.round.answer
    }
}

// ============================================================================
// SECTION: Chain Operations
// ============================================================================

impl Chain {
    /// Deploys a feed at a fresh address.
    pub fn deploy_feed(&mut self, decimals: u8, initial_answer: i128) -> FeedHandle {
        let address = self.next_address("feed");
        let now = self.now();
        self.state.feeds.insert(address, MockV3Aggregator::new(decimals, initial_answer, now));
        FeedHandle(address)
    }

    /// Deploys a feed at a fixed address.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::AddressInUse`] when the address is taken.
    pub fn deploy_feed_at(
        &mut self,
        address: Address,
        decimals: u8,
        initial_answer: i128,
    ) -> Result<FeedHandle, ChainError> {
        self.ensure_free(address)?;
        let now = self.now();
        self.state.feeds.insert(address, MockV3Aggregator::new(decimals, initial_answer, now));
        Ok(FeedHandle(address))
    }

    /// Returns the feed at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnknownFeed`] when nothing is deployed there.
    pub fn feed(&self, address: Address) -> Result<&MockV3Aggregator, ChainError> {
        self.state.feeds.get(&address).ok_or(ChainError::UnknownFeed(address))
    }

    /// Returns the mutable feed at `address`.
    fn feed_mut(&mut self, address: Address) -> Result<&mut MockV3Aggregator, ChainError> {
        self.state.feeds.get_mut(&address).ok_or(ChainError::UnknownFeed(address))
    }

    /// Publishes a new answer in a new round stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnknownFeed`] for unknown feeds.
    pub fn update_answer(&mut self, feed: Address, answer: i128) -> Result<(), ChainError> {
        let now = self.now();
        let entry = self.feed_mut(feed)?;
        let round_id = entry.round.round_id + 1;
        entry.round =
            RoundData { round_id, answer, updated_at: now, answered_in_round: round_id };
        self.emit(ChainEvent::AnswerUpdated { feed, answer, round_id, updated_at: now });
        Ok(())
    }

    /// Overrides the update time of the latest round.
    ///
    /// Setting [`Timestamp::ZERO`] makes the feed read as never updated.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnknownFeed`] for unknown feeds.
    pub fn set_feed_updated_at(
        &mut self,
        feed: Address,
        updated_at: Timestamp,
    ) -> Result<(), ChainError> {
        self.feed_mut(feed)?.round.updated_at = updated_at;
        Ok(())
    }
}

/// Reads a feed answer as an 18-decimal price.
///
/// # Errors
///
/// Returns [`OracleError::StalePrice`] when the feed was never updated, the
/// round is incomplete, or the answer is older than `timeout` seconds;
/// [`OracleError::InvalidPrice`] for negative answers.
pub fn read_feed_price(chain: &Chain, feed: Address, timeout: u64) -> Result<Fix, OracleError> {
    let aggregator = chain.feed(feed)?;
    let round = aggregator.latest_round_data();
    let stale = OracleError::StalePrice { feed, updated_at: round.updated_at };
    if round.updated_at == Timestamp::ZERO || round.answered_in_round < round.round_id {
        return Err(stale);
    }
    if chain.now().seconds_since(round.updated_at) > timeout {
        return Err(stale);
    }
    let units = u128::try_from(round.answer)
        .map_err(|_| OracleError::InvalidPrice { feed, answer: round.answer })?;
    Ok(Fix::from_units(units, aggregator.decimals())?)
}

// ============================================================================
// SECTION: Handle
// ============================================================================

/// Typed reference to a deployed feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeedHandle(Address);

impl FeedHandle {
    /// Wraps a feed address.
    #[must_use]
    pub const fn new(address: Address) -> Self {
        Self(address)
    }

    /// Returns the feed address.
    #[must_use]
    pub const fn address(self) -> Address {
        self.0
    }

    /// Returns the feed decimals.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnknownFeed`] for unknown feeds.
    pub fn decimals(self, chain: &Chain) -> Result<u8, ChainError> {
        Ok(chain.feed(self.0)?.decimals())
    }

    /// Returns the latest raw answer.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnknownFeed`] for unknown feeds.
    pub fn latest_answer(self, chain: &Chain) -> Result<i128, ChainError> {
        Ok(chain.feed(self.0)?.latest_answer())
    }

    /// Publishes a new raw answer.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnknownFeed`] for unknown feeds.
    pub fn update_answer(self, chain: &mut Chain, answer: i128) -> Result<(), ChainError> {
        chain.update_answer(self.0, answer)
    }

    /// Scales the latest answer by `numerator / denominator` and publishes it.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError`] for unknown feeds or overflow.
    pub fn scale_answer(
        self,
        chain: &mut Chain,
        numerator: i128,
        denominator: i128,
    ) -> Result<i128, ChainError> {
        let current = self.latest_answer(chain)?;
        let scaled = current
            .checked_mul(numerator)
            .and_then(|value| value.checked_div(denominator))
            .ok_or(ChainError::Overflow)?;
        chain.update_answer(self.0, scaled)?;
        Ok(scaled)
    }
}
