// collateral-core/src/chain/events.rs
// ============================================================================
// Module: Chain Events
// Description: Event records emitted by the simulated chain.
// Purpose: Let tests assert on transfers, price updates, and status changes.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Events are appended to the chain log in emission order and are rolled
//! back together with the rest of the state on revert.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::fixed::Fix;
use crate::core::identifiers::Address;
use crate::core::status::CollateralStatus;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Chain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChainEvent {
    /// Token transfer; mints come from the zero address.
    Transfer {
        /// Token address.
        token: Address,
        /// Sender.
        from: Address,
        /// Recipient.
        to: Address,
        /// Amount in token units.
        amount: u128,
    },
    /// New feed answer.
    AnswerUpdated {
        /// Feed address.
        feed: Address,
        /// Raw answer in feed decimals.
        answer: i128,
        /// Round identifier.
        round_id: u64,
        /// Update time.
        updated_at: Timestamp,
    },
    /// Vault exchange rate change.
    RateUpdated {
        /// Vault share token address.
        vault: Address,
        /// Underlying per share.
        ref_per_share: Fix,
    },
    /// Collateral status transition.
    CollateralStatusChanged {
        /// Collateral address.
        collateral: Address,
        /// Previous status.
        old_status: CollateralStatus,
        /// New status.
        new_status: CollateralStatus,
    },
    /// Collateral reward claim.
    RewardsClaimed {
        /// Collateral address.
        collateral: Address,
        /// Reward token.
        erc20: Address,
        /// Claimed amount in token units.
        amount: u128,
    },
}
