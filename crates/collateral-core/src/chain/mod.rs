// collateral-core/src/chain/mod.rs
// ============================================================================
// Module: Simulated Chain
// Description: In-process chain state with block time, snapshots, and events.
// Purpose: Stand in for a forked network that collateral plugins read and write.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! [`Chain`] owns every piece of simulated on-chain state: the token ledger,
//! mock price feeds, rate vaults, block time, an address nonce, and the
//! event log. State lives in one cloneable value so snapshots and reverts
//! are whole-state copies, mirroring `evm_snapshot` / `evm_revert`.
//! [`Chain::checkpoint`] hands the same copy to the caller instead of the
//! snapshot stack, so holders never disturb each other.
//!
//! Token, feed, and vault operations are defined in their submodules as
//! additional `impl Chain` blocks.
//!
//! ## Invariants
//! - Time only moves forward through [`Chain::advance_time`] and
//!   [`Chain::advance_blocks`].
//! - Reverting to a snapshot discards every snapshot taken after it.
//! - [`Chain::reset`] starts a new fork; snapshots and checkpoints taken on
//!   an earlier fork are rejected.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod events;
pub mod oracle;
pub mod token;
pub mod vault;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use thiserror::Error;

use crate::chain::events::ChainEvent;
use crate::chain::oracle::MockV3Aggregator;
use crate::chain::token::Erc20Token;
use crate::chain::vault::RateVault;
use crate::core::fixed::FixError;
use crate::core::identifiers::Address;
use crate::core::identifiers::Signer;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Seconds per mined block.
pub const BLOCK_TIME_SECS: u64 = 12;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Simulated chain errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// No token is deployed at the address.
    #[error("unknown token: {0}")]
    UnknownToken(Address),
    /// No feed is deployed at the address.
    #[error("unknown feed: {0}")]
    UnknownFeed(Address),
    /// No vault is deployed at the address.
    #[error("unknown vault: {0}")]
    UnknownVault(Address),
    /// A contract already lives at the address.
    #[error("address already in use: {0}")]
    AddressInUse(Address),
    /// Transfer exceeds the sender balance.
    #[error("insufficient balance of {token} for {account}: have {balance}, need {needed}")]
    InsufficientBalance {
        /// Token address.
        token: Address,
        /// Sender address.
        account: Address,
        /// Current balance.
        balance: u128,
        /// Requested amount.
        needed: u128,
    },
    /// Snapshot id was never issued or was discarded by an earlier revert.
    #[error("unknown snapshot: {0}")]
    UnknownSnapshot(usize),
    /// Snapshot or checkpoint was taken before the last reset.
    #[error("state from fork {taken} cannot be restored on fork {current}")]
    StaleFork {
        /// Fork the state was captured on.
        taken: u64,
        /// Current fork.
        current: u64,
    },
    /// Ledger arithmetic overflow.
    #[error("ledger overflow")]
    Overflow,
    /// Fixed-point conversion failure.
    #[error(transparent)]
    Math(#[from] FixError),
}

// ============================================================================
// SECTION: Snapshots
// ============================================================================

/// Handle returned by [`Chain::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotId {
    /// Fork the snapshot belongs to.
    fork: u64,
    /// Position in the snapshot stack.
    index: usize,
}

impl SnapshotId {
    /// Returns the snapshot index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }
}

/// Whole-chain state owned by the caller, returned by [`Chain::checkpoint`].
#[derive(Debug, Clone)]
pub struct Checkpoint {
    /// Fork the state was captured on.
    fork: u64,
    /// Captured state.
    state: ChainState,
}

impl Checkpoint {
    /// Returns the fork the checkpoint belongs to.
    #[must_use]
    pub const fn fork(&self) -> u64 {
        self.fork
    }

    /// Returns the captured block timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> Timestamp {
        self.state.timestamp
    }
}

// ============================================================================
// SECTION: Chain State
// ============================================================================

/// Whole-chain state captured by snapshots.
#[derive(Debug, Clone, Default)]
pub(crate) struct ChainState {
    /// Current block timestamp.
    pub(crate) timestamp: Timestamp,
    /// Current block number.
    pub(crate) block_number: u64,
    /// Address derivation nonce.
    pub(crate) nonce: u64,
    /// Token ledger keyed by token address.
    pub(crate) tokens: BTreeMap<Address, Erc20Token>,
    /// Price feeds keyed by feed address.
    pub(crate) feeds: BTreeMap<Address, MockV3Aggregator>,
    /// Rate vaults keyed by share token address.
    pub(crate) vaults: BTreeMap<Address, RateVault>,
    /// Emitted events in order.
    pub(crate) events: Vec<ChainEvent>,
}

/// Simulated chain.
#[derive(Debug, Clone)]
pub struct Chain {
    /// Live state.
    pub(crate) state: ChainState,
    /// Snapshot stack.
    snapshots: Vec<ChainState>,
    /// Fork counter, bumped by every reset.
    fork: u64,
}

impl Chain {
    /// Creates an empty chain whose first block carries `genesis`.
    #[must_use]
    pub fn new(genesis: Timestamp) -> Self {
        Self {
            state: ChainState { timestamp: genesis, ..ChainState::default() },
            snapshots: Vec::new(),
            fork: 0,
        }
    }

    /// Drops all state and snapshots and restarts at `genesis` on a new fork.
    pub fn reset(&mut self, genesis: Timestamp) {
        let fork = self.fork.wrapping_add(1);
        *self = Self { fork, ..Self::new(genesis) };
    }

    /// Returns the current fork counter.
    #[must_use]
    pub const fn fork(&self) -> u64 {
        self.fork
    }

    /// Returns the current block timestamp.
    #[must_use]
    pub const fn now(&self) -> Timestamp {
        self.state.timestamp
    }

    /// Returns the current block number.
    #[must_use]
    pub const fn block_number(&self) -> u64 {
        self.state.block_number
    }

    /// Mines one block `secs` seconds after the current one.
    pub const fn advance_time(&mut self, secs: u64) {
        self.state.timestamp = self.state.timestamp.saturating_add(secs);
        self.state.block_number = self.state.block_number.saturating_add(1);
    }

    /// Mines `count` blocks at [`BLOCK_TIME_SECS`] spacing.
    pub const fn advance_blocks(&mut self, count: u64) {
        self.state.timestamp =
            self.state.timestamp.saturating_add(count.saturating_mul(BLOCK_TIME_SECS));
        self.state.block_number = self.state.block_number.saturating_add(count);
    }

    /// Captures the current state.
    pub fn snapshot(&mut self) -> SnapshotId {
        self.snapshots.push(self.state.clone());
        SnapshotId { fork: self.fork, index: self.snapshots.len() - 1 }
    }

    /// Restores the state captured by `id`.
    ///
    /// The snapshot stays usable; later snapshots are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::StaleFork`] when `id` predates the last reset
    /// and [`ChainError::UnknownSnapshot`] when `id` is no longer held.
    pub fn revert(&mut self, id: SnapshotId) -> Result<(), ChainError> {
        self.ensure_fork(id.fork)?;
        let state =
            self.snapshots.get(id.index).cloned().ok_or(ChainError::UnknownSnapshot(id.index))?;
        self.state = state;
        self.snapshots.truncate(id.index + 1);
        Ok(())
    }

    /// Copies the current state out of the chain.
    ///
    /// The snapshot stack is left untouched.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint { fork: self.fork, state: self.state.clone() }
    }

    /// Replaces the live state with `checkpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::StaleFork`] when the checkpoint predates the
    /// last reset.
    pub fn restore(&mut self, checkpoint: &Checkpoint) -> Result<(), ChainError> {
        self.ensure_fork(checkpoint.fork)?;
        self.state = checkpoint.state.clone();
        Ok(())
    }

    /// Errors unless `fork` is the current fork.
    const fn ensure_fork(&self, fork: u64) -> Result<(), ChainError> {
        if fork == self.fork {
            Ok(())
        } else {
            Err(ChainError::StaleFork { taken: fork, current: self.fork })
        }
    }

    /// Derives a fresh contract address from `label` and the nonce.
    pub fn next_address(&mut self, label: &str) -> Address {
        self.state.nonce += 1;
        Address::derive(&format!("{label}#{}", self.state.nonce))
    }

    /// Returns the signer for `label`.
    #[must_use]
    pub fn signer(&self, label: &str) -> Signer {
        Signer::new(label)
    }

    /// Appends an event to the log.
    pub fn emit(&mut self, event: ChainEvent) {
        self.state.events.push(event);
    }

    /// Returns every event emitted so far.
    #[must_use]
    pub fn events(&self) -> &[ChainEvent] {
        &self.state.events
    }

    /// Returns the current event log length, for use with [`Chain::events_since`].
    #[must_use]
    pub fn event_mark(&self) -> usize {
        self.state.events.len()
    }

    /// Returns events emitted after `mark`.
    #[must_use]
    pub fn events_since(&self, mark: usize) -> &[ChainEvent] {
        self.state.events.get(mark..).unwrap_or_default()
    }

    /// Errors unless `address` is free for a new contract.
    pub(crate) fn ensure_free(&self, address: Address) -> Result<(), ChainError> {
        let taken = self.state.tokens.contains_key(&address)
            || self.state.feeds.contains_key(&address)
            || self.state.vaults.contains_key(&address);
        if taken { Err(ChainError::AddressInUse(address)) } else { Ok(()) }
    }
}
