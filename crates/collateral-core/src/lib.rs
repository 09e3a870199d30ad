// collateral-core/src/lib.rs
// ============================================================================
// Module: Collateral Core Library
// Description: Public API surface for the collateral domain core.
// Purpose: Expose domain types, the simulated chain, and collateral plugins.
// Dependencies: crate::{chain, core, interfaces, plugins}
// ============================================================================

//! ## Overview
//! Collateral core models pluggable collateral implementations: a closed
//! status lifecycle, optional deployment parameters with a single defaults
//! table, an 18-decimal fixed-point type, and an in-process simulated chain
//! (token ledger, mock price feeds, yield vaults, snapshots, event log) that
//! plugins read from and write to the way on-chain plugins read a forked
//! network.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod chain;
pub mod core;
pub mod interfaces;
pub mod plugins;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use chain::BLOCK_TIME_SECS;
pub use chain::Chain;
pub use chain::ChainError;
pub use chain::Checkpoint;
pub use chain::SnapshotId;
pub use chain::events::ChainEvent;
pub use chain::oracle::FeedHandle;
pub use chain::oracle::MockV3Aggregator;
pub use chain::oracle::OracleError;
pub use chain::oracle::RoundData;
pub use chain::token::Erc20Token;
pub use chain::token::TokenHandle;
pub use chain::vault::RateVault;
pub use chain::vault::VaultHandle;
pub use interfaces::Collateral;
pub use interfaces::CollateralError;
pub use interfaces::PriceQuote;
pub use interfaces::PriceRange;
pub use interfaces::RewardsClaimed;
pub use plugins::AppreciatingCollateral;
pub use plugins::CollateralBase;
pub use plugins::DefaultLifecycle;
pub use plugins::FiatCollateral;
pub use plugins::SavedPrice;
