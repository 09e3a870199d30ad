// collateral-testkit/src/suites/fork.rs
// ============================================================================
// Module: Fork Genesis
// Description: Well-known assets seeded at fixed addresses.
// Purpose: Give every built-in suite the same reproducible starting state.
// Dependencies: collateral-core
// ============================================================================

//! ## Overview
//! [`seed_fork`] resets the chain to the fork genesis and deploys the
//! well-known assets at label-derived addresses, so handles computed by
//! [`fork_assets`] stay valid across resets.

// ============================================================================
// SECTION: Imports
// ============================================================================

use collateral_core::Address;
use collateral_core::Chain;
use collateral_core::ChainError;
use collateral_core::FeedHandle;
use collateral_core::Fix;
use collateral_core::Signer;
use collateral_core::Timestamp;
use collateral_core::TokenHandle;
use collateral_core::VaultHandle;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default fork genesis timestamp.
pub const FORK_GENESIS_SECS: u64 = 1_700_000_000;

/// USDC decimals.
pub const USDC_DECIMALS: u8 = 6;

/// COMP decimals.
pub const COMP_DECIMALS: u8 = 18;

/// Vault share decimals.
pub const VAULT_SHARE_DECIMALS: u8 = 8;

/// USDC/USD feed decimals.
pub const USDC_FEED_DECIMALS: u8 = 8;

/// USDC/USD answer at genesis (1.0).
pub const USDC_FEED_ANSWER: i128 = 100_000_000;

/// Vault rate at genesis (1.02 USDC per share).
pub const VAULT_RATE: Fix = Fix::from_raw(1_020_000_000_000_000_000);

/// COMP streamed per share per second (0.0001).
pub const REWARD_RATE_PER_SHARE: Fix = Fix::from_raw(100_000_000_000_000);

/// Whale USDC balance in raw units (one billion USDC).
pub const WHALE_USDC: u128 = 1_000_000_000_000_000;

// ============================================================================
// SECTION: Assets
// ============================================================================

/// Handles to the seeded assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForkAssets {
    /// USD Coin.
    pub usdc: TokenHandle,
    /// Reward token.
    pub comp: TokenHandle,
    /// USDC/USD price feed.
    pub usdc_feed: FeedHandle,
    /// Appreciating USDC vault; also the `vUSDC` share token.
    pub vault: VaultHandle,
}

/// Returns the fixed asset handles.
#[must_use]
pub fn fork_assets() -> ForkAssets {
    ForkAssets {
        usdc: TokenHandle::new(Address::derive("fork:usdc")),
        comp: TokenHandle::new(Address::derive("fork:comp")),
        usdc_feed: FeedHandle::new(Address::derive("fork:usdc-usd-feed")),
        vault: VaultHandle::new(Address::derive("fork:vusdc")),
    }
}

/// Account funded with USDC at genesis.
#[must_use]
pub fn whale() -> Signer {
    Signer::new("usdc-whale")
}

/// Resets `chain` to `genesis` and deploys the fork assets.
///
/// # Errors
///
/// Returns [`ChainError`] when an asset cannot be deployed.
pub fn seed_fork(chain: &mut Chain, genesis: Timestamp) -> Result<ForkAssets, ChainError> {
    chain.reset(genesis);
    let assets = fork_assets();
    chain.deploy_token_at(assets.usdc.address(), "USD Coin", "USDC", USDC_DECIMALS)?;
    chain.deploy_token_at(assets.comp.address(), "Compound", "COMP", COMP_DECIMALS)?;
    chain.deploy_feed_at(assets.usdc_feed.address(), USDC_FEED_DECIMALS, USDC_FEED_ANSWER)?;
    chain.deploy_vault_at(
        assets.vault.address(),
        assets.usdc.address(),
        "Vault USDC",
        "vUSDC",
        VAULT_SHARE_DECIMALS,
        VAULT_RATE,
    )?;
    chain.set_vault_reward_stream(
        assets.vault.address(),
        assets.comp.address(),
        REWARD_RATE_PER_SHARE,
    )?;
    assets.usdc.mint(chain, whale().address(), WHALE_USDC)?;
    Ok(assets)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use super::*;

    #[test]
    fn reseeding_restores_genesis() {
        let mut chain = Chain::new(Timestamp::ZERO);
        let genesis = Timestamp::from_secs(FORK_GENESIS_SECS);
        let assets = seed_fork(&mut chain, genesis).unwrap();
        assets.usdc.transfer(&mut chain, whale().address(), Address::derive("sink"), 5).unwrap();
        chain.advance_time(60);

        let again = seed_fork(&mut chain, genesis).unwrap();
        assert_eq!(again, assets);
        assert_eq!(chain.now(), genesis);
        assert_eq!(assets.usdc.balance_of(&chain, whale().address()).unwrap(), WHALE_USDC);
        assert_eq!(assets.vault.rate(&chain).unwrap(), VAULT_RATE);
    }
}
