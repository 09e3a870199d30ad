// collateral-core/src/chain/vault.rs
// ============================================================================
// Module: Rate Vault
// Description: Mock yield-bearing share token over an underlying token.
// Purpose: Give appreciating collateral a controllable reference rate and rewards.
// Dependencies: crate::chain, crate::core
// ============================================================================

//! ## Overview
//! A [`RateVault`] issues shares whose value in the underlying token is set
//! directly by tests (`ref_per_share`). The share token itself lives in the
//! token ledger at the vault address. Optionally the vault streams a reward
//! token to share holders at a fixed rate per share per second; holders pull
//! accrued rewards with [`Chain::claim_vault_rewards`].
//!
//! Accrual uses the holder balance at claim time over the whole elapsed
//! window, which is enough to assert that claims grow with time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::chain::Chain;
use crate::chain::ChainError;
use crate::chain::events::ChainEvent;
use crate::core::fixed::Fix;
use crate::core::fixed::Rounding;
use crate::core::identifiers::Address;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Vault
// ============================================================================

/// Reward stream configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RewardStream {
    /// Reward token.
    token: Address,
    /// Whole reward tokens per share per second.
    rate_per_share: Fix,
    /// When the stream started.
    started_at: Timestamp,
}

/// Mock yield-bearing vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateVault {
    /// Underlying token address.
    underlying: Address,
    /// Underlying tokens per share.
    ref_per_share: Fix,
    /// Optional reward stream.
    rewards: Option<RewardStream>,
    /// Last claim time per holder.
    last_claim: BTreeMap<Address, Timestamp>,
}

impl RateVault {
    /// Returns the underlying token address.
    #[must_use]
    pub const fn underlying(&self) -> Address {
        self.underlying
    }

    /// Returns the underlying tokens per share.
    #[must_use]
    pub const fn ref_per_share(&self) -> Fix {
        self.ref_per_share
    }

    /// Returns the reward token, when a stream is configured.
    #[must_use]
    pub fn reward_token(&self) -> Option<Address> {
        self.rewards.as_ref().map(|stream| stream.token)
    }
}

// ============================================================================
// SECTION: Chain Operations
// ============================================================================

impl Chain {
    /// Deploys a vault and its share token at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError`] when the address is taken or the underlying is unknown.
    pub fn deploy_vault_at(
        &mut self,
        address: Address,
        underlying: Address,
        name: &str,
        symbol: &str,
        share_decimals: u8,
        ref_per_share: Fix,
    ) -> Result<VaultHandle, ChainError> {
        self.token(underlying)?;
        self.deploy_token_at(address, name, symbol, share_decimals)?;
        self.state.vaults.insert(
            address,
            RateVault { underlying, ref_per_share, rewards: None, last_claim: BTreeMap::new() },
        );
        Ok(VaultHandle(address))
    }

    /// Deploys a vault at a fresh address.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError`] when the underlying is unknown.
    pub fn deploy_vault(
        &mut self,
        underlying: Address,
        name: &str,
        symbol: &str,
        share_decimals: u8,
        ref_per_share: Fix,
    ) -> Result<VaultHandle, ChainError> {
        let address = self.next_address(&format!("vault:{symbol}"));
        self.deploy_vault_at(address, underlying, name, symbol, share_decimals, ref_per_share)
    }

    /// Returns the vault at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnknownVault`] when nothing is deployed there.
    pub fn vault(&self, address: Address) -> Result<&RateVault, ChainError> {
        self.state.vaults.get(&address).ok_or(ChainError::UnknownVault(address))
    }

    /// Returns the mutable vault at `address`.
    fn vault_mut(&mut self, address: Address) -> Result<&mut RateVault, ChainError> {
        self.state.vaults.get_mut(&address).ok_or(ChainError::UnknownVault(address))
    }

    /// Returns underlying tokens per share.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnknownVault`] for unknown vaults.
    pub fn vault_rate(&self, vault: Address) -> Result<Fix, ChainError> {
        Ok(self.vault(vault)?.ref_per_share())
    }

    /// Sets underlying tokens per share.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnknownVault`] for unknown vaults.
    pub fn set_vault_rate(&mut self, vault: Address, ref_per_share: Fix) -> Result<(), ChainError> {
        self.vault_mut(vault)?.ref_per_share = ref_per_share;
        self.emit(ChainEvent::RateUpdated { vault, ref_per_share });
        Ok(())
    }

    /// Mints `shares` to `receiver`, pulling the underlying from `payer`.
    ///
    /// Returns the underlying amount pulled: `ceil(shares * ref_per_share)`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::InsufficientBalance`] when `payer` cannot cover it.
    pub fn vault_mint_shares(
        &mut self,
        vault: Address,
        payer: Address,
        receiver: Address,
        shares: u128,
    ) -> Result<u128, ChainError> {
        let (underlying, rate) = {
            let entry = self.vault(vault)?;
            (entry.underlying, entry.ref_per_share)
        };
        let share_value = Fix::from_units(shares, self.token_decimals(vault)?)?;
        let assets = share_value
            .mul(rate, Rounding::Ceil)?
            .to_units(self.token_decimals(underlying)?, Rounding::Ceil)?;
        self.transfer(underlying, payer, vault, assets)?;
        self.mint(vault, receiver, shares)?;
        Ok(assets)
    }

    /// Starts streaming `reward_token` to share holders.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError`] for unknown vaults or tokens.
    pub fn set_vault_reward_stream(
        &mut self,
        vault: Address,
        reward_token: Address,
        rate_per_share: Fix,
    ) -> Result<(), ChainError> {
        self.token(reward_token)?;
        let now = self.now();
        self.vault_mut(vault)?.rewards =
            Some(RewardStream { token: reward_token, rate_per_share, started_at: now });
        Ok(())
    }

    /// Pays `holder` the rewards accrued since its last claim.
    ///
    /// Returns the reward token and the amount paid, or `None` when the vault
    /// has no reward stream.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError`] for unknown vaults or overflow.
    pub fn claim_vault_rewards(
        &mut self,
        vault: Address,
        holder: Address,
    ) -> Result<Option<(Address, u128)>, ChainError> {
        let now = self.now();
        let (stream, last) = {
            let entry = self.vault(vault)?;
            let Some(stream) = entry.rewards.clone() else {
                return Ok(None);
            };
            let last = entry
                .last_claim
                .get(&holder)
                .copied()
                .map_or(stream.started_at, |claimed| claimed.max(stream.started_at));
            (stream, last)
        };
        let elapsed = now.seconds_since(last);
        let shares = Fix::from_units(self.balance_of(vault, holder)?, self.token_decimals(vault)?)?;
        let accrued = shares
            .mul(stream.rate_per_share, Rounding::Floor)?
            .mul(Fix::from_int(elapsed), Rounding::Floor)?;
        let amount = accrued.to_units(self.token_decimals(stream.token)?, Rounding::Floor)?;
        if amount > 0 {
            self.mint(stream.token, holder, amount)?;
        }
        self.vault_mut(vault)?.last_claim.insert(holder, now);
        Ok(Some((stream.token, amount)))
    }
}

// ============================================================================
// SECTION: Handle
// ============================================================================

/// Typed reference to a deployed vault; the address is also the share token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VaultHandle(Address);

impl VaultHandle {
    /// Wraps a vault address.
    #[must_use]
    pub const fn new(address: Address) -> Self {
        Self(address)
    }

    /// Returns the vault address.
    #[must_use]
    pub const fn address(self) -> Address {
        self.0
    }

    /// Returns underlying tokens per share.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnknownVault`] for unknown vaults.
    pub fn rate(self, chain: &Chain) -> Result<Fix, ChainError> {
        chain.vault_rate(self.0)
    }

    /// Sets underlying tokens per share.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnknownVault`] for unknown vaults.
    pub fn set_rate(self, chain: &mut Chain, ref_per_share: Fix) -> Result<(), ChainError> {
        chain.set_vault_rate(self.0, ref_per_share)
    }

    /// Mints `shares` to `receiver`, pulling the underlying from `payer`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::InsufficientBalance`] when `payer` cannot cover it.
    pub fn mint_shares(
        self,
        chain: &mut Chain,
        payer: Address,
        receiver: Address,
        shares: u128,
    ) -> Result<u128, ChainError> {
        chain.vault_mint_shares(self.0, payer, receiver, shares)
    }
}
