// collateral-core/src/chain/token.rs
// ============================================================================
// Module: Token Ledger
// Description: ERC20-style balances, supply, and transfers.
// Purpose: Hold every token balance the harness and plugins touch.
// Dependencies: crate::chain, crate::core
// ============================================================================

//! ## Overview
//! Tokens are plain ledger entries keyed by address. Every mint and transfer
//! emits a [`ChainEvent::Transfer`]; transfers fail on insufficient balance
//! instead of clamping.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::chain::Chain;
use crate::chain::ChainError;
use crate::chain::events::ChainEvent;
use crate::core::fixed::Fix;
use crate::core::identifiers::Address;

// ============================================================================
// SECTION: Token
// ============================================================================

/// ERC20-style token ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Erc20Token {
    /// Token name.
    name: String,
    /// Token symbol.
    symbol: String,
    /// Token decimals.
    decimals: u8,
    /// Total minted supply.
    total_supply: u128,
    /// Non-zero balances.
    balances: BTreeMap<Address, u128>,
}

impl Erc20Token {
    /// Creates an empty token.
    #[must_use]
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            total_supply: 0,
            balances: BTreeMap::new(),
        }
    }

    /// Returns the token name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the token symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns the token decimals.
    #[must_use]
    pub const fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Returns the total supply.
    #[must_use]
    pub const fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Returns the balance of `account`.
    #[must_use]
    pub fn balance_of(&self, account: Address) -> u128 {
        self.balances.get(&account).copied().unwrap_or(0)
    }
}

// ============================================================================
// SECTION: Chain Operations
// ============================================================================

impl Chain {
    /// Deploys a token at a fresh address.
    pub fn deploy_token(&mut self, name: &str, symbol: &str, decimals: u8) -> TokenHandle {
        let address = self.next_address(&format!("token:{symbol}"));
        self.state.tokens.insert(address, Erc20Token::new(name, symbol, decimals));
        TokenHandle(address)
    }

    /// Deploys a token at a fixed address, as found on a forked network.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::AddressInUse`] when the address is taken.
    pub fn deploy_token_at(
        &mut self,
        address: Address,
        name: &str,
        symbol: &str,
        decimals: u8,
    ) -> Result<TokenHandle, ChainError> {
        self.ensure_free(address)?;
        self.state.tokens.insert(address, Erc20Token::new(name, symbol, decimals));
        Ok(TokenHandle(address))
    }

    /// Returns the token at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnknownToken`] when nothing is deployed there.
    pub fn token(&self, address: Address) -> Result<&Erc20Token, ChainError> {
        self.state.tokens.get(&address).ok_or(ChainError::UnknownToken(address))
    }

    /// Returns the mutable token at `address`.
    fn token_mut(&mut self, address: Address) -> Result<&mut Erc20Token, ChainError> {
        self.state.tokens.get_mut(&address).ok_or(ChainError::UnknownToken(address))
    }

    /// Mints `amount` of `token` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError`] for unknown tokens or supply overflow.
    pub fn mint(&mut self, token: Address, to: Address, amount: u128) -> Result<(), ChainError> {
        let entry = self.token_mut(token)?;
        let supply = entry.total_supply.checked_add(amount).ok_or(ChainError::Overflow)?;
        let balance =
            entry.balance_of(to).checked_add(amount).ok_or(ChainError::Overflow)?;
        entry.total_supply = supply;
        entry.balances.insert(to, balance);
        self.emit(ChainEvent::Transfer { token, from: Address::ZERO, to, amount });
        Ok(())
    }

    /// Moves `amount` of `token` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::InsufficientBalance`] when `from` holds too little.
    pub fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), ChainError> {
        let entry = self.token_mut(token)?;
        let balance = entry.balance_of(from);
        let remaining = balance.checked_sub(amount).ok_or(ChainError::InsufficientBalance {
            token,
            account: from,
            balance,
            needed: amount,
        })?;
        entry.balances.insert(from, remaining);
        let credited = entry.balance_of(to).checked_add(amount).ok_or(ChainError::Overflow)?;
        entry.balances.insert(to, credited);
        self.emit(ChainEvent::Transfer { token, from, to, amount });
        Ok(())
    }

    /// Returns the balance of `account` in `token`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnknownToken`] for unknown tokens.
    pub fn balance_of(&self, token: Address, account: Address) -> Result<u128, ChainError> {
        Ok(self.token(token)?.balance_of(account))
    }

    /// Returns the total supply of `token`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnknownToken`] for unknown tokens.
    pub fn total_supply(&self, token: Address) -> Result<u128, ChainError> {
        Ok(self.token(token)?.total_supply())
    }

    /// Returns the decimals of `token`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnknownToken`] for unknown tokens.
    pub fn token_decimals(&self, token: Address) -> Result<u8, ChainError> {
        Ok(self.token(token)?.decimals())
    }
}

// ============================================================================
// SECTION: Handle
// ============================================================================

/// Typed reference to a deployed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenHandle(Address);

impl TokenHandle {
    /// Wraps a token address.
    #[must_use]
    pub const fn new(address: Address) -> Self {
        Self(address)
    }

    /// Returns the token address.
    #[must_use]
    pub const fn address(self) -> Address {
        self.0
    }

    /// Returns the token decimals.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnknownToken`] for unknown tokens.
    pub fn decimals(self, chain: &Chain) -> Result<u8, ChainError> {
        chain.token_decimals(self.0)
    }

    /// Returns the balance of `account`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnknownToken`] for unknown tokens.
    pub fn balance_of(self, chain: &Chain, account: Address) -> Result<u128, ChainError> {
        chain.balance_of(self.0, account)
    }

    /// Returns the balance of `account` as an 18-decimal value.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError`] for unknown tokens or conversion overflow.
    pub fn balance_fix(self, chain: &Chain, account: Address) -> Result<Fix, ChainError> {
        let token = chain.token(self.0)?;
        Ok(Fix::from_units(token.balance_of(account), token.decimals())?)
    }

    /// Mints `amount` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError`] for unknown tokens or supply overflow.
    pub fn mint(self, chain: &mut Chain, to: Address, amount: u128) -> Result<(), ChainError> {
        chain.mint(self.0, to, amount)
    }

    /// Transfers `amount` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::InsufficientBalance`] when `from` holds too little.
    pub fn transfer(
        self,
        chain: &mut Chain,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), ChainError> {
        chain.transfer(self.0, from, to, amount)
    }
}
