// collateral-core/tests/chain_state.rs
// ============================================================================
// Module: Simulated Chain Tests
// Description: Ledger, feed, vault, snapshot, and event-log behavior.
// ============================================================================
//! ## Overview
//! Validates the simulated chain that collateral plugins read from.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use collateral_core::Address;
use collateral_core::BLOCK_TIME_SECS;
use collateral_core::Chain;
use collateral_core::ChainError;
use collateral_core::ChainEvent;
use collateral_core::Fix;
use collateral_core::OracleError;
use collateral_core::Timestamp;
use collateral_core::chain::oracle::read_feed_price;

type TestResult = Result<(), String>;

const GENESIS: u64 = 1_700_000_000;

fn chain() -> Chain {
    Chain::new(Timestamp::from_secs(GENESIS))
}

#[test]
fn transfers_move_balances_and_emit_events() -> TestResult {
    let mut chain = chain();
    let token = chain.deploy_token("USD Coin", "USDC", 6);
    let alice = chain.signer("alice").address();
    let bob = chain.signer("bob").address();
    token.mint(&mut chain, alice, 1_000).map_err(|err| err.to_string())?;
    token.transfer(&mut chain, alice, bob, 400).map_err(|err| err.to_string())?;
    assert_eq!(token.balance_of(&chain, alice).unwrap(), 600);
    assert_eq!(token.balance_of(&chain, bob).unwrap(), 400);
    assert_eq!(chain.total_supply(token.address()).unwrap(), 1_000);
    let transfers = chain
        .events()
        .iter()
        .filter(|event| matches!(event, ChainEvent::Transfer { .. }))
        .count();
    assert_eq!(transfers, 2);
    Ok(())
}

#[test]
fn transfer_fails_on_insufficient_balance() {
    let mut chain = chain();
    let token = chain.deploy_token("USD Coin", "USDC", 6);
    let alice = chain.signer("alice").address();
    let result = token.transfer(&mut chain, alice, Address::derive("sink"), 1);
    assert!(matches!(result, Err(ChainError::InsufficientBalance { balance: 0, needed: 1, .. })));
}

#[test]
fn deploy_at_rejects_taken_address() {
    let mut chain = chain();
    let address = Address::derive("usdc");
    chain.deploy_token_at(address, "USD Coin", "USDC", 6).unwrap();
    assert_eq!(chain.deploy_feed_at(address, 8, 1).unwrap_err(), ChainError::AddressInUse(address));
}

#[test]
fn revert_restores_state_and_keeps_snapshot() -> TestResult {
    let mut chain = chain();
    let token = chain.deploy_token("USD Coin", "USDC", 6);
    let alice = chain.signer("alice").address();
    let snapshot = chain.snapshot();
    token.mint(&mut chain, alice, 5).map_err(|err| err.to_string())?;
    chain.advance_time(100);
    chain.revert(snapshot).map_err(|err| err.to_string())?;
    assert_eq!(token.balance_of(&chain, alice).unwrap(), 0);
    assert_eq!(chain.now(), Timestamp::from_secs(GENESIS));
    token.mint(&mut chain, alice, 7).map_err(|err| err.to_string())?;
    chain.revert(snapshot).map_err(|err| err.to_string())?;
    assert_eq!(token.balance_of(&chain, alice).unwrap(), 0);
    Ok(())
}

#[test]
fn revert_discards_later_snapshots() {
    let mut chain = chain();
    let first = chain.snapshot();
    let second = chain.snapshot();
    chain.revert(first).unwrap();
    assert_eq!(chain.revert(second), Err(ChainError::UnknownSnapshot(second.index())));
}

#[test]
fn reset_rejects_snapshots_and_checkpoints_from_the_old_fork() {
    let mut chain = chain();
    let snapshot = chain.snapshot();
    let checkpoint = chain.checkpoint();
    chain.reset(Timestamp::from_secs(GENESIS));
    chain.snapshot();
    let stale = ChainError::StaleFork { taken: 0, current: 1 };
    assert_eq!(chain.revert(snapshot), Err(stale.clone()));
    assert_eq!(chain.restore(&checkpoint), Err(stale));
    assert_eq!(chain.fork(), 1);
}

#[test]
fn checkpoint_restore_leaves_snapshot_stack_alone() -> TestResult {
    let mut chain = chain();
    let checkpoint = chain.checkpoint();
    let first = chain.snapshot();
    chain.advance_time(30);
    let second = chain.snapshot();
    chain.restore(&checkpoint).map_err(|err| err.to_string())?;
    assert_eq!(chain.now(), checkpoint.timestamp());
    chain.revert(second).map_err(|err| err.to_string())?;
    assert_eq!(chain.now(), Timestamp::from_secs(GENESIS + 30));
    chain.revert(first).map_err(|err| err.to_string())?;
    assert_eq!(chain.now(), Timestamp::from_secs(GENESIS));
    Ok(())
}

#[test]
fn advance_blocks_uses_block_time() {
    let mut chain = chain();
    chain.advance_blocks(10);
    assert_eq!(chain.block_number(), 10);
    assert_eq!(chain.now(), Timestamp::from_secs(GENESIS + 10 * BLOCK_TIME_SECS));
}

#[test]
fn feed_reads_scale_answers_to_eighteen_decimals() {
    let mut chain = chain();
    let feed = chain.deploy_feed(8, 100_000_000);
    let price = read_feed_price(&chain, feed.address(), 60).unwrap();
    assert_eq!(price, Fix::ONE);
    feed.update_answer(&mut chain, 150_000_000).unwrap();
    let price = read_feed_price(&chain, feed.address(), 60).unwrap();
    assert_eq!(price.to_string(), "1.5");
}

#[test]
fn feed_reads_fail_when_stale_or_negative() {
    let mut chain = chain();
    let feed = chain.deploy_feed(8, 100_000_000);
    chain.advance_time(61);
    assert!(matches!(
        read_feed_price(&chain, feed.address(), 60),
        Err(OracleError::StalePrice { .. })
    ));
    feed.update_answer(&mut chain, -1).unwrap();
    assert!(matches!(
        read_feed_price(&chain, feed.address(), 60),
        Err(OracleError::InvalidPrice { answer: -1, .. })
    ));
    chain.set_feed_updated_at(feed.address(), Timestamp::ZERO).unwrap();
    assert!(matches!(
        read_feed_price(&chain, feed.address(), u64::MAX),
        Err(OracleError::StalePrice { .. })
    ));
}

#[test]
fn vault_mints_shares_at_rate_and_streams_rewards() -> TestResult {
    let mut chain = chain();
    let usdc = chain.deploy_token("USD Coin", "USDC", 6);
    let comp = chain.deploy_token("Compound", "COMP", 18);
    let vault = chain
        .deploy_vault(usdc.address(), "Vault USDC", "vUSDC", 8, Fix::parse_decimal("1.02").unwrap())
        .map_err(|err| err.to_string())?;
    let alice = chain.signer("alice").address();
    usdc.mint(&mut chain, alice, 2_000_000).map_err(|err| err.to_string())?;
    let pulled = vault.mint_shares(&mut chain, alice, alice, 100_000_000).map_err(|err| err.to_string())?;
    assert_eq!(pulled, 1_020_000);
    assert_eq!(chain.balance_of(vault.address(), alice).unwrap(), 100_000_000);

    chain
        .set_vault_reward_stream(vault.address(), comp.address(), Fix::parse_decimal("0.001").unwrap())
        .map_err(|err| err.to_string())?;
    chain.advance_time(1_000);
    let claimed = chain.claim_vault_rewards(vault.address(), alice).map_err(|err| err.to_string())?;
    assert_eq!(claimed, Some((comp.address(), 1_000_000_000_000_000_000)));
    let again = chain.claim_vault_rewards(vault.address(), alice).map_err(|err| err.to_string())?;
    assert_eq!(again, Some((comp.address(), 0)));
    Ok(())
}
