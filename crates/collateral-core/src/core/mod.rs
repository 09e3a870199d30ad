// collateral-core/src/core/mod.rs
// ============================================================================
// Module: Collateral Core Types
// Description: Canonical collateral schema types.
// Purpose: Provide stable, serializable types shared by plugins and harnesses.
// Dependencies: bigdecimal, serde, sha2
// ============================================================================

//! ## Overview
//! Core types define the collateral status lifecycle, deployment options and
//! their resolved configuration, fixed-point numerics, identifiers, and
//! block time. These types are the canonical source of truth for the test
//! harness and the CLI.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod fixed;
pub mod identifiers;
pub mod opts;
pub mod status;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use fixed::FIX_DECIMALS;
pub use fixed::FIX_SCALE;
pub use fixed::Fix;
pub use fixed::FixError;
pub use fixed::Rounding;
pub use identifiers::Address;
pub use identifiers::IdentifierError;
pub use identifiers::Signer;
pub use identifiers::TargetName;
pub use opts::CollateralConfig;
pub use opts::CollateralOpts;
pub use opts::MAX_DELAY_UNTIL_DEFAULT_SECS;
pub use opts::NumberInput;
pub use opts::OptsError;
pub use status::CollateralStatus;
pub use status::UnknownStatus;
pub use time::Timestamp;
