// collateral-config/src/lib.rs
// ============================================================================
// Module: Collateral Config Library
// Description: Harness config model, validation, and example generation.
// Purpose: Single source of truth for collateral-harness.toml semantics.
// Dependencies: collateral-core, serde, toml
// ============================================================================

//! ## Overview
//! `collateral-config` defines the configuration model for the collateral
//! suite runner: fork genesis, collateral default overrides, suite
//! selection, and suite event logging. Validation is strict and fail-closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
