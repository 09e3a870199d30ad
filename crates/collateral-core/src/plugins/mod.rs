// collateral-core/src/plugins/mod.rs
// ============================================================================
// Module: Collateral Plugins
// Description: Reference collateral implementations.
// Purpose: Provide fiat and appreciating plugins on a shared lifecycle base.
// Dependencies: crate::{chain, core, interfaces}
// ============================================================================

//! ## Overview
//! Plugins implement [`crate::Collateral`] on top of [`CollateralBase`],
//! which owns validation, pricing, and the default timer.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod appreciating;
pub mod base;
pub mod fiat;
pub mod lifecycle;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use appreciating::AppreciatingCollateral;
pub use base::CollateralBase;
pub use base::validate_common;
pub use fiat::FiatCollateral;
pub use lifecycle::DefaultLifecycle;
pub use lifecycle::SavedPrice;
