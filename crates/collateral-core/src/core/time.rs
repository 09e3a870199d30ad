// collateral-core/src/core/time.rs
// ============================================================================
// Module: Collateral Time Model
// Description: Block timestamps in unix seconds.
// Purpose: Provide deterministic chain time values for default timers and price decay.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Time on the simulated chain only moves when a caller advances it. The
//! core never reads wall-clock time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Block timestamp in unix seconds.
///
/// # Invariants
/// - [`Timestamp::NEVER`] is the "not scheduled" sentinel used by default timers.
/// - [`Timestamp::ZERO`] marks a value that was never set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Unset timestamp.
    pub const ZERO: Self = Self(0);
    /// Far-future sentinel.
    pub const NEVER: Self = Self(u64::MAX);

    /// Creates a timestamp from unix seconds.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Returns the timestamp in unix seconds.
    #[must_use]
    pub const fn as_secs(self) -> u64 {
        self.0
    }

    /// Adds seconds, clamping at [`Timestamp::NEVER`].
    #[must_use]
    pub const fn saturating_add(self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Seconds elapsed since `earlier`, zero when `earlier` is later.
    #[must_use]
    pub const fn seconds_since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
