// collateral-core/src/plugins/lifecycle.rs
// ============================================================================
// Module: Default Lifecycle
// Description: Default timer and saved-price decay shared by all plugins.
// Purpose: Derive SOUND/IFFY/DISABLED from one timestamp and keep a fallback price.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! A collateral's status is a pure function of `when_default` and block
//! time: `NEVER` is SOUND, a future time is IFFY, and a past or present time
//! is DISABLED. Marks can only pull `when_default` earlier, so the status
//! never recovers.
//!
//! [`SavedPrice`] keeps the last good price. When the feed fails, the saved
//! range holds for `oracle_timeout`, then `low` decays linearly to zero and
//! `high` grows over `price_timeout` until the range is fully unpriced.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::fixed::Fix;
use crate::core::fixed::Rounding;
use crate::core::status::CollateralStatus;
use crate::core::time::Timestamp;
use crate::interfaces::PriceRange;

// ============================================================================
// SECTION: Default Lifecycle
// ============================================================================

/// Default timer.
///
/// # Invariants
/// - `when_default` never moves later.
/// - Once `when_default <= now`, marks are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultLifecycle {
    /// Scheduled default time.
    when_default: Timestamp,
}

impl Default for DefaultLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultLifecycle {
    /// Creates a SOUND lifecycle.
    #[must_use]
    pub const fn new() -> Self {
        Self { when_default: Timestamp::NEVER }
    }

    /// Returns the scheduled default time.
    #[must_use]
    pub const fn when_default(&self) -> Timestamp {
        self.when_default
    }

    /// Returns the status at `now`.
    #[must_use]
    pub fn status(&self, now: Timestamp) -> CollateralStatus {
        if self.when_default == Timestamp::NEVER {
            CollateralStatus::Sound
        } else if self.when_default > now {
            CollateralStatus::Iffy
        } else {
            CollateralStatus::Disabled
        }
    }

    /// Returns true once the collateral has defaulted.
    #[must_use]
    pub fn already_defaulted(&self, now: Timestamp) -> bool {
        self.when_default <= now
    }

    /// Applies a status observation at `now`.
    ///
    /// IFFY schedules a default `delay_until_default` seconds out unless one
    /// is already due sooner. DISABLED defaults immediately. SOUND leaves the
    /// timer untouched.
    pub fn mark(&mut self, status: CollateralStatus, now: Timestamp, delay_until_default: u64) {
        if self.already_defaulted(now) {
            return;
        }
        match status {
            CollateralStatus::Sound => {}
            CollateralStatus::Iffy => {
                self.when_default = self.when_default.min(now.saturating_add(delay_until_default));
            }
            CollateralStatus::Disabled => self.when_default = now,
        }
    }
}

// ============================================================================
// SECTION: Saved Price
// ============================================================================

/// Last successfully quoted price range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SavedPrice {
    /// Saved lower bound.
    low: Fix,
    /// Saved upper bound.
    high: Fix,
    /// When the range was saved; zero when never.
    last_save: Timestamp,
}

impl SavedPrice {
    /// Returns when the range was saved.
    #[must_use]
    pub const fn last_save(&self) -> Timestamp {
        self.last_save
    }

    /// Returns the saved range without decay.
    #[must_use]
    pub const fn range(&self) -> PriceRange {
        PriceRange { low: self.low, high: self.high }
    }

    /// Records a fresh range.
    pub const fn save(&mut self, range: PriceRange, now: Timestamp) {
        self.low = range.low;
        self.high = range.high;
        self.last_save = now;
    }

    /// Returns the saved range decayed to `now`.
    #[must_use]
    pub fn decayed(&self, now: Timestamp, oracle_timeout: u64, price_timeout: u64) -> PriceRange {
        if self.last_save == Timestamp::ZERO {
            return PriceRange::UNPRICED;
        }
        let elapsed = now.seconds_since(self.last_save);
        if elapsed <= oracle_timeout {
            return self.range();
        }
        let decay = elapsed - oracle_timeout;
        if decay >= price_timeout {
            return PriceRange::UNPRICED;
        }
        let remaining = price_timeout - decay;
        let low = self.low.mul_ratio(remaining, price_timeout, Rounding::Floor).unwrap_or(Fix::ZERO);
        let high = self.high.mul_ratio(price_timeout, remaining, Rounding::Ceil).unwrap_or(Fix::MAX);
        PriceRange { low, high }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iffy_then_sound_keeps_timer() {
        let mut lifecycle = DefaultLifecycle::new();
        let now = Timestamp::from_secs(1_000);
        lifecycle.mark(CollateralStatus::Iffy, now, 100);
        lifecycle.mark(CollateralStatus::Sound, now.saturating_add(10), 100);
        assert_eq!(lifecycle.when_default(), Timestamp::from_secs(1_100));
        assert_eq!(lifecycle.status(now.saturating_add(10)), CollateralStatus::Iffy);
        assert_eq!(lifecycle.status(now.saturating_add(100)), CollateralStatus::Disabled);
    }

    #[test]
    fn second_iffy_does_not_extend_deadline() {
        let mut lifecycle = DefaultLifecycle::new();
        lifecycle.mark(CollateralStatus::Iffy, Timestamp::from_secs(10), 100);
        lifecycle.mark(CollateralStatus::Iffy, Timestamp::from_secs(50), 100);
        assert_eq!(lifecycle.when_default(), Timestamp::from_secs(110));
    }

    #[test]
    fn decay_reaches_unpriced_after_price_timeout() {
        let mut saved = SavedPrice::default();
        saved.save(PriceRange { low: Fix::ONE, high: Fix::from_int(2) }, Timestamp::from_secs(100));
        let mid = saved.decayed(Timestamp::from_secs(100 + 10 + 50), 10, 100);
        assert_eq!(mid.low, Fix::from_raw(500_000_000_000_000_000));
        assert_eq!(mid.high, Fix::from_int(4));
        let end = saved.decayed(Timestamp::from_secs(100 + 10 + 100), 10, 100);
        assert_eq!(end, PriceRange::UNPRICED);
    }
}
