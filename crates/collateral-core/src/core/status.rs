// collateral-core/src/core/status.rs
// ============================================================================
// Module: Collateral Status
// Description: Closed collateral health states.
// Purpose: Encode the one-way SOUND -> IFFY -> DISABLED lifecycle.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Status values share their numeric encoding with on-chain collateral
//! plugins (`SOUND = 0`, `IFFY = 1`, `DISABLED = 2`). Ordering follows
//! severity, so `max` picks the worse of two states.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Status
// ============================================================================

/// Health of a collateral plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum CollateralStatus {
    /// Healthy.
    Sound = 0,
    /// Temporarily unhealthy; defaults after the delay elapses.
    Iffy = 1,
    /// Defaulted. Terminal.
    Disabled = 2,
}

impl CollateralStatus {
    /// Returns the numeric encoding.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns the canonical upper-case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sound => "SOUND",
            Self::Iffy => "IFFY",
            Self::Disabled => "DISABLED",
        }
    }

    /// Returns true when `next` is reachable from `self` without recovery.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        next >= self
    }
}

impl fmt::Display for CollateralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when decoding an unknown status value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown collateral status: {0}")]
pub struct UnknownStatus(pub u8);

impl TryFrom<u8> for CollateralStatus {
    type Error = UnknownStatus;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Sound),
            1 => Ok(Self::Iffy),
            2 => Ok(Self::Disabled),
            other => Err(UnknownStatus(other)),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use super::*;

    #[test]
    fn numeric_encoding_round_trips_and_rejects_unknown_codes() {
        for (code, status) in [
            (0, CollateralStatus::Sound),
            (1, CollateralStatus::Iffy),
            (2, CollateralStatus::Disabled),
        ] {
            assert_eq!(status.as_u8(), code);
            assert_eq!(CollateralStatus::try_from(code), Ok(status));
        }
        assert_eq!(CollateralStatus::try_from(3), Err(UnknownStatus(3)));
        assert_eq!(UnknownStatus(3).to_string(), "unknown collateral status: 3");
    }

    #[test]
    fn serializes_as_upper_case_labels() {
        assert_eq!(serde_json::to_string(&CollateralStatus::Sound).unwrap(), "\"SOUND\"");
        assert_eq!(serde_json::to_string(&CollateralStatus::Disabled).unwrap(), "\"DISABLED\"");
        let parsed: CollateralStatus = serde_json::from_str("\"IFFY\"").unwrap();
        assert_eq!(parsed, CollateralStatus::Iffy);
        assert!(serde_json::from_str::<CollateralStatus>("\"iffy\"").is_err());
    }

    #[test]
    fn transitions_only_move_toward_disabled() {
        assert!(CollateralStatus::Sound.can_transition_to(CollateralStatus::Iffy));
        assert!(CollateralStatus::Iffy.can_transition_to(CollateralStatus::Iffy));
        assert!(!CollateralStatus::Iffy.can_transition_to(CollateralStatus::Sound));
        assert!(!CollateralStatus::Disabled.can_transition_to(CollateralStatus::Iffy));
    }
}
