// collateral-core/src/core/identifiers.rs
// ============================================================================
// Module: Collateral Identifiers
// Description: Account addresses, signer handles, and target names.
// Purpose: Provide strongly typed, serializable identifiers with stable string forms.
// Dependencies: serde, sha2, thiserror
// ============================================================================

//! ## Overview
//! Addresses are 20-byte account identifiers rendered as `0x`-prefixed
//! lowercase hex. The simulated chain derives addresses deterministically
//! from labels with SHA-256, so the same scenario always lands on the same
//! addresses. Target names mirror a `bytes32` unit of account such as `USD`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Address length in bytes.
pub const ADDRESS_LEN: usize = 20;
/// Maximum target name length in bytes.
pub const MAX_TARGET_NAME_LEN: usize = 32;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Identifier parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Address text is not `0x` followed by 40 hex digits.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    /// Target name is too long or not printable ASCII.
    #[error("invalid target name: {0}")]
    InvalidTargetName(String),
}

// ============================================================================
// SECTION: Address
// ============================================================================

/// 20-byte account or contract address.
///
/// # Invariants
/// - [`Address::ZERO`] stands for "unset", like the EVM zero address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The zero address.
    pub const ZERO: Self = Self([0; ADDRESS_LEN]);

    /// Creates an address from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw address bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Returns true for the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|byte| *byte == 0)
    }

    /// Derives a deterministic address from a label.
    ///
    /// Uses the trailing 20 bytes of `sha256(label)`.
    #[must_use]
    pub fn derive(label: &str) -> Self {
        let digest = Sha256::digest(label.as_bytes());
        let mut bytes = [0_u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest[digest.len() - ADDRESS_LEN..]);
        Self(bytes)
    }

    /// Parses `0x`-prefixed hex text.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::InvalidAddress`] when the text is malformed.
    pub fn parse(text: &str) -> Result<Self, IdentifierError> {
        let trimmed = text.trim();
        let invalid = || IdentifierError::InvalidAddress(trimmed.to_string());
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(invalid)?;
        if hex.len() != ADDRESS_LEN * 2 || !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let mut bytes = [0_u8; ADDRESS_LEN];
        for (index, byte) in bytes.iter_mut().enumerate() {
            let pair = &hex[index * 2..index * 2 + 2];
            *byte = u8::from_str_radix(pair, 16).map_err(|_| invalid())?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Address {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_string()
    }
}

// ============================================================================
// SECTION: Signer
// ============================================================================

/// Named actor able to hold balances and send transactions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signer {
    /// Human-readable label.
    label: String,
    /// Account address derived from the label.
    address: Address,
}

impl Signer {
    /// Creates the signer for a label; equal labels give equal addresses.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        let address = Address::derive(&format!("signer:{label}"));
        Self { label, address }
    }

    /// Returns the signer label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the signer address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }
}

impl fmt::Display for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.address)
    }
}

// ============================================================================
// SECTION: Target Name
// ============================================================================

/// Unit of account a collateral targets, such as `USD` or `EUR`.
///
/// # Invariants
/// - At most 32 bytes of printable ASCII.
/// - May be empty; plugins reject an empty name at deploy time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetName(String);

impl TargetName {
    /// Validates and wraps a target name.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::InvalidTargetName`] when the name is too
    /// long or contains non-printable characters.
    pub fn new(name: impl Into<String>) -> Result<Self, IdentifierError> {
        let name = name.into();
        if name.len() > MAX_TARGET_NAME_LEN || !name.bytes().all(|byte| byte.is_ascii_graphic()) {
            return Err(IdentifierError::InvalidTargetName(name));
        }
        Ok(Self(name))
    }

    /// Returns the `USD` target name.
    #[must_use]
    pub fn usd() -> Self {
        Self("USD".to_string())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the name is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TargetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for TargetName {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TargetName> for String {
    fn from(value: TargetName) -> Self {
        value.0
    }
}
