//! Canonical Primitive Types
//!
//! These types are the foundational building blocks for transaction
//! relay policy. They are designed to be:
//! - Fixed-size (no dynamic allocation)
//! - Deterministically serializable
//! - Efficient to copy and compare

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// AMOUNTS
// ============================================================================

/// Value in the smallest currency unit
pub type Amount = u64;

/// Smallest units per whole coin
pub const COIN: Amount = 100_000_000;

/// Upper bound for any single amount (21 million coins)
pub const MAX_MONEY: Amount = 21_000_000 * COIN;

/// Check that an amount lies in `[0, MAX_MONEY]`
pub const fn money_range(value: Amount) -> bool {
    value <= MAX_MONEY
}

// ============================================================================
// HASH TYPES
// ============================================================================

/// 32-byte transaction id (double SHA-256 of the non-witness encoding)
///
/// Bytes are stored in internal order; `Display` prints them reversed,
/// matching how ids are shown by nodes and explorers.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize, Default)]
pub struct Txid(pub [u8; 32]);

impl Txid {
    /// Create a new Txid from raw bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a zeroed Txid
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Get the underlying bytes
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero hash
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Hex string in display (reversed) byte order
    pub fn to_hex(&self) -> String {
        let mut reversed = self.0;
        reversed.reverse();
        hex::encode(reversed)
    }
}

impl fmt::Debug for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txid({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<[u8; 32]> for Txid {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Txid {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
