//! Dust Threshold Model (Pure Functions)
//!
//! Deterministic per-output dust thresholds.
//!
//! # Rules (enforced in code)
//!
//! - `byte_cost = serialized_output_size + spend_cost[kind]`
//! - `threshold = floor(dust_relay_fee * byte_cost / 1000)`
//! - Unspendable outputs (null-data, oversized scripts) have threshold 0
//! - No floats, u128 arithmetic inside `FeeRate::fee_for`
//!
//! An output is dust when `value < threshold`; a value equal to the
//! threshold is not dust.

use serde::{Deserialize, Serialize};

use lib_types::{Amount, FeeRate};
use lib_utxo::{ScriptKind, TxOut, MAX_SCRIPT_SIZE};
use lib_utxo::encode::compact_size_len;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default dust relay fee: 3000 sat/kvB
pub const DEFAULT_DUST_RELAY_FEE: FeeRate = FeeRate::from_sat_per_kvb(3_000);

/// Bytes to later spend a witness output
///
/// outpoint (32 + 4) + empty script_sig length (1) + sequence (4)
/// + a 107-byte witness counted at a quarter of its size (26).
pub const WITNESS_SPEND_COST: u64 = 32 + 4 + 1 + (107 / 4) + 4;

/// Bytes to later spend a non-witness output
///
/// outpoint (32 + 4) + script_sig length (1) + 107-byte script_sig
/// + sequence (4).
pub const LEGACY_SPEND_COST: u64 = 32 + 4 + 1 + 107 + 4;

// =============================================================================
// OUTPUT DESCRIPTOR
// =============================================================================

/// An output reduced to what the cost model needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputDescriptor {
    /// Value in smallest units
    pub value: Amount,
    /// Classified script kind
    pub kind: ScriptKind,
    /// Length of the locking script in bytes
    pub script_len: usize,
}

impl OutputDescriptor {
    pub const fn new(value: Amount, kind: ScriptKind, script_len: usize) -> Self {
        Self { value, kind, script_len }
    }

    /// Classify a transaction output
    pub fn from_txout(output: &TxOut) -> Self {
        Self::new(
            output.value,
            output.script_pubkey.classify(),
            output.script_pubkey.len(),
        )
    }

    /// Value field + script length prefix + script bytes
    pub fn serialized_size(&self) -> u64 {
        (8 + compact_size_len(self.script_len as u64) + self.script_len) as u64
    }

    /// Null-data or too large to ever be executed
    pub fn is_unspendable(&self) -> bool {
        self.kind.is_null_data() || self.script_len > MAX_SCRIPT_SIZE
    }
}

impl From<&TxOut> for OutputDescriptor {
    fn from(output: &TxOut) -> Self {
        Self::from_txout(output)
    }
}

// =============================================================================
// COST MODEL
// =============================================================================

/// Bytes a future input spending this output will add
///
/// `None` for null-data outputs, which are never spent.
pub const fn marginal_cost(kind: ScriptKind) -> Option<u64> {
    match kind {
        ScriptKind::WitnessV0KeyHash
        | ScriptKind::WitnessV0ScriptHash
        | ScriptKind::Taproot
        | ScriptKind::WitnessUnknown { .. } => Some(WITNESS_SPEND_COST),
        ScriptKind::PubKeyCompressed
        | ScriptKind::PubKeyUncompressed
        | ScriptKind::PubKeyHash
        | ScriptKind::ScriptHash
        | ScriptKind::Multisig { .. }
        | ScriptKind::NonStandard => Some(LEGACY_SPEND_COST),
        ScriptKind::NullData => None,
    }
}

/// Total bytes charged for creating and later spending an output
///
/// `None` when the output is unspendable.
pub fn byte_cost(output: &OutputDescriptor) -> Option<u64> {
    if output.is_unspendable() {
        return None;
    }
    marginal_cost(output.kind).map(|spend| output.serialized_size() + spend)
}

// =============================================================================
// THRESHOLD
// =============================================================================

/// Minimum non-dust value for `output` at `dust_relay_fee`
///
/// ```
/// use lib_fees::{dust_threshold, OutputDescriptor, DEFAULT_DUST_RELAY_FEE};
/// use lib_utxo::ScriptKind;
///
/// let p2wpkh = OutputDescriptor::new(0, ScriptKind::WitnessV0KeyHash, 22);
/// assert_eq!(dust_threshold(DEFAULT_DUST_RELAY_FEE, &p2wpkh), 294);
/// ```
pub fn dust_threshold(dust_relay_fee: FeeRate, output: &OutputDescriptor) -> Amount {
    match byte_cost(output) {
        Some(bytes) => dust_relay_fee.fee_for(bytes),
        None => 0,
    }
}

/// Whether `output` is below its dust threshold
pub fn is_dust(output: &OutputDescriptor, dust_relay_fee: FeeRate) -> bool {
    output.value < dust_threshold(dust_relay_fee, output)
}
