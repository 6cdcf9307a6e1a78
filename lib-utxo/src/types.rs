//! Transaction Types
//!
//! Core types for UTXO-based transactions and their serialized sizes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use lib_types::{Amount, Txid};

use crate::encode::{compact_size_len, write_compact_size, write_var_bytes};
use crate::errors::UtxoResult;
use crate::script::Script;

/// Weight units per non-witness byte
pub const WITNESS_SCALE_FACTOR: u64 = 4;

/// OutPoint - Reference to a specific output in a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutPoint {
    /// Transaction id containing the output
    pub txid: Txid,
    /// Index of the output in the transaction
    pub vout: u32,
}

impl OutPoint {
    /// Create a new OutPoint
    pub const fn new(txid: Txid, vout: u32) -> Self {
        Self { txid, vout }
    }

    /// Wire encoding: txid bytes then little-endian index
    pub fn to_bytes(&self) -> [u8; 36] {
        let mut bytes = [0u8; 36];
        bytes[..32].copy_from_slice(self.txid.as_bytes());
        bytes[32..36].copy_from_slice(&self.vout.to_le_bytes());
        bytes
    }

    /// Parse from bytes
    pub fn from_bytes(bytes: &[u8; 36]) -> Self {
        let mut txid = [0u8; 32];
        txid.copy_from_slice(&bytes[..32]);
        let vout = u32::from_le_bytes([bytes[32], bytes[33], bytes[34], bytes[35]]);
        Self {
            txid: Txid::new(txid),
            vout,
        }
    }
}

/// Transaction input (reference to the output being spent)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    pub previous_output: OutPoint,
    pub script_sig: Script,
    pub sequence: u32,
    /// Witness stack, empty for legacy spends
    pub witness: Vec<Vec<u8>>,
}

impl TxIn {
    /// Final-sequence input with empty unlocking data
    pub fn new(previous_output: OutPoint) -> Self {
        Self {
            previous_output,
            script_sig: Script::default(),
            sequence: u32::MAX,
            witness: Vec::new(),
        }
    }

    pub fn with_script_sig(mut self, script_sig: Script) -> Self {
        self.script_sig = script_sig;
        self
    }

    pub fn with_witness(mut self, witness: Vec<Vec<u8>>) -> Self {
        self.witness = witness;
        self
    }
}

/// Transaction output (new coin being created)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxOut {
    /// Value in smallest units
    pub value: Amount,
    /// Locking script
    pub script_pubkey: Script,
}

impl TxOut {
    pub fn new(value: Amount, script_pubkey: Script) -> Self {
        Self { value, script_pubkey }
    }

    /// Value field + script length prefix + script bytes
    pub fn serialized_size(&self) -> usize {
        let script_len = self.script_pubkey.len();
        8 + compact_size_len(script_len as u64) + script_len
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.value.to_le_bytes());
        write_var_bytes(out, self.script_pubkey.as_bytes());
    }
}

/// A transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
}

impl Transaction {
    /// Version 2 transaction with no lock time
    pub fn new(inputs: Vec<TxIn>, outputs: Vec<TxOut>) -> Self {
        Self {
            version: 2,
            inputs,
            outputs,
            lock_time: 0,
        }
    }

    pub fn has_witness(&self) -> bool {
        self.inputs.iter().any(|input| !input.witness.is_empty())
    }

    /// Consensus encoding; witness data only when `include_witness` and present
    pub fn encode(&self, include_witness: bool) -> Vec<u8> {
        let with_witness = include_witness && self.has_witness();
        let mut out = Vec::with_capacity(128);

        out.extend_from_slice(&self.version.to_le_bytes());
        if with_witness {
            // marker, flag
            out.extend_from_slice(&[0x00, 0x01]);
        }

        write_compact_size(&mut out, self.inputs.len() as u64);
        for input in &self.inputs {
            out.extend_from_slice(&input.previous_output.to_bytes());
            write_var_bytes(&mut out, input.script_sig.as_bytes());
            out.extend_from_slice(&input.sequence.to_le_bytes());
        }

        write_compact_size(&mut out, self.outputs.len() as u64);
        for output in &self.outputs {
            output.encode_into(&mut out);
        }

        if with_witness {
            for input in &self.inputs {
                write_compact_size(&mut out, input.witness.len() as u64);
                for item in &input.witness {
                    write_var_bytes(&mut out, item);
                }
            }
        }

        out.extend_from_slice(&self.lock_time.to_le_bytes());
        out
    }

    /// Double SHA-256 of the non-witness encoding
    pub fn txid(&self) -> Txid {
        let first = Sha256::digest(self.encode(false));
        let second = Sha256::digest(first);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&second);
        Txid::new(bytes)
    }

    /// Serialized size without witness data
    pub fn base_size(&self) -> usize {
        self.encode(false).len()
    }

    /// Serialized size including witness data
    pub fn total_size(&self) -> usize {
        self.encode(true).len()
    }

    pub fn weight(&self) -> u64 {
        let base = self.base_size() as u64;
        let total = self.total_size() as u64;
        base * (WITNESS_SCALE_FACTOR - 1) + total
    }

    /// Virtual size: weight / 4, rounded up
    pub fn vsize(&self) -> u64 {
        self.weight().div_ceil(WITNESS_SCALE_FACTOR)
    }

    /// Sum of output values, `None` on overflow
    pub fn total_output_value(&self) -> Option<Amount> {
        self.outputs
            .iter()
            .try_fold(0 as Amount, |acc, output| acc.checked_add(output.value))
    }
}

/// Read access to spendable outputs
///
/// Implementations may be backed by the confirmed UTXO set, the mempool,
/// or a layering of both.
pub trait UtxoView {
    /// Get the unspent output at `outpoint`
    fn get_output(&self, outpoint: &OutPoint) -> UtxoResult<Option<TxOut>>;

    /// Check if an output exists
    fn output_exists(&self, outpoint: &OutPoint) -> UtxoResult<bool> {
        Ok(self.get_output(outpoint)?.is_some())
    }
}
