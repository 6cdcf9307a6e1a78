//! Output Scripts
//!
//! Locking-script bytes and their classification into the closed set of
//! kinds relay policy cares about. Classification is template matching
//! only; nothing here executes a script.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// OPCODES
// =============================================================================

pub mod opcodes {
    pub const OP_0: u8 = 0x00;
    pub const OP_PUSHDATA1: u8 = 0x4c;
    pub const OP_PUSHDATA2: u8 = 0x4d;
    pub const OP_PUSHDATA4: u8 = 0x4e;
    pub const OP_1: u8 = 0x51;
    pub const OP_TRUE: u8 = OP_1;
    pub const OP_16: u8 = 0x60;
    pub const OP_RETURN: u8 = 0x6a;
    pub const OP_DUP: u8 = 0x76;
    pub const OP_EQUAL: u8 = 0x87;
    pub const OP_EQUALVERIFY: u8 = 0x88;
    pub const OP_HASH160: u8 = 0xa9;
    pub const OP_CHECKSIG: u8 = 0xac;
    pub const OP_CHECKMULTISIG: u8 = 0xae;
}

use opcodes::*;

/// Scripts above this size can never be spent
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Witness programs carry between 2 and 40 bytes
pub const MIN_WITNESS_PROGRAM_LEN: usize = 2;
pub const MAX_WITNESS_PROGRAM_LEN: usize = 40;

/// Highest witness version expressible with a small-integer opcode
pub const MAX_WITNESS_VERSION: u8 = 16;

const COMPRESSED_KEY_LEN: usize = 33;
const UNCOMPRESSED_KEY_LEN: usize = 65;

// =============================================================================
// SCRIPT KIND
// =============================================================================

/// Classification of an output script
///
/// The set is closed: a new witness version that needs different treatment
/// must be added here and every `match` over it updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptKind {
    /// `<33-byte key> OP_CHECKSIG`
    PubKeyCompressed,
    /// `<65-byte key> OP_CHECKSIG`
    PubKeyUncompressed,
    /// `OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG`
    PubKeyHash,
    /// `OP_HASH160 <20> OP_EQUAL`
    ScriptHash,
    /// Witness v0, 20-byte program
    WitnessV0KeyHash,
    /// Witness v0, 32-byte program
    WitnessV0ScriptHash,
    /// Witness v1, 32-byte program
    Taproot,
    /// Any other witness version/program length pair (v1+)
    WitnessUnknown { version: u8, program_len: u8 },
    /// `OP_m <keys> OP_n OP_CHECKMULTISIG`
    Multisig { required: u8, total: u8 },
    /// Starts with OP_RETURN, provably unspendable
    NullData,
    /// Anything else
    NonStandard,
}

impl ScriptKind {
    /// Whether spends of this output are witness spends
    pub const fn is_witness_program(self) -> bool {
        matches!(
            self,
            ScriptKind::WitnessV0KeyHash
                | ScriptKind::WitnessV0ScriptHash
                | ScriptKind::Taproot
                | ScriptKind::WitnessUnknown { .. }
        )
    }

    pub const fn is_null_data(self) -> bool {
        matches!(self, ScriptKind::NullData)
    }

    /// Kinds a relaying node forwards by default
    pub const fn is_standard(self) -> bool {
        match self {
            ScriptKind::NonStandard => false,
            ScriptKind::Multisig { required, total } => {
                required >= 1 && total <= 3 && required <= total
            }
            _ => true,
        }
    }

    /// Short name as reported by node RPCs
    pub const fn name(self) -> &'static str {
        match self {
            ScriptKind::PubKeyCompressed | ScriptKind::PubKeyUncompressed => "pubkey",
            ScriptKind::PubKeyHash => "pubkeyhash",
            ScriptKind::ScriptHash => "scripthash",
            ScriptKind::WitnessV0KeyHash => "witness_v0_keyhash",
            ScriptKind::WitnessV0ScriptHash => "witness_v0_scripthash",
            ScriptKind::Taproot => "witness_v1_taproot",
            ScriptKind::WitnessUnknown { .. } => "witness_unknown",
            ScriptKind::Multisig { .. } => "multisig",
            ScriptKind::NullData => "nulldata",
            ScriptKind::NonStandard => "nonstandard",
        }
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// SCRIPT
// =============================================================================

/// Raw locking-script bytes
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script(Vec<u8>);

impl Script {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Witness version and program, if this is a witness program
    pub fn witness_program(&self) -> Option<(u8, &[u8])> {
        let bytes = &self.0;
        if bytes.len() < 2 + MIN_WITNESS_PROGRAM_LEN || bytes.len() > 2 + MAX_WITNESS_PROGRAM_LEN {
            return None;
        }
        let version = decode_small_int(bytes[0])?;
        if bytes[1] as usize + 2 != bytes.len() {
            return None;
        }
        Some((version, &bytes[2..]))
    }

    pub fn is_witness_program(&self) -> bool {
        self.witness_program().is_some()
    }

    /// Starts with OP_RETURN or is too large to ever execute
    pub fn is_unspendable(&self) -> bool {
        self.0.first() == Some(&OP_RETURN) || self.0.len() > MAX_SCRIPT_SIZE
    }

    /// Classify the script into a [`ScriptKind`]
    pub fn classify(&self) -> ScriptKind {
        let bytes = self.0.as_slice();

        if bytes.len() == 23
            && bytes[0] == OP_HASH160
            && bytes[1] == 20
            && bytes[22] == OP_EQUAL
        {
            return ScriptKind::ScriptHash;
        }

        if let Some((version, program)) = self.witness_program() {
            return match (version, program.len()) {
                (0, 20) => ScriptKind::WitnessV0KeyHash,
                (0, 32) => ScriptKind::WitnessV0ScriptHash,
                (0, _) => ScriptKind::NonStandard,
                (1, 32) => ScriptKind::Taproot,
                (version, len) => ScriptKind::WitnessUnknown {
                    version,
                    program_len: len as u8,
                },
            };
        }

        if bytes.first() == Some(&OP_RETURN) {
            return ScriptKind::NullData;
        }

        if bytes.len() == COMPRESSED_KEY_LEN + 2
            && bytes[0] as usize == COMPRESSED_KEY_LEN
            && is_valid_pubkey(&bytes[1..1 + COMPRESSED_KEY_LEN])
            && bytes[COMPRESSED_KEY_LEN + 1] == OP_CHECKSIG
        {
            return ScriptKind::PubKeyCompressed;
        }

        if bytes.len() == UNCOMPRESSED_KEY_LEN + 2
            && bytes[0] as usize == UNCOMPRESSED_KEY_LEN
            && is_valid_pubkey(&bytes[1..1 + UNCOMPRESSED_KEY_LEN])
            && bytes[UNCOMPRESSED_KEY_LEN + 1] == OP_CHECKSIG
        {
            return ScriptKind::PubKeyUncompressed;
        }

        if bytes.len() == 25
            && bytes[0] == OP_DUP
            && bytes[1] == OP_HASH160
            && bytes[2] == 20
            && bytes[23] == OP_EQUALVERIFY
            && bytes[24] == OP_CHECKSIG
        {
            return ScriptKind::PubKeyHash;
        }

        if let Some((required, total)) = match_multisig(bytes) {
            return ScriptKind::Multisig { required, total };
        }

        ScriptKind::NonStandard
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    /// `<pubkey> OP_CHECKSIG`
    pub fn p2pk(pubkey: &[u8]) -> Self {
        let mut script = Vec::with_capacity(pubkey.len() + 2);
        push_slice(&mut script, pubkey);
        script.push(OP_CHECKSIG);
        Self(script)
    }

    pub fn p2pkh(pubkey_hash: &[u8; 20]) -> Self {
        let mut script = vec![OP_DUP, OP_HASH160];
        push_slice(&mut script, pubkey_hash);
        script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        Self(script)
    }

    pub fn p2sh(script_hash: &[u8; 20]) -> Self {
        let mut script = vec![OP_HASH160];
        push_slice(&mut script, script_hash);
        script.push(OP_EQUAL);
        Self(script)
    }

    pub fn p2wpkh(pubkey_hash: &[u8; 20]) -> Self {
        Self::witness(0, pubkey_hash)
    }

    pub fn p2wsh(script_hash: &[u8; 32]) -> Self {
        Self::witness(0, script_hash)
    }

    pub fn p2tr(output_key: &[u8; 32]) -> Self {
        Self::witness(1, output_key)
    }

    /// `OP_version <program>`; callers keep `version <= 16`
    pub fn witness(version: u8, program: &[u8]) -> Self {
        let mut script = Vec::with_capacity(program.len() + 2);
        script.push(encode_small_int(version));
        push_slice(&mut script, program);
        Self(script)
    }

    /// `OP_required <keys> OP_total OP_CHECKMULTISIG`
    pub fn multisig(required: u8, pubkeys: &[&[u8]]) -> Self {
        let mut script = vec![encode_small_int(required)];
        for key in pubkeys {
            push_slice(&mut script, key);
        }
        script.push(encode_small_int(pubkeys.len() as u8));
        script.push(OP_CHECKMULTISIG);
        Self(script)
    }

    /// `OP_RETURN <data>`
    pub fn null_data(data: &[u8]) -> Self {
        let mut script = vec![OP_RETURN];
        push_slice(&mut script, data);
        Self(script)
    }

    /// Anyone-can-spend `OP_TRUE`
    pub fn op_true() -> Self {
        Self(vec![OP_TRUE])
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", hex::encode(&self.0))
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Script {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Append a minimal data push
fn push_slice(script: &mut Vec<u8>, data: &[u8]) {
    let len = data.len();
    if len < OP_PUSHDATA1 as usize {
        script.push(len as u8);
    } else if len <= 0xff {
        script.push(OP_PUSHDATA1);
        script.push(len as u8);
    } else if len <= 0xffff {
        script.push(OP_PUSHDATA2);
        script.extend_from_slice(&(len as u16).to_le_bytes());
    } else {
        script.push(OP_PUSHDATA4);
        script.extend_from_slice(&(len as u32).to_le_bytes());
    }
    script.extend_from_slice(data);
}

fn decode_small_int(opcode: u8) -> Option<u8> {
    match opcode {
        OP_0 => Some(0),
        OP_1..=OP_16 => Some(opcode - OP_1 + 1),
        _ => None,
    }
}

fn encode_small_int(value: u8) -> u8 {
    if value == 0 {
        OP_0
    } else {
        OP_1 + value.min(MAX_WITNESS_VERSION) - 1
    }
}

/// Size and prefix check only, no curve arithmetic
fn is_valid_pubkey(key: &[u8]) -> bool {
    match key.len() {
        COMPRESSED_KEY_LEN => matches!(key[0], 0x02 | 0x03),
        UNCOMPRESSED_KEY_LEN => matches!(key[0], 0x04 | 0x06 | 0x07),
        _ => false,
    }
}

fn match_multisig(bytes: &[u8]) -> Option<(u8, u8)> {
    if bytes.len() < 3 || *bytes.last()? != OP_CHECKMULTISIG {
        return None;
    }
    let required = match decode_small_int(bytes[0])? {
        0 => return None,
        m => m,
    };

    let body = &bytes[1..bytes.len() - 1];
    let mut cursor = 0;
    let mut keys: u8 = 0;
    while cursor < body.len() {
        let push = body[cursor] as usize;
        if push == COMPRESSED_KEY_LEN || push == UNCOMPRESSED_KEY_LEN {
            let key = body.get(cursor + 1..cursor + 1 + push)?;
            if !is_valid_pubkey(key) {
                return None;
            }
            keys = keys.checked_add(1)?;
            cursor += 1 + push;
        } else {
            // Must be the trailing OP_n
            if cursor + 1 != body.len() {
                return None;
            }
            let total = decode_small_int(body[cursor])?;
            if total == 0 || total != keys || required > total {
                return None;
            }
            return Some((required, total));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compressed_key() -> Vec<u8> {
        let mut key = vec![0x02];
        key.extend_from_slice(&[0x11; 32]);
        key
    }

    fn uncompressed_key() -> Vec<u8> {
        let mut key = vec![0x04];
        key.extend_from_slice(&[0x22; 64]);
        key
    }

    #[test]
    fn test_classify_standard_templates() {
        assert_eq!(Script::p2pk(&compressed_key()).classify(), ScriptKind::PubKeyCompressed);
        assert_eq!(Script::p2pk(&uncompressed_key()).classify(), ScriptKind::PubKeyUncompressed);
        assert_eq!(Script::p2pkh(&[1u8; 20]).classify(), ScriptKind::PubKeyHash);
        assert_eq!(Script::p2sh(&[2u8; 20]).classify(), ScriptKind::ScriptHash);
        assert_eq!(Script::p2wpkh(&[3u8; 20]).classify(), ScriptKind::WitnessV0KeyHash);
        assert_eq!(Script::p2wsh(&[4u8; 32]).classify(), ScriptKind::WitnessV0ScriptHash);
        assert_eq!(Script::p2tr(&[5u8; 32]).classify(), ScriptKind::Taproot);
        assert_eq!(Script::null_data(b"superimportanthash").classify(), ScriptKind::NullData);
        assert_eq!(Script::op_true().classify(), ScriptKind::NonStandard);
    }

    #[test]
    fn test_template_sizes() {
        assert_eq!(Script::p2pk(&compressed_key()).len(), 35);
        assert_eq!(Script::p2pk(&uncompressed_key()).len(), 67);
        assert_eq!(Script::p2pkh(&[0u8; 20]).len(), 25);
        assert_eq!(Script::p2sh(&[0u8; 20]).len(), 23);
        assert_eq!(Script::p2wpkh(&[0u8; 20]).len(), 22);
        assert_eq!(Script::p2wsh(&[0u8; 32]).len(), 34);
        assert_eq!(Script::p2tr(&[0u8; 32]).len(), 34);
    }

    #[test]
    fn test_future_witness_versions() {
        let v2 = Script::witness(2, &[0x66; 2]);
        assert_eq!(v2.as_bytes()[0], 0x52);
        assert_eq!(v2.classify(), ScriptKind::WitnessUnknown { version: 2, program_len: 2 });

        let v16 = Script::witness(16, &[0x77; 40]);
        assert_eq!(v16.as_bytes()[0], OP_16);
        assert_eq!(v16.len(), 42);
        assert_eq!(v16.classify(), ScriptKind::WitnessUnknown { version: 16, program_len: 40 });

        // v1 with a non-32-byte program is not taproot
        assert_eq!(
            Script::witness(1, &[0u8; 20]).classify(),
            ScriptKind::WitnessUnknown { version: 1, program_len: 20 }
        );
    }

    #[test]
    fn test_witness_program_bounds() {
        assert!(Script::witness(3, &[0u8; 40]).is_witness_program());
        assert!(!Script::witness(3, &[0u8; 41]).is_witness_program());
        assert!(!Script::witness(3, &[0u8; 1]).is_witness_program());
        // v0 with an odd length is a witness program but non-standard
        let odd_v0 = Script::witness(0, &[0u8; 25]);
        assert!(odd_v0.is_witness_program());
        assert_eq!(odd_v0.classify(), ScriptKind::NonStandard);
    }

    #[test]
    fn test_multisig_classification() {
        let key = uncompressed_key();
        let script = Script::multisig(1, &[&key, &key, &key]);
        assert_eq!(script.len(), 201);
        assert_eq!(script.classify(), ScriptKind::Multisig { required: 1, total: 3 });

        let ck = compressed_key();
        let two_of_two = Script::multisig(2, &[&ck, &key]);
        assert_eq!(two_of_two.classify(), ScriptKind::Multisig { required: 2, total: 2 });

        // required above total
        let bad = Script::multisig(3, &[&ck, &ck]);
        assert_eq!(bad.classify(), ScriptKind::NonStandard);

        // bad key prefix
        let mut wrong = ck.clone();
        wrong[0] = 0x05;
        assert_eq!(Script::multisig(1, &[&wrong]).classify(), ScriptKind::NonStandard);
    }

    #[test]
    fn test_multisig_standardness() {
        assert!(ScriptKind::Multisig { required: 1, total: 3 }.is_standard());
        assert!(!ScriptKind::Multisig { required: 1, total: 4 }.is_standard());
        assert!(!ScriptKind::NonStandard.is_standard());
        assert!(ScriptKind::NullData.is_standard());
    }

    #[test]
    fn test_unspendable() {
        assert!(Script::null_data(b"x").is_unspendable());
        assert!(Script::new(vec![OP_RETURN]).is_unspendable());
        assert!(Script::new(vec![0u8; MAX_SCRIPT_SIZE + 1]).is_unspendable());
        assert!(!Script::p2pkh(&[0u8; 20]).is_unspendable());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ScriptKind::Taproot.to_string(), "witness_v1_taproot");
        assert!(ScriptKind::WitnessUnknown { version: 5, program_len: 8 }.is_witness_program());
        assert!(!ScriptKind::PubKeyHash.is_witness_program());
    }
}
