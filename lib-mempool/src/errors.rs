//! Mempool Admission Errors

use thiserror::Error;
use lib_types::{Amount, Txid};
use lib_utxo::{OutPoint, UtxoError};

/// Specific reason for admission rejection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmitErrorKind {
    // Dust policy
    Dust { output_index: usize, value: Amount, threshold: Amount },

    // Fee errors
    InsufficientFee { required: Amount, provided: Amount },
    SweepFeeTooLow { parent: Txid, required: Amount, provided: Amount },

    // Standardness errors
    TxTooLarge { weight: u64, max: u64 },
    NonStandardScript { output_index: usize },
    BareMultisig { output_index: usize },

    // Mempool chain and capacity errors
    TooManyAncestors { count: usize, max: usize },
    TooManyDescendants { ancestor: Txid, count: usize, max: usize },
    MempoolFull,
    MempoolBytesFull { current: u64, max: u64 },

    // Pool state errors
    DuplicateTransaction,
    MempoolConflict { outpoint: OutPoint, spender: Txid },
    MissingInputs { outpoint: OutPoint },

    // Validation errors
    InvalidTransaction(UtxoError),
}

impl AdmitErrorKind {
    /// Reject reason string reported to submitters
    pub fn reason(&self) -> &'static str {
        match self {
            AdmitErrorKind::Dust { .. } => "dust",
            AdmitErrorKind::InsufficientFee { .. } => "min relay fee not met",
            AdmitErrorKind::SweepFeeTooLow { .. } => "ephemeral-sweep-fee-too-low",
            AdmitErrorKind::TxTooLarge { .. } => "tx-size",
            AdmitErrorKind::NonStandardScript { .. } => "scriptpubkey",
            AdmitErrorKind::BareMultisig { .. } => "bare-multisig",
            AdmitErrorKind::TooManyAncestors { .. }
            | AdmitErrorKind::TooManyDescendants { .. } => "too-long-mempool-chain",
            AdmitErrorKind::MempoolFull | AdmitErrorKind::MempoolBytesFull { .. } => "mempool full",
            AdmitErrorKind::DuplicateTransaction => "txn-already-in-mempool",
            AdmitErrorKind::MempoolConflict { .. } => "txn-mempool-conflict",
            AdmitErrorKind::MissingInputs { .. } => "missing-inputs",
            AdmitErrorKind::InvalidTransaction(err) => match err {
                UtxoError::EmptyInputs => "bad-txns-vin-empty",
                UtxoError::EmptyOutputs => "bad-txns-vout-empty",
                UtxoError::DuplicateInput(_) => "bad-txns-inputs-duplicate",
                UtxoError::OutputOutOfRange { .. } => "bad-txns-vout-toolarge",
                UtxoError::InsufficientInput { .. } => "bad-txns-in-belowout",
                UtxoError::Overflow => "bad-txns-txouttotal-toolarge",
                UtxoError::NotFound(_) => "missing-inputs",
                UtxoError::Storage(_) => "coins-unavailable",
            },
        }
    }

    pub fn is_dust(&self) -> bool {
        matches!(self, AdmitErrorKind::Dust { .. })
    }
}

impl From<UtxoError> for AdmitErrorKind {
    fn from(err: UtxoError) -> Self {
        match err {
            UtxoError::NotFound(outpoint) => AdmitErrorKind::MissingInputs { outpoint },
            other => AdmitErrorKind::InvalidTransaction(other),
        }
    }
}

/// Error during mempool admission
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Admission rejected: {} ({kind:?})", .kind.reason())]
pub struct AdmitError {
    pub kind: AdmitErrorKind,
}

impl AdmitError {
    pub fn new(kind: AdmitErrorKind) -> Self {
        Self { kind }
    }

    pub fn reason(&self) -> &'static str {
        self.kind.reason()
    }

    pub fn dust(output_index: usize, value: Amount, threshold: Amount) -> Self {
        Self::new(AdmitErrorKind::Dust { output_index, value, threshold })
    }
}

impl From<AdmitErrorKind> for AdmitError {
    fn from(kind: AdmitErrorKind) -> Self {
        Self::new(kind)
    }
}
