//! UTXO Errors

use thiserror::Error;
use lib_types::Amount;

use crate::types::OutPoint;

/// Error while resolving a transaction against a coin view
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UtxoError {
    #[error("Output not found: {0:?}")]
    NotFound(OutPoint),

    #[error("Duplicate input: {0:?}")]
    DuplicateInput(OutPoint),

    #[error("Insufficient input value: have {have}, need {need}")]
    InsufficientInput { have: Amount, need: Amount },

    #[error("Output {index} value {value} outside the money range")]
    OutputOutOfRange { index: usize, value: Amount },

    #[error("Empty inputs")]
    EmptyInputs,

    #[error("Empty outputs")]
    EmptyOutputs,

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for UTXO operations
pub type UtxoResult<T> = Result<T, UtxoError>;
