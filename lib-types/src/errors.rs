//! Primitive parsing errors

use thiserror::Error;

/// Failure to read a fee rate from its operator-facing notation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFeeRateError {
    #[error("empty fee rate")]
    Empty,

    #[error("negative fee rate: {0}")]
    Negative(String),

    #[error("fee rate is not a finite number: {0}")]
    NotFinite(String),

    #[error("malformed fee rate: {0}")]
    Malformed(String),

    #[error("fee rate {0} has more than 8 decimal places")]
    TooPrecise(String),

    #[error("fee rate {0} exceeds the money range")]
    OutOfRange(String),
}
