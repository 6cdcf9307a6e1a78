//! Transaction model for relay policy
//!
//! This crate provides transactions, their serialized sizes, output script
//! classification and the coin lookups needed to compute a fee.
//!
//! # Key Rules
//!
//! 1. **Inputs must exist**: All referenced outputs must be present in the view
//! 2. **No double spend**: Each outpoint can only be spent once per transaction
//! 3. **Fee is derived**: `fee = sum(inputs) - sum(outputs)`, never negative
//!
//! # Usage
//!
//! ```ignore
//! use lib_utxo::{CandidateTx, CoinSet};
//!
//! let candidate = CandidateTx::evaluate(tx, &coins)?;
//! println!("fee {} over {} vbytes", candidate.fee(), candidate.vsize());
//! ```

pub mod types;
pub mod script;
pub mod encode;
pub mod coins;
pub mod candidate;
pub mod errors;

pub use types::*;
pub use script::{Script, ScriptKind, MAX_SCRIPT_SIZE};
pub use coins::CoinSet;
pub use candidate::CandidateTx;
pub use errors::{UtxoError, UtxoResult};
