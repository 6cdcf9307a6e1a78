//! Relay policy primitives.
//! Stable, protocol-neutral, behavior-free.
//!
//! Rule: amounts and fee rates are integers. Ever.

pub mod primitives;
pub mod fee_rate;
pub mod errors;

pub use primitives::{Amount, Txid, COIN, MAX_MONEY, money_range};
pub use fee_rate::FeeRate;
pub use errors::ParseFeeRateError;
