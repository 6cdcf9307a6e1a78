//! Mempool Admission
//!
//! Relay policy for unconfirmed transactions, centred on dust.
//!
//! # Purpose
//!
//! Outputs worth less than the cost of spending them bloat the UTXO set.
//! Admission rejects them with reason `"dust"`, except for zero-fee
//! transactions, whose dust is expected to be swept by a later child
//! ("ephemeral dust").
//!
//! # Checks Performed
//!
//! 1. **Size and standardness**: weight limit, standard output scripts
//! 2. **Dust**: every output at or above its threshold, or zero fee
//! 3. **Relay fee**: `fee >= min_relay_fee` for fee-paying transactions
//! 4. **Sweep fee**: optional package floor for dust sweeps
//! 5. **Bounded totals**: chain limits and mempool capacity
//!
//! # Usage
//!
//! ```ignore
//! use lib_mempool::{MempoolConfig, TxPool};
//!
//! let pool = TxPool::new(MempoolConfig::default(), chain)?;
//! match pool.submit(tx) {
//!     Ok(txid) => { /* relay */ }
//!     Err(err) => { /* err.reason() == "dust", ... */ }
//! }
//! ```

pub mod admission;
pub mod config;
pub mod dust;
pub mod ephemeral;
pub mod errors;
pub mod pool;
pub mod state;

pub use admission::{admit, Admission, AdmitResult};
pub use config::{ConfigError, FeeRateSetting, MempoolConfig, MempoolConfigFile};
pub use dust::{check_dust, dust_outputs, evaluate_dust_policy, DustAdmission, PolicyOutcome};
pub use ephemeral::{check_sweep_fee, dust_parents, try_ephemeral_admit};
pub use errors::{AdmitError, AdmitErrorKind};
pub use pool::{AcceptResult, PoolSnapshot, TxPool};
pub use state::{MempoolEntry, MempoolState, PoolIndex};
