//! Dust Threshold Model
//!
//! Pure, deterministic dust thresholds for transaction relay.
//!
//! # Design Principles
//!
//! 1. **Pure functions** - No side effects, no global state
//! 2. **Deterministic** - Same inputs produce identical outputs across all platforms
//! 3. **No floats** - All arithmetic uses u64/u128 integers
//! 4. **Closed set** - Costs are a `match` over `ScriptKind`, new kinds are compile errors
//!
//! # Usage
//!
//! ```ignore
//! use lib_fees::{dust_threshold, OutputDescriptor, DEFAULT_DUST_RELAY_FEE};
//!
//! let output = OutputDescriptor::from_txout(&txout);
//! if output.value < dust_threshold(DEFAULT_DUST_RELAY_FEE, &output) {
//!     // reject: "dust"
//! }
//! ```

pub mod dust;

#[cfg(test)]
mod golden_vectors;

pub use dust::{
    byte_cost, dust_threshold, is_dust, marginal_cost, OutputDescriptor,
    DEFAULT_DUST_RELAY_FEE, LEGACY_SPEND_COST, WITNESS_SPEND_COST,
};
