//! Mempool Admission Logic
//!
//! The `admit` function runs relay policy over a resolved candidate.
//! Input existence, duplicates and conflicts are resolved by the caller
//! ([`crate::TxPool`]) before policy runs.

use lib_utxo::{CandidateTx, ScriptKind};

use crate::config::MempoolConfig;
use crate::dust::{evaluate_dust_policy, DustAdmission};
use crate::ephemeral::check_sweep_fee;
use crate::errors::AdmitErrorKind;
use crate::state::MempoolState;

/// Details of an accepted candidate
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Admission {
    /// Outputs below the dust threshold (non-empty only when ephemeral)
    pub dust_outputs: Vec<u32>,
    /// Admitted through the ephemeral dust exception
    pub ephemeral: bool,
}

impl From<DustAdmission> for Admission {
    fn from(dust: DustAdmission) -> Self {
        match dust {
            DustAdmission::Clean => Self::default(),
            DustAdmission::Ephemeral { dust_outputs } => Self {
                dust_outputs,
                ephemeral: true,
            },
        }
    }
}

/// Result of admission check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmitResult {
    /// Transaction may enter the mempool
    Accepted(Admission),
    /// Transaction rejected with reason
    Rejected(AdmitErrorKind),
}

impl AdmitResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AdmitResult::Accepted(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, AdmitResult::Rejected(_))
    }

    /// Wire reason string, if rejected
    pub fn reject_reason(&self) -> Option<&'static str> {
        match self {
            AdmitResult::Accepted(_) => None,
            AdmitResult::Rejected(kind) => Some(kind.reason()),
        }
    }
}

/// Perform mempool admission check
///
/// # Checks
///
/// 1. **Size**: `weight <= max_tx_weight`
/// 2. **Standard outputs**: every output script is a standard kind
/// 3. **Dust**: no output below its threshold, unless ephemeral
/// 4. **Relay fee**: non-zero fees cover `min_relay_fee` for the vsize
/// 5. **Sweep fee**: package floor for dust sweeps, when configured
/// 6. **Chain limits**: in-pool ancestor and descendant counts
/// 7. **Bounded totals**: mempool count and byte capacity
///
/// # Returns
///
/// `AdmitResult::Accepted(details)` or `AdmitResult::Rejected(reason)`
pub fn admit(candidate: &CandidateTx, config: &MempoolConfig, state: &MempoolState) -> AdmitResult {
    match run_checks(candidate, config, state) {
        Ok(admission) => AdmitResult::Accepted(admission),
        Err(kind) => AdmitResult::Rejected(kind),
    }
}

fn run_checks(
    candidate: &CandidateTx,
    config: &MempoolConfig,
    state: &MempoolState,
) -> Result<Admission, AdmitErrorKind> {
    // =========================================================================
    // Check 1: Transaction size limits
    // =========================================================================
    if candidate.weight() > config.max_tx_weight {
        return Err(AdmitErrorKind::TxTooLarge {
            weight: candidate.weight(),
            max: config.max_tx_weight,
        });
    }

    // =========================================================================
    // Check 2: Output standardness
    // =========================================================================
    for (output_index, output) in candidate.tx().outputs.iter().enumerate() {
        let kind = output.script_pubkey.classify();
        if !kind.is_standard() {
            return Err(AdmitErrorKind::NonStandardScript { output_index });
        }
        if matches!(kind, ScriptKind::Multisig { .. }) && !config.permit_bare_multisig {
            return Err(AdmitErrorKind::BareMultisig { output_index });
        }
    }

    // =========================================================================
    // Check 3: Dust policy (standard check, then ephemeral exception)
    // =========================================================================
    let admission = Admission::from(evaluate_dust_policy(candidate, config)?);

    // =========================================================================
    // Check 4: Minimum relay fee
    // =========================================================================
    // Zero-fee transactions reaching here are dust-free or ephemeral.
    if !candidate.pays_zero_fee() {
        let required = config.min_relay_fee.fee_for(candidate.vsize());
        if candidate.fee() < required {
            return Err(AdmitErrorKind::InsufficientFee {
                required,
                provided: candidate.fee(),
            });
        }
    }

    // =========================================================================
    // Check 5: Ephemeral dust sweep fee
    // =========================================================================
    check_sweep_fee(candidate, config, state)?;

    // =========================================================================
    // Check 6: Ancestor / descendant limits
    // =========================================================================
    let ancestors = state.ancestors_of(candidate.tx());
    let ancestor_count = ancestors.len() + 1;
    if ancestor_count > config.max_ancestor_count {
        return Err(AdmitErrorKind::TooManyAncestors {
            count: ancestor_count,
            max: config.max_ancestor_count,
        });
    }
    for ancestor in &ancestors {
        let count = state.descendant_count(ancestor) + 1;
        if count > config.max_descendant_count {
            return Err(AdmitErrorKind::TooManyDescendants {
                ancestor: *ancestor,
                count,
                max: config.max_descendant_count,
            });
        }
    }

    // =========================================================================
    // Check 7: Mempool capacity
    // =========================================================================
    if !state.has_tx_capacity(config.max_tx_count) {
        return Err(AdmitErrorKind::MempoolFull);
    }
    if !state.has_byte_capacity(config.max_mempool_bytes, candidate.vsize()) {
        return Err(AdmitErrorKind::MempoolBytesFull {
            current: state.total_bytes(),
            max: config.max_mempool_bytes,
        });
    }

    tracing::debug!(
        "Transaction {} passed admission (fee {}, vsize {})",
        candidate.txid(),
        candidate.fee(),
        candidate.vsize()
    );
    Ok(admission)
}
