//! Ephemeral Dust
//!
//! A zero-fee transaction whose only problem is dust is admitted anyway.
//! Economic judgment moves to whichever later transaction sweeps the dust;
//! nothing here requires that a sweep ever happens.
//!
//! With `sweep_min_package_fee_rate` configured, a sweep must pay for
//! itself and the in-pool ancestry of every dust parent it spends at that
//! package rate. Without it the exception is fee-agnostic.

use std::collections::BTreeSet;

use lib_types::Txid;
use lib_utxo::CandidateTx;

use crate::config::MempoolConfig;
use crate::dust::PolicyOutcome;
use crate::errors::AdmitErrorKind;
use crate::state::PoolIndex;

/// Consulted after the standard dust check failed
///
/// `Accept` only for a zero-fee transaction while the exception is enabled;
/// `Defer` hands the decision back to the standard rejection.
pub fn try_ephemeral_admit(candidate: &CandidateTx, config: &MempoolConfig) -> PolicyOutcome {
    if !config.permit_ephemeral_dust {
        return PolicyOutcome::Defer;
    }
    if !candidate.pays_zero_fee() {
        return PolicyOutcome::Defer;
    }

    tracing::info!(
        "Admitting zero-fee transaction {} with ephemeral dust",
        candidate.txid()
    );
    PolicyOutcome::Accept
}

/// In-pool transactions whose dust outputs `candidate` spends
pub fn dust_parents(candidate: &CandidateTx, pool: &dyn PoolIndex) -> BTreeSet<Txid> {
    candidate
        .tx()
        .inputs
        .iter()
        .map(|input| input.previous_output)
        .filter(|outpoint| {
            pool.get(&outpoint.txid)
                .map(|parent| parent.dust_outputs().contains(&outpoint.vout))
                .unwrap_or(false)
        })
        .map(|outpoint| outpoint.txid)
        .collect()
}

/// Package fee floor for transactions sweeping ephemeral dust
///
/// For every dust parent `P`:
/// `ancestor_fee(P) + fee >= rate.fee_for(ancestor_size(P) + vsize)`.
pub fn check_sweep_fee(
    candidate: &CandidateTx,
    config: &MempoolConfig,
    pool: &dyn PoolIndex,
) -> Result<(), AdmitErrorKind> {
    let Some(rate) = config.sweep_min_package_fee_rate else {
        return Ok(());
    };

    for parent in dust_parents(candidate, pool) {
        let Some((ancestor_fee, ancestor_size)) = pool.ancestor_fee_and_size(&parent) else {
            continue;
        };
        let required = rate.fee_for(ancestor_size.saturating_add(candidate.vsize()));
        let provided = ancestor_fee.saturating_add(candidate.fee());
        if provided < required {
            tracing::debug!(
                "Sweep {} of dust parent {} pays {} below package floor {}",
                candidate.txid(),
                parent,
                provided,
                required
            );
            return Err(AdmitErrorKind::SweepFeeTooLow { parent, required, provided });
        }
    }
    Ok(())
}
