//! Per-Transaction Dust Check
//!
//! Stateless: a pure function of one transaction and the dust relay fee.
//! The ephemeral exception in [`crate::ephemeral`] is consulted only when
//! this check fails.

use lib_fees::{dust_threshold, OutputDescriptor};
use lib_types::FeeRate;
use lib_utxo::{CandidateTx, Transaction};

use crate::config::MempoolConfig;
use crate::ephemeral::try_ephemeral_admit;
use crate::errors::AdmitErrorKind;

/// Outcome of a single policy stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyOutcome {
    /// Stage passed
    Accept,
    /// Stage cannot admit; fall back to the standard rejection
    Defer,
    /// Terminal rejection
    Reject(AdmitErrorKind),
}

impl PolicyOutcome {
    pub fn is_accept(&self) -> bool {
        matches!(self, PolicyOutcome::Accept)
    }
}

/// How a transaction cleared the dust policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DustAdmission {
    /// No output below threshold
    Clean,
    /// Zero-fee transaction admitted with dust outputs
    Ephemeral { dust_outputs: Vec<u32> },
}

impl DustAdmission {
    pub fn dust_outputs(&self) -> &[u32] {
        match self {
            DustAdmission::Clean => &[],
            DustAdmission::Ephemeral { dust_outputs } => dust_outputs,
        }
    }
}

/// Every output below its dust threshold, as a `Dust` rejection, in order
fn dust_findings(
    tx: &Transaction,
    dust_relay_fee: FeeRate,
) -> impl Iterator<Item = AdmitErrorKind> + '_ {
    tx.outputs.iter().enumerate().filter_map(move |(index, output)| {
        let descriptor = OutputDescriptor::from_txout(output);
        let threshold = dust_threshold(dust_relay_fee, &descriptor);
        if descriptor.value >= threshold {
            return None;
        }
        tracing::debug!(
            "Output {} ({}) is dust: value {} < threshold {}",
            index,
            descriptor.kind,
            descriptor.value,
            threshold
        );
        Some(AdmitErrorKind::Dust {
            output_index: index,
            value: descriptor.value,
            threshold,
        })
    })
}

fn output_index(kind: &AdmitErrorKind) -> Option<usize> {
    match kind {
        AdmitErrorKind::Dust { output_index, .. } => Some(*output_index),
        _ => None,
    }
}

/// Indexes of outputs whose value is below their dust threshold
pub fn dust_outputs(tx: &Transaction, dust_relay_fee: FeeRate) -> Vec<usize> {
    dust_findings(tx, dust_relay_fee)
        .filter_map(|finding| output_index(&finding))
        .collect()
}

/// Reject the transaction if any output is below its dust threshold
///
/// The first offending output is reported. Never returns `Defer`.
pub fn check_dust(tx: &Transaction, dust_relay_fee: FeeRate) -> PolicyOutcome {
    match dust_findings(tx, dust_relay_fee).next() {
        Some(kind) => PolicyOutcome::Reject(kind),
        None => PolicyOutcome::Accept,
    }
}

/// Standard dust check, falling back to the ephemeral exception
///
/// ```text
/// standard check ── pass ──────────────────────────────> Clean
///        │
///        └─ fail ── ephemeral exception ── Accept ──> Ephemeral
///                                      └── Defer ───> Err(Dust)
/// ```
pub fn evaluate_dust_policy(
    candidate: &CandidateTx,
    config: &MempoolConfig,
) -> Result<DustAdmission, AdmitErrorKind> {
    let findings: Vec<AdmitErrorKind> =
        dust_findings(candidate.tx(), config.dust_relay_fee).collect();
    let Some(first) = findings.first() else {
        return Ok(DustAdmission::Clean);
    };

    match try_ephemeral_admit(candidate, config) {
        PolicyOutcome::Accept => {
            let dust_outputs = findings
                .iter()
                .filter_map(output_index)
                .map(|index| index as u32)
                .collect();
            Ok(DustAdmission::Ephemeral { dust_outputs })
        }
        PolicyOutcome::Defer => Err(first.clone()),
        PolicyOutcome::Reject(kind) => Err(kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::Txid;
    use lib_utxo::{OutPoint, Script, TxIn, TxOut};
    use proptest::prelude::*;

    fn tx_with_outputs(outputs: Vec<TxOut>) -> Transaction {
        Transaction::new(
            vec![TxIn::new(OutPoint::new(Txid::new([1u8; 32]), 0))],
            outputs,
        )
    }

    fn p2wpkh(value: u64) -> TxOut {
        TxOut::new(value, Script::p2wpkh(&[2u8; 20]))
    }

    const DEFAULT_RATE: FeeRate = FeeRate::from_sat_per_kvb(3_000);

    #[test]
    fn test_check_dust_boundary() {
        assert_eq!(check_dust(&tx_with_outputs(vec![p2wpkh(294)]), DEFAULT_RATE), PolicyOutcome::Accept);
        assert_eq!(
            check_dust(&tx_with_outputs(vec![p2wpkh(293)]), DEFAULT_RATE),
            PolicyOutcome::Reject(AdmitErrorKind::Dust {
                output_index: 0,
                value: 293,
                threshold: 294,
            })
        );
    }

    #[test]
    fn test_check_dust_reports_first_offender() {
        let tx = tx_with_outputs(vec![p2wpkh(10_000), p2wpkh(1), p2wpkh(2)]);
        match check_dust(&tx, DEFAULT_RATE) {
            PolicyOutcome::Reject(AdmitErrorKind::Dust { output_index, .. }) => {
                assert_eq!(output_index, 1)
            }
            other => panic!("expected dust rejection, got {other:?}"),
        }
        assert_eq!(dust_outputs(&tx, DEFAULT_RATE), vec![1, 2]);
    }

    #[test]
    fn test_null_data_skipped() {
        let tx = tx_with_outputs(vec![TxOut::new(0, Script::null_data(b"hello")), p2wpkh(500)]);
        assert!(check_dust(&tx, DEFAULT_RATE).is_accept());
        assert!(dust_outputs(&tx, DEFAULT_RATE).is_empty());
    }

    #[test]
    fn test_zero_rate_is_noop() {
        let tx = tx_with_outputs(vec![p2wpkh(0), p2wpkh(1)]);
        assert!(check_dust(&tx, FeeRate::ZERO).is_accept());
    }

    #[test]
    fn test_policy_clean() {
        let candidate = CandidateTx::from_parts(tx_with_outputs(vec![p2wpkh(1_000)]), 500);
        let config = MempoolConfig::for_testing();
        assert_eq!(evaluate_dust_policy(&candidate, &config), Ok(DustAdmission::Clean));
    }

    #[test]
    fn test_policy_zero_fee_is_ephemeral() {
        let candidate = CandidateTx::from_parts(tx_with_outputs(vec![p2wpkh(1), p2wpkh(1)]), 0);
        let config = MempoolConfig::for_testing();
        let admission = evaluate_dust_policy(&candidate, &config).unwrap();
        assert_eq!(admission.dust_outputs(), &[0, 1]);
    }

    #[test]
    fn test_policy_records_every_dust_output() {
        let tx = tx_with_outputs(vec![p2wpkh(1), p2wpkh(10_000), p2wpkh(293), p2wpkh(294)]);
        let candidate = CandidateTx::from_parts(tx.clone(), 0);
        let admission = evaluate_dust_policy(&candidate, &MempoolConfig::for_testing()).unwrap();

        let expected: Vec<u32> = dust_outputs(&tx, DEFAULT_RATE).into_iter().map(|i| i as u32).collect();
        assert_eq!(expected, vec![0, 2]);
        assert_eq!(admission, DustAdmission::Ephemeral { dust_outputs: expected });
    }

    #[test]
    fn test_policy_fee_paying_dust_rejected() {
        let candidate = CandidateTx::from_parts(tx_with_outputs(vec![p2wpkh(1), p2wpkh(1)]), 1);
        let config = MempoolConfig::for_testing();
        let err = evaluate_dust_policy(&candidate, &config).unwrap_err();
        assert_eq!(err.reason(), "dust");
    }

    #[test]
    fn test_policy_ephemeral_disabled() {
        let candidate = CandidateTx::from_parts(tx_with_outputs(vec![p2wpkh(1)]), 0);
        let config = MempoolConfig {
            permit_ephemeral_dust: false,
            ..MempoolConfig::for_testing()
        };
        let err = evaluate_dust_policy(&candidate, &config).unwrap_err();
        assert!(err.is_dust());
    }

    proptest! {
        #[test]
        fn prop_check_is_idempotent(
            values in prop::collection::vec(0u64..2_000, 1..6),
            rate in 0u64..400_000,
        ) {
            let tx = tx_with_outputs(values.into_iter().map(p2wpkh).collect());
            let rate = FeeRate::from_sat_per_kvb(rate);
            let first = check_dust(&tx, rate);
            prop_assert_eq!(&first, &check_dust(&tx, rate));
            prop_assert_eq!(first.is_accept(), dust_outputs(&tx, rate).is_empty());
        }
    }
}
