//! Transaction Pool
//!
//! Thread-safe front door to the mempool. Every admission decision holds
//! the write lock from input resolution to insertion, so it sees one
//! configuration and one pool snapshot throughout.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use lib_types::{Amount, Txid};
use lib_utxo::{CandidateTx, OutPoint, Transaction, TxOut, UtxoResult, UtxoView};

use crate::admission::{admit, Admission, AdmitResult};
use crate::config::{ConfigError, MempoolConfig};
use crate::errors::{AdmitError, AdmitErrorKind};
use crate::state::{MempoolEntry, MempoolState, PoolIndex};

/// Result of a dry-run admission, shaped like the node RPC reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptResult {
    /// Hex txid
    pub txid: String,
    pub allowed: bool,
    #[serde(rename = "reject-reason", skip_serializing_if = "Option::is_none", default)]
    pub reject_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fee: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vsize: Option<u64>,
}

/// Configuration and contents read under one lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub config: MempoolConfig,
    /// Pool transactions in acceptance order
    pub txids: Vec<Txid>,
}

struct PoolInner {
    config: MempoolConfig,
    state: MempoolState,
}

/// Pool outputs layered over the confirmed chain
struct MempoolCoins<'a> {
    state: &'a MempoolState,
    chain: &'a dyn UtxoView,
}

impl UtxoView for MempoolCoins<'_> {
    fn get_output(&self, outpoint: &OutPoint) -> UtxoResult<Option<TxOut>> {
        match self.state.output(outpoint) {
            Some(output) => Ok(Some(output.clone())),
            None => self.chain.get_output(outpoint),
        }
    }
}

/// Shared mempool guarded by a single lock
pub struct TxPool {
    inner: RwLock<PoolInner>,
    chain: Arc<dyn UtxoView + Send + Sync>,
}

impl TxPool {
    /// Create an empty pool over `chain`
    pub fn new(
        config: MempoolConfig,
        chain: Arc<dyn UtxoView + Send + Sync>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            inner: RwLock::new(PoolInner {
                config,
                state: MempoolState::new(),
            }),
            chain,
        })
    }

    /// Validate and, if allowed, insert `tx`
    pub fn submit(&self, tx: Transaction) -> Result<Txid, AdmitError> {
        let mut inner = self.inner.write();
        let PoolInner { config, state } = &mut *inner;

        let (candidate, admission) = match self.evaluate(tx, config, state) {
            Ok(evaluated) => evaluated,
            Err((txid, kind)) => {
                tracing::warn!("Rejected transaction {}: {}", txid, kind.reason());
                return Err(AdmitError::new(kind));
            }
        };

        let txid = candidate.txid();
        state.insert(MempoolEntry::new(candidate, admission.dust_outputs))?;
        tracing::debug!("Accepted transaction {} ({} in pool)", txid, state.len());
        Ok(txid)
    }

    /// Run admission without inserting
    pub fn test_accept(&self, tx: Transaction) -> AcceptResult {
        let txid = tx.txid();
        let inner = self.inner.read();

        match self.evaluate(tx, &inner.config, &inner.state) {
            Ok((candidate, _)) => AcceptResult {
                txid: txid.to_hex(),
                allowed: true,
                reject_reason: None,
                fee: Some(candidate.fee()),
                vsize: Some(candidate.vsize()),
            },
            Err((_, kind)) => AcceptResult {
                txid: txid.to_hex(),
                allowed: false,
                reject_reason: Some(kind.reason().to_string()),
                fee: None,
                vsize: None,
            },
        }
    }

    /// Replace the configuration, emptying the pool
    ///
    /// Waits for in-flight admissions; the new config applies to whole
    /// decisions only.
    pub fn reconfigure(&self, config: MempoolConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let mut inner = self.inner.write();
        let dropped = inner.state.len();
        inner.state.clear();
        inner.config = config;
        tracing::info!(
            "Mempool reconfigured (dust relay fee {}), dropped {} transactions",
            inner.config.dust_relay_fee,
            dropped
        );
        Ok(())
    }

    /// Snapshot of the active configuration
    pub fn config(&self) -> MempoolConfig {
        self.inner.read().config.clone()
    }

    /// Configuration and pool contents as seen by one admission decision
    pub fn snapshot(&self) -> PoolSnapshot {
        let inner = self.inner.read();
        PoolSnapshot {
            config: inner.config.clone(),
            txids: inner.state.txids(),
        }
    }

    pub fn contains(&self, txid: &Txid) -> bool {
        self.inner.read().state.contains(txid)
    }

    /// Pool transactions in acceptance order
    pub fn txids(&self) -> Vec<Txid> {
        self.inner.read().state.txids()
    }

    pub fn len(&self) -> usize {
        self.inner.read().state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().state.is_empty()
    }

    /// Dust outputs recorded for a pool transaction
    pub fn dust_outputs(&self, txid: &Txid) -> Option<Vec<u32>> {
        self.inner
            .read()
            .state
            .get(txid)
            .map(|entry| entry.dust_outputs().to_vec())
    }

    /// Evict `txid` and its in-pool descendants
    pub fn remove(&self, txid: &Txid) -> Vec<Txid> {
        self.inner.write().state.remove(txid)
    }

    /// Drop transactions included in a block
    pub fn remove_confirmed(&self, txids: &[Txid]) -> usize {
        let mut inner = self.inner.write();
        txids
            .iter()
            .filter(|txid| inner.state.remove_confirmed(txid).is_some())
            .count()
    }

    pub fn ancestor_fee_and_size(&self, txid: &Txid) -> Option<(Amount, u64)> {
        self.inner.read().state.ancestor_fee_and_size(txid)
    }

    /// Pool-state checks, input resolution and policy
    fn evaluate(
        &self,
        tx: Transaction,
        config: &MempoolConfig,
        state: &MempoolState,
    ) -> Result<(CandidateTx, Admission), (Txid, AdmitErrorKind)> {
        let txid = tx.txid();
        if state.contains(&txid) {
            return Err((txid, AdmitErrorKind::DuplicateTransaction));
        }
        for input in &tx.inputs {
            if let Some(spender) = state.spender_of(&input.previous_output) {
                return Err((
                    txid,
                    AdmitErrorKind::MempoolConflict {
                        outpoint: input.previous_output,
                        spender,
                    },
                ));
            }
        }

        let coins = MempoolCoins {
            state,
            chain: self.chain.as_ref(),
        };
        let candidate = CandidateTx::evaluate(tx, &coins).map_err(|err| (txid, err.into()))?;

        match admit(&candidate, config, state) {
            AdmitResult::Accepted(admission) => Ok((candidate, admission)),
            AdmitResult::Rejected(kind) => Err((txid, kind)),
        }
    }
}
