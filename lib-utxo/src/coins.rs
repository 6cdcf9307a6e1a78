//! In-memory coin set

use std::collections::HashMap;

use lib_types::Txid;

use crate::errors::UtxoResult;
use crate::types::{OutPoint, Transaction, TxOut, UtxoView};

/// Plain map of unspent outputs
#[derive(Debug, Clone, Default)]
pub struct CoinSet {
    coins: HashMap<OutPoint, TxOut>,
}

impl CoinSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, outpoint: OutPoint, output: TxOut) {
        self.coins.insert(outpoint, output);
    }

    /// Add every output of `tx` under its txid
    pub fn add_transaction(&mut self, tx: &Transaction) -> Txid {
        let txid = tx.txid();
        for (vout, output) in tx.outputs.iter().enumerate() {
            self.coins.insert(OutPoint::new(txid, vout as u32), output.clone());
        }
        txid
    }

    pub fn spend(&mut self, outpoint: &OutPoint) -> Option<TxOut> {
        self.coins.remove(outpoint)
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }
}

impl UtxoView for CoinSet {
    fn get_output(&self, outpoint: &OutPoint) -> UtxoResult<Option<TxOut>> {
        Ok(self.coins.get(outpoint).cloned())
    }
}
