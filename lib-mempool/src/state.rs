//! Mempool State
//!
//! Accepted transactions, the outpoints they spend and their in-pool
//! parent/child links. Ancestor and descendant aggregates are computed by
//! walking those links, so they stay correct across any removal order.
//!
//! Not thread-safe; [`crate::TxPool`] owns the lock.

use std::collections::{BTreeSet, HashMap, VecDeque};

use lib_types::{Amount, Txid};
use lib_utxo::{CandidateTx, OutPoint, Transaction, TxOut};

use crate::errors::AdmitErrorKind;

/// A transaction accepted into the pool
#[derive(Debug, Clone)]
pub struct MempoolEntry {
    tx: Transaction,
    txid: Txid,
    fee: Amount,
    vsize: u64,
    /// Outputs that were below the dust threshold on admission
    dust_outputs: Vec<u32>,
    /// Insertion order
    sequence: u64,
    parents: BTreeSet<Txid>,
    children: BTreeSet<Txid>,
}

impl MempoolEntry {
    pub fn new(candidate: CandidateTx, dust_outputs: Vec<u32>) -> Self {
        let txid = candidate.txid();
        let fee = candidate.fee();
        let vsize = candidate.vsize();
        Self {
            tx: candidate.into_tx(),
            txid,
            fee,
            vsize,
            dust_outputs,
            sequence: 0,
            parents: BTreeSet::new(),
            children: BTreeSet::new(),
        }
    }

    pub fn tx(&self) -> &Transaction {
        &self.tx
    }

    pub fn txid(&self) -> Txid {
        self.txid
    }

    pub fn fee(&self) -> Amount {
        self.fee
    }

    pub fn vsize(&self) -> u64 {
        self.vsize
    }

    pub fn dust_outputs(&self) -> &[u32] {
        &self.dust_outputs
    }

    /// In-pool transactions this entry spends from
    pub fn parents(&self) -> &BTreeSet<Txid> {
        &self.parents
    }

    /// In-pool transactions spending this entry
    pub fn children(&self) -> &BTreeSet<Txid> {
        &self.children
    }
}

/// Mempool storage as seen by admission policy
pub trait PoolIndex {
    /// Add an accepted entry
    fn insert(&mut self, entry: MempoolEntry) -> Result<(), AdmitErrorKind>;

    /// Remove an entry and everything in the pool that descends from it
    fn remove(&mut self, txid: &Txid) -> Vec<Txid>;

    /// Fee and virtual size of `txid` plus all of its in-pool ancestors
    fn ancestor_fee_and_size(&self, txid: &Txid) -> Option<(Amount, u64)>;

    fn get(&self, txid: &Txid) -> Option<&MempoolEntry>;
}

/// Current contents of the mempool
#[derive(Debug, Clone, Default)]
pub struct MempoolState {
    entries: HashMap<Txid, MempoolEntry>,
    /// Spent outpoint -> txid of the pool transaction that spends it
    spent_by: HashMap<OutPoint, Txid>,
    /// Current total virtual bytes in mempool
    total_bytes: u64,
    next_sequence: u64,
}

impl MempoolState {
    /// Create empty mempool state
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn contains(&self, txid: &Txid) -> bool {
        self.entries.contains_key(txid)
    }

    /// Pool transaction already spending `outpoint`
    pub fn spender_of(&self, outpoint: &OutPoint) -> Option<Txid> {
        self.spent_by.get(outpoint).copied()
    }

    /// Output created by a pool transaction
    pub fn output(&self, outpoint: &OutPoint) -> Option<&TxOut> {
        self.entries
            .get(&outpoint.txid)
            .and_then(|entry| entry.tx.outputs.get(outpoint.vout as usize))
    }

    /// Txids in insertion order
    pub fn txids(&self) -> Vec<Txid> {
        let mut entries: Vec<&MempoolEntry> = self.entries.values().collect();
        entries.sort_by_key(|entry| entry.sequence);
        entries.into_iter().map(|entry| entry.txid).collect()
    }

    /// In-pool parents of a transaction that is not (yet) in the pool
    pub fn parents_of(&self, tx: &Transaction) -> BTreeSet<Txid> {
        tx.inputs
            .iter()
            .map(|input| input.previous_output.txid)
            .filter(|txid| self.entries.contains_key(txid))
            .collect()
    }

    /// All in-pool ancestors of `txid`, excluding itself
    pub fn ancestors(&self, txid: &Txid) -> BTreeSet<Txid> {
        match self.entries.get(txid) {
            Some(entry) => self.walk(entry.parents.iter().copied(), |e| &e.parents),
            None => BTreeSet::new(),
        }
    }

    /// All in-pool ancestors of a transaction that is not (yet) in the pool
    pub fn ancestors_of(&self, tx: &Transaction) -> BTreeSet<Txid> {
        self.walk(self.parents_of(tx), |e| &e.parents)
    }

    /// All in-pool descendants of `txid`, excluding itself
    pub fn descendants(&self, txid: &Txid) -> BTreeSet<Txid> {
        match self.entries.get(txid) {
            Some(entry) => self.walk(entry.children.iter().copied(), |e| &e.children),
            None => BTreeSet::new(),
        }
    }

    /// Number of in-pool descendants including `txid` itself
    pub fn descendant_count(&self, txid: &Txid) -> usize {
        if !self.contains(txid) {
            return 0;
        }
        self.descendants(txid).len() + 1
    }

    /// Number of in-pool ancestors including `txid` itself
    pub fn ancestor_count(&self, txid: &Txid) -> usize {
        if !self.contains(txid) {
            return 0;
        }
        self.ancestors(txid).len() + 1
    }

    /// Fee and virtual size of `txid` plus all of its in-pool descendants
    pub fn descendant_fee_and_size(&self, txid: &Txid) -> Option<(Amount, u64)> {
        let entry = self.entries.get(txid)?;
        Some(self.aggregate(entry, self.descendants(txid)))
    }

    /// Remove a transaction that was included in a block
    ///
    /// Unlike [`PoolIndex::remove`], children stay in the pool; they lose
    /// this parent link because its outputs are now confirmed.
    pub fn remove_confirmed(&mut self, txid: &Txid) -> Option<MempoolEntry> {
        let entry = self.detach(txid)?;
        tracing::debug!("Removed confirmed transaction {} from mempool", txid);
        Some(entry)
    }

    /// Check if mempool has capacity for more bytes
    pub fn has_byte_capacity(&self, max_bytes: u64, incoming: u64) -> bool {
        self.total_bytes.saturating_add(incoming) <= max_bytes
    }

    /// Check if mempool has capacity for more transactions
    pub fn has_tx_capacity(&self, max_count: usize) -> bool {
        self.entries.len() < max_count
    }

    /// Clear all state (e.g., on reconfiguration)
    pub fn clear(&mut self) {
        self.entries.clear();
        self.spent_by.clear();
        self.total_bytes = 0;
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn walk<I, F>(&self, start: I, next: F) -> BTreeSet<Txid>
    where
        I: IntoIterator<Item = Txid>,
        F: Fn(&MempoolEntry) -> &BTreeSet<Txid>,
    {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<Txid> = start.into_iter().collect();
        while let Some(txid) = queue.pop_front() {
            if !seen.insert(txid) {
                continue;
            }
            if let Some(entry) = self.entries.get(&txid) {
                queue.extend(next(entry).iter().copied());
            }
        }
        seen
    }

    fn aggregate(&self, entry: &MempoolEntry, others: BTreeSet<Txid>) -> (Amount, u64) {
        others
            .iter()
            .filter_map(|txid| self.entries.get(txid))
            .fold((entry.fee, entry.vsize), |(fee, size), other| {
                (fee.saturating_add(other.fee), size.saturating_add(other.vsize))
            })
    }

    /// Remove one entry and unlink it from its neighbours
    fn detach(&mut self, txid: &Txid) -> Option<MempoolEntry> {
        let entry = self.entries.remove(txid)?;

        for input in &entry.tx.inputs {
            if self.spent_by.get(&input.previous_output) == Some(txid) {
                self.spent_by.remove(&input.previous_output);
            }
        }
        for parent in &entry.parents {
            if let Some(parent) = self.entries.get_mut(parent) {
                parent.children.remove(txid);
            }
        }
        for child in &entry.children {
            if let Some(child) = self.entries.get_mut(child) {
                child.parents.remove(txid);
            }
        }

        self.total_bytes = self.total_bytes.saturating_sub(entry.vsize);
        Some(entry)
    }
}

impl PoolIndex for MempoolState {
    fn insert(&mut self, mut entry: MempoolEntry) -> Result<(), AdmitErrorKind> {
        if self.entries.contains_key(&entry.txid) {
            return Err(AdmitErrorKind::DuplicateTransaction);
        }
        for input in &entry.tx.inputs {
            if let Some(spender) = self.spender_of(&input.previous_output) {
                return Err(AdmitErrorKind::MempoolConflict {
                    outpoint: input.previous_output,
                    spender,
                });
            }
        }

        let txid = entry.txid;
        entry.parents = self.parents_of(&entry.tx);
        entry.children.clear();
        entry.sequence = self.next_sequence;
        self.next_sequence += 1;

        for parent in &entry.parents {
            if let Some(parent) = self.entries.get_mut(parent) {
                parent.children.insert(txid);
            }
        }
        for input in &entry.tx.inputs {
            self.spent_by.insert(input.previous_output, txid);
        }

        self.total_bytes = self.total_bytes.saturating_add(entry.vsize);
        self.entries.insert(txid, entry);
        Ok(())
    }

    fn remove(&mut self, txid: &Txid) -> Vec<Txid> {
        if !self.contains(txid) {
            return Vec::new();
        }
        let mut doomed: Vec<Txid> = vec![*txid];
        doomed.extend(self.descendants(txid));

        for victim in &doomed {
            self.detach(victim);
        }
        tracing::debug!("Removed {} and {} descendants from mempool", txid, doomed.len() - 1);
        doomed
    }

    fn ancestor_fee_and_size(&self, txid: &Txid) -> Option<(Amount, u64)> {
        let entry = self.entries.get(txid)?;
        Some(self.aggregate(entry, self.ancestors(txid)))
    }

    fn get(&self, txid: &Txid) -> Option<&MempoolEntry> {
        self.entries.get(txid)
    }
}
