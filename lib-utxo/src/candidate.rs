//! Candidate Transactions
//!
//! `CandidateTx::evaluate` is the canonical way to resolve a transaction's
//! inputs and compute the aggregate fee before admission policy runs.

use std::collections::HashSet;

use lib_types::{money_range, Amount, Txid};

use crate::errors::{UtxoError, UtxoResult};
use crate::types::{OutPoint, Transaction, UtxoView};

/// A transaction with its resolved fee and size
///
/// Immutable once built: admission policy only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateTx {
    tx: Transaction,
    txid: Txid,
    fee: Amount,
    total_input: Amount,
    total_output: Amount,
    weight: u64,
    vsize: u64,
}

impl CandidateTx {
    /// Resolve `tx` against `view`
    ///
    /// # Rules
    ///
    /// 1. **Non-empty**: at least one input and one output
    /// 2. **No duplicate inputs**: each outpoint appears once
    /// 3. **Money range**: every output value and the output total stay within `MAX_MONEY`
    /// 4. **Inputs must exist**: every referenced output is present in `view`
    /// 5. **Conservation**: sum(inputs) >= sum(outputs), the difference is the fee
    pub fn evaluate(tx: Transaction, view: &dyn UtxoView) -> UtxoResult<Self> {
        // =====================================================================
        // Rule 1: Non-empty inputs and outputs
        // =====================================================================
        if tx.inputs.is_empty() {
            return Err(UtxoError::EmptyInputs);
        }
        if tx.outputs.is_empty() {
            return Err(UtxoError::EmptyOutputs);
        }

        // =====================================================================
        // Rule 2: No duplicate inputs (double spend within tx)
        // =====================================================================
        let mut seen: HashSet<OutPoint> = HashSet::with_capacity(tx.inputs.len());
        for input in &tx.inputs {
            if !seen.insert(input.previous_output) {
                return Err(UtxoError::DuplicateInput(input.previous_output));
            }
        }

        // =====================================================================
        // Rule 3: Output money range
        // =====================================================================
        let mut total_output: Amount = 0;
        for (index, output) in tx.outputs.iter().enumerate() {
            if !money_range(output.value) {
                return Err(UtxoError::OutputOutOfRange { index, value: output.value });
            }
            total_output = total_output
                .checked_add(output.value)
                .ok_or(UtxoError::Overflow)?;
        }
        if !money_range(total_output) {
            return Err(UtxoError::Overflow);
        }

        // =====================================================================
        // Rule 4: Inputs must exist
        // =====================================================================
        let mut total_input: Amount = 0;
        for input in &tx.inputs {
            let spent = view
                .get_output(&input.previous_output)?
                .ok_or(UtxoError::NotFound(input.previous_output))?;
            total_input = total_input
                .checked_add(spent.value)
                .ok_or(UtxoError::Overflow)?;
        }

        // =====================================================================
        // Rule 5: Conservation
        // =====================================================================
        if total_input < total_output {
            return Err(UtxoError::InsufficientInput {
                have: total_input,
                need: total_output,
            });
        }

        let fee = total_input - total_output;
        Ok(Self::build(tx, fee, total_input, total_output))
    }

    /// Wrap a transaction whose fee was already computed upstream
    pub fn from_parts(tx: Transaction, fee: Amount) -> Self {
        let total_output = tx.total_output_value().unwrap_or(Amount::MAX);
        let total_input = total_output.saturating_add(fee);
        Self::build(tx, fee, total_input, total_output)
    }

    fn build(tx: Transaction, fee: Amount, total_input: Amount, total_output: Amount) -> Self {
        let txid = tx.txid();
        let weight = tx.weight();
        let vsize = tx.vsize();
        Self {
            tx,
            txid,
            fee,
            total_input,
            total_output,
            weight,
            vsize,
        }
    }

    pub fn tx(&self) -> &Transaction {
        &self.tx
    }

    pub fn into_tx(self) -> Transaction {
        self.tx
    }

    pub fn txid(&self) -> Txid {
        self.txid
    }

    /// Aggregate fee: sum of inputs minus sum of outputs
    pub fn fee(&self) -> Amount {
        self.fee
    }

    pub fn pays_zero_fee(&self) -> bool {
        self.fee == 0
    }

    pub fn total_input(&self) -> Amount {
        self.total_input
    }

    pub fn total_output(&self) -> Amount {
        self.total_output
    }

    pub fn weight(&self) -> u64 {
        self.weight
    }

    pub fn vsize(&self) -> u64 {
        self.vsize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::MAX_MONEY;
    use crate::coins::CoinSet;
    use crate::script::Script;
    use crate::types::{TxIn, TxOut};

    fn funded_view(values: &[Amount]) -> (CoinSet, Vec<OutPoint>) {
        let mut coins = CoinSet::new();
        let outpoints: Vec<OutPoint> = values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let outpoint = OutPoint::new(Txid::new([9u8; 32]), i as u32);
                coins.add(outpoint, TxOut::new(*value, Script::op_true()));
                outpoint
            })
            .collect();
        (coins, outpoints)
    }

    fn spend(outpoints: &[OutPoint], values: &[Amount]) -> Transaction {
        Transaction::new(
            outpoints.iter().map(|o| TxIn::new(*o)).collect(),
            values
                .iter()
                .map(|v| TxOut::new(*v, Script::p2wpkh(&[1u8; 20])))
                .collect(),
        )
    }

    #[test]
    fn test_fee_is_inputs_minus_outputs() {
        let (coins, outpoints) = funded_view(&[500, 500]);
        let tx = spend(&outpoints, &[400, 400]);

        let candidate = CandidateTx::evaluate(tx.clone(), &coins).unwrap();
        assert_eq!(candidate.total_input(), 1_000);
        assert_eq!(candidate.total_output(), 800);
        assert_eq!(candidate.fee(), 200);
        assert_eq!(candidate.txid(), tx.txid());
        assert_eq!(candidate.vsize(), tx.vsize());
        assert!(!candidate.pays_zero_fee());
    }

    #[test]
    fn test_zero_fee() {
        let (coins, outpoints) = funded_view(&[2]);
        let candidate = CandidateTx::evaluate(spend(&outpoints, &[1, 1]), &coins).unwrap();
        assert!(candidate.pays_zero_fee());
    }

    #[test]
    fn test_missing_input() {
        let coins = CoinSet::new();
        let outpoint = OutPoint::new(Txid::default(), 0);
        let result = CandidateTx::evaluate(spend(&[outpoint], &[1]), &coins);
        assert_eq!(result, Err(UtxoError::NotFound(outpoint)));
    }

    #[test]
    fn test_duplicate_input() {
        let (coins, outpoints) = funded_view(&[1_000]);
        let tx = spend(&[outpoints[0], outpoints[0]], &[1_500]);
        let result = CandidateTx::evaluate(tx, &coins);
        assert!(matches!(result, Err(UtxoError::DuplicateInput(_))));
    }

    #[test]
    fn test_outputs_exceed_inputs() {
        let (coins, outpoints) = funded_view(&[100]);
        let result = CandidateTx::evaluate(spend(&outpoints, &[200]), &coins);
        assert_eq!(result, Err(UtxoError::InsufficientInput { have: 100, need: 200 }));
    }

    #[test]
    fn test_output_out_of_range() {
        let (coins, outpoints) = funded_view(&[100]);
        let result = CandidateTx::evaluate(spend(&outpoints, &[MAX_MONEY + 1]), &coins);
        assert!(matches!(result, Err(UtxoError::OutputOutOfRange { index: 0, .. })));
    }

    #[test]
    fn test_empty_sides() {
        let (coins, outpoints) = funded_view(&[100]);
        assert_eq!(
            CandidateTx::evaluate(spend(&[], &[1]), &coins),
            Err(UtxoError::EmptyInputs)
        );
        assert_eq!(
            CandidateTx::evaluate(spend(&outpoints, &[]), &coins),
            Err(UtxoError::EmptyOutputs)
        );
    }

    #[test]
    fn test_from_parts() {
        let tx = spend(&[OutPoint::new(Txid::default(), 0)], &[700]);
        let candidate = CandidateTx::from_parts(tx, 300);
        assert_eq!(candidate.fee(), 300);
        assert_eq!(candidate.total_input(), 1_000);
    }
}
