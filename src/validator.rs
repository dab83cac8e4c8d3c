//! The transaction validator, `TxHandler`.
//!
//! `TxHandler` is stateless per call: it borrows a [`UtxoPool`] for the
//! duration of one validation or one batch application and never retains
//! anything across calls. All failure paths return `false`/an empty
//! accepted sequence; no partial state change is ever observable on
//! rejection.

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::hash;
use crate::tx::Transaction;
use crate::utxo::{UtxoKey, UtxoPool};

/// Validates and applies transactions against a borrowed [`UtxoPool`].
pub struct TxHandler<'a> {
    pool: &'a mut UtxoPool,
}

impl<'a> TxHandler<'a> {
    pub fn new(pool: &'a mut UtxoPool) -> Self {
        Self { pool }
    }

    /// The validity check, as a `Result` carrying the specific failure
    /// reason. `pub(crate)` only: the public surface is
    /// [`TxHandler::is_valid`], which collapses this to a boolean.
    ///
    /// Output non-negativity is not a separate clause here: values are
    /// `u64`, so the invariant is enforced by the type system rather than
    /// by a runtime check.
    pub(crate) fn validate(&self, tx: &Transaction) -> Result<()> {
        let mut claimed: BTreeSet<UtxoKey> = BTreeSet::new();
        let mut input_total: u64 = 0;

        for (i, input) in tx.inputs().iter().enumerate() {
            let key = UtxoKey::new(input.prev_tx, input.out_index);

            // Clause 3: no two inputs may claim the same UTXO key.
            if !claimed.insert(key) {
                return Err(Error::DoubleSpend);
            }

            // Clause 1: every claimed UTXO must exist in the pool.
            let output = self.pool.get(&key).ok_or(Error::MissingUtxo)?;

            // Clause 2: the signature must verify against the UTXO's
            // recorded recipient, over the position-bound signing message.
            let message = signing_message(tx, i);
            if !hash::verify(&output.recipient, &message, &input.signature) {
                return Err(Error::BadSignature);
            }

            input_total = input_total
                .checked_add(output.value)
                .ok_or(Error::ValueOverflow)?;
        }

        let mut output_total: u64 = 0;
        for output in tx.outputs() {
            output_total = output_total
                .checked_add(output.value)
                .ok_or(Error::ValueOverflow)?;
        }

        // Clause 4: outputs may not exceed inputs; the difference is an
        // implicit fee that is simply discarded, never redirected.
        if output_total > input_total {
            return Err(Error::ValueOverflow);
        }

        Ok(())
    }

    /// `true` iff `tx` is valid against the pool this handler borrows.
    /// Pure with respect to the pool: never mutates it.
    pub fn is_valid(&self, tx: &Transaction) -> bool {
        self.validate(tx).is_ok()
    }

    /// Applies `tx`'s effects to the pool: removes every claimed UTXO and
    /// inserts a fresh one for every output. Caller must have already
    /// confirmed validity; this never re-validates.
    ///
    /// `pub(crate)` so [`crate::tree::BlockChain`] can replay an
    /// already-decided accepted set against a second, unfiltered pool when
    /// coinbase maturity filtering is in effect.
    pub(crate) fn apply(&mut self, tx: &Transaction) {
        for input in tx.inputs() {
            self.pool.remove(&UtxoKey::new(input.prev_tx, input.out_index));
        }
        for (j, output) in tx.outputs().iter().enumerate() {
            self.pool
                .insert(UtxoKey::new(tx.id(), j as u32), output.clone());
        }
    }

    /// Fixed-point sweep over `candidates`, returning a maximal mutually
    /// consistent accepted subsequence and mutating the pool to reflect it.
    ///
    /// Each round, remaining candidates are tried in ascending `tx.id()`
    /// order; a transaction that validates is accepted and applied
    /// immediately, so a later candidate in the same round can already see
    /// its outputs. Rounds repeat until one makes no progress, which is
    /// exactly what lets `tx_b` (spending `tx_a`'s output) be accepted
    /// without an explicit topological sort.
    pub fn handle_txs(&mut self, candidates: &[Transaction]) -> Vec<Transaction> {
        let mut remaining: Vec<Transaction> = candidates.to_vec();
        remaining.sort_by_key(|tx| tx.id());

        let mut accepted = Vec::new();
        loop {
            let mut progressed = false;
            let mut next_remaining = Vec::with_capacity(remaining.len());

            for tx in remaining {
                if self.is_valid(&tx) {
                    self.apply(&tx);
                    accepted.push(tx);
                    progressed = true;
                } else {
                    next_remaining.push(tx);
                }
            }

            remaining = next_remaining;
            if !progressed {
                break;
            }
        }

        accepted
    }
}

/// `raw_data_to_sign(tx, i)`: the unsigned encoding of `tx` plus
/// `u32_be(i)`. Reuses the exact same encoding `TxBuilder::raw_data_to_sign`
/// produces so a signature minted during construction verifies here too.
fn signing_message(tx: &Transaction, input_index: usize) -> Vec<u8> {
    crate::tx::unsigned_encoding_for_validation(tx, input_index)
}
