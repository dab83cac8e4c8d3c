//! The bounded, unvalidated transaction mempool.
//!
//! Transactions are accepted into the mempool without validation — the
//! validator only filters at block-assembly time — and are keyed by id so a
//! deterministic, id-ascending snapshot falls out of iteration for free,
//! matching `handle_txs`'s determinism contract. A `VecDeque` alongside the
//! map tracks insertion order purely to support capacity-bounded FIFO
//! eviction.

use std::collections::{BTreeMap, VecDeque};

use crate::hash::Hash;
use crate::tx::Transaction;

/// A bounded staging area for transactions awaiting inclusion in a block.
#[derive(Debug, Clone)]
pub struct Mempool {
    by_id: BTreeMap<Hash, Transaction>,
    insertion_order: VecDeque<Hash>,
    capacity: usize,
}

impl Mempool {
    pub fn new(capacity: usize) -> Self {
        Self {
            by_id: BTreeMap::new(),
            insertion_order: VecDeque::new(),
            capacity,
        }
    }

    /// Inserts `tx` without validating it. If the mempool is already at
    /// capacity, the oldest resident transaction is evicted first. Inserting
    /// a transaction already present is a no-op (by id).
    pub fn insert(&mut self, tx: Transaction) {
        let id = tx.id();
        if self.by_id.contains_key(&id) {
            return;
        }
        while self.by_id.len() >= self.capacity && !self.insertion_order.is_empty() {
            if let Some(oldest) = self.insertion_order.pop_front() {
                self.by_id.remove(&oldest);
            }
        }
        if self.capacity == 0 {
            return;
        }
        self.insertion_order.push_back(id);
        self.by_id.insert(id, tx);
    }

    /// Removes a transaction by id, e.g. once its block is accepted.
    pub fn remove(&mut self, id: &Hash) {
        if self.by_id.remove(id).is_some() {
            self.insertion_order.retain(|i| i != id);
        }
    }

    /// A deterministic, id-ascending snapshot of every resident transaction.
    pub fn snapshot(&self) -> Vec<Transaction> {
        self.by_id.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
