//! Block model.
//!
//! A block links into its chain by `prev` (absent only for genesis), carries
//! exactly one coinbase transaction and an ordered list of ordinary
//! transactions, and derives its id from all of that content. Height is
//! deliberately *not* a field here: height belongs to the block's position in
//! a tree, not to the block body itself, since the same block has no
//! intrinsic notion of depth until it is placed in a forest.
//!
//! There is no proof-of-work, difficulty, or Merkle tree: blocks are admitted
//! purely on transaction validity and chain position.

use serde::{Deserialize, Serialize};

use crate::hash::{self, Hash};
use crate::tx::{self, Transaction};

/// A sealed, immutable block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    prev: Option<Hash>,
    coinbase: Transaction,
    txs: Vec<Transaction>,
    id: Hash,
}

impl Block {
    /// Assembles and seals a block. There is no unsealed `Block` builder —
    /// unlike `Transaction`, nothing about a block's shape is filled in
    /// incrementally, so the id is computed immediately.
    pub fn new(prev: Option<Hash>, coinbase: Transaction, txs: Vec<Transaction>) -> Self {
        let id = compute_id(&prev, &coinbase, &txs);
        Self {
            prev,
            coinbase,
            txs,
            id,
        }
    }

    pub fn prev(&self) -> Option<Hash> {
        self.prev
    }

    pub fn coinbase(&self) -> &Transaction {
        &self.coinbase
    }

    pub fn txs(&self) -> &[Transaction] {
        &self.txs
    }

    pub fn id(&self) -> Hash {
        self.id
    }

    pub fn is_genesis(&self) -> bool {
        self.prev.is_none()
    }
}

/// `id(B)` hashes `prev_or_empty || coinbase_serialized || for each tx in
/// order: id(tx)`.
fn compute_id(prev: &Option<Hash>, coinbase: &Transaction, txs: &[Transaction]) -> Hash {
    let mut buf = Vec::new();
    if let Some(prev) = prev {
        buf.extend_from_slice(prev.as_bytes());
    }
    buf.extend_from_slice(&tx::canonical_bytes(coinbase));
    for t in txs {
        buf.extend_from_slice(t.id().as_bytes());
    }
    hash::digest(&buf)
}
