//! The block handler, `BlockHandler`: the thin layer atop [`BlockChain`] that
//! assembles candidate blocks from the mempool and keeps the mempool in sync
//! with what has actually been accepted on-chain.

use crate::block::Block;
use crate::hash::Hash;
use crate::tree::BlockChain;
use crate::tx::Transaction;
use crate::validator::TxHandler;

/// Wraps a [`BlockChain`], adding mempool-aware block assembly and
/// submission. Owns the chain outright — there is no other long-lived
/// owner for it in this crate.
pub struct BlockHandler {
    chain: BlockChain,
}

impl BlockHandler {
    pub fn new(chain: BlockChain) -> Self {
        Self { chain }
    }

    pub fn chain(&self) -> &BlockChain {
        &self.chain
    }

    /// Submits `tx` to the mempool, unvalidated. An alias for
    /// `add_transaction` on the wrapped chain.
    pub fn process_tx(&mut self, tx: Transaction) {
        self.chain.add_transaction(tx);
    }

    /// Delegates to [`BlockChain::add_block`]; on success, removes the
    /// block's non-coinbase transactions from the mempool so they are not
    /// offered again in a future candidate.
    pub fn process_block(&mut self, block: Block) -> bool {
        // BlockChain::add_block already prunes accepted mempool entries
        // on success; this wrapper is the single call site for submission.
        self.chain.add_block(block)
    }

    /// Assembles a candidate block atop the current best tip, paying the
    /// coinbase to `proposer`.
    ///
    /// Selects the best tip, clones its maturity-aware spendable UTXO view,
    /// snapshots the mempool deterministically (id-ascending), and runs the
    /// fixed-point sweep to pick a maximal mutually consistent subset. The
    /// caller is responsible for subsequently submitting the result via
    /// [`BlockHandler::process_block`] — `create_block` itself does not
    /// mutate chain state.
    pub fn create_block(&self, proposer: Hash) -> Block {
        let tip = self.chain.get_max_height_block();
        let height = self.chain.get_max_height() + 1;

        let mut view = self.chain.spendable_tip_view();
        let candidates = self.chain.get_transaction_pool();
        let accepted = TxHandler::new(&mut view).handle_txs(&candidates);

        let coinbase = Transaction::coinbase(proposer, self.chain.config().coinbase_value, height);
        Block::new(Some(tip.id()), coinbase, accepted)
    }
}
