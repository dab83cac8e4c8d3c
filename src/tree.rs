//! The block tree, `BlockChain`: a forest of accepted blocks rooted at
//! genesis, with per-node cached UTXO snapshots, best-tip selection, and
//! fixed-depth pruning.
//!
//! Represented as an arena (`Vec<Node>`) plus a `digest -> index` map: parent
//! links are arena indices, never owning references, so the structure cannot
//! cycle and pruning is a plain map-and-arena sweep.

use std::collections::HashMap;

use crate::block::Block;
use crate::config::BlockChainConfig;
use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::mempool::Mempool;
use crate::tx::Transaction;
use crate::utxo::{UtxoKey, UtxoPool};
use crate::validator::TxHandler;

/// One accepted block together with the state derived from applying it.
#[derive(Debug, Clone)]
struct Node {
    block: Block,
    parent: Option<usize>,
    height: u64,
    /// `None` once pruned; a pruned node is also absent from `nodes_by_id`,
    /// so the two conditions always agree.
    utxo_after: Option<UtxoPool>,
    age: u64,
}

/// The live forest of accepted blocks and the chain-level state derived
/// from it: best tip selection, pruning, and the shared mempool.
pub struct BlockChain {
    config: BlockChainConfig,
    arena: Vec<Node>,
    nodes_by_id: HashMap<Hash, usize>,
    best_tip: usize,
    insertion_counter: u64,
    mempool: Mempool,
}

impl BlockChain {
    /// Constructs a tree rooted at `genesis`.
    ///
    /// `genesis` must have no `prev`. Its node is installed directly at
    /// height 1, age 0, with a UTXO set containing only its coinbase
    /// output(s) — it is never run through [`TxHandler`] since it has no
    /// parent state to validate against.
    ///
    /// # Panics
    /// Panics if `genesis.prev()` is `Some` — adding a block before genesis
    /// is a programmer-misuse condition, not data the core routes around.
    pub fn new(genesis: Block, config: BlockChainConfig) -> Self {
        assert!(
            genesis.is_genesis(),
            "BlockChain::new requires a block with no parent"
        );

        let mut utxo_after = UtxoPool::new();
        for (j, out) in genesis.coinbase().outputs().iter().enumerate() {
            utxo_after.insert(UtxoKey::new(genesis.coinbase().id(), j as u32), out.clone());
        }

        let node = Node {
            block: genesis,
            parent: None,
            height: 1,
            utxo_after: Some(utxo_after),
            age: 0,
        };

        let mut nodes_by_id = HashMap::new();
        nodes_by_id.insert(node.block.id(), 0usize);

        Self {
            mempool: Mempool::new(config.mempool_capacity),
            config,
            arena: vec![node],
            nodes_by_id,
            best_tip: 0,
            insertion_counter: 1,
        }
    }

    /// The block acceptance algorithm: validate parentage and depth, replay
    /// the block's transactions against the parent's UTXO snapshot, and on
    /// success install a new node and update the best tip. Returns `true`
    /// iff the block was installed as a new node; on any rejection, no
    /// state changes at all (not the tree, not the mempool).
    pub fn add_block(&mut self, block: Block) -> bool {
        self.try_add_block(block).is_ok()
    }

    pub(crate) fn try_add_block(&mut self, block: Block) -> Result<()> {
        if self.nodes_by_id.contains_key(&block.id()) {
            return Err(Error::DuplicateBlock);
        }

        let prev_id = block.prev().ok_or(Error::UnknownParent)?;
        let parent_idx = *self
            .nodes_by_id
            .get(&prev_id)
            .ok_or(Error::UnknownParent)?;

        let parent_height = self.arena[parent_idx].height;
        let best_height = self.arena[self.best_tip].height;
        if parent_height + 1 <= best_height.saturating_sub(self.config.cut_off_age) {
            return Err(Error::ParentTooOld);
        }

        let mut real_pool = self.arena[parent_idx]
            .utxo_after
            .clone()
            .ok_or(Error::UnknownParent)?;
        let mut matured_view = self.maturity_filtered_view(parent_idx);

        let accepted = TxHandler::new(&mut matured_view).handle_txs(block.txs());
        if accepted.len() != block.txs().len() {
            return Err(Error::BlockTxRejected);
        }

        {
            let mut applier = TxHandler::new(&mut real_pool);
            for tx in &accepted {
                applier.apply(tx);
            }
        }
        for (j, out) in block.coinbase().outputs().iter().enumerate() {
            real_pool.insert(UtxoKey::new(block.coinbase().id(), j as u32), out.clone());
        }

        let height = parent_height + 1;
        let age = self.insertion_counter;
        self.insertion_counter += 1;
        let block_id = block.id();

        let node = Node {
            block,
            parent: Some(parent_idx),
            height,
            utxo_after: Some(real_pool),
            age,
        };
        let idx = self.arena.len();
        self.arena.push(node);
        self.nodes_by_id.insert(block_id, idx);

        // Tie-break: strictly greater height only; an equal-height
        // candidate keeps the existing (older, smaller-age) tip.
        if height > self.arena[self.best_tip].height {
            self.best_tip = idx;
        }

        for tx in &accepted {
            self.mempool.remove(&tx.id());
        }

        self.prune();
        Ok(())
    }

    /// Builds the UTXO view `add_block`/`create_block` validate non-coinbase
    /// transactions against: `parent.utxo_after` with every still-immature
    /// ancestor coinbase output removed.
    ///
    /// A no-op clone when `coinbase_maturity` is `0` (the default — maturity
    /// enforcement disabled).
    fn maturity_filtered_view(&self, parent_idx: usize) -> UtxoPool {
        let parent = &self.arena[parent_idx];
        let mut pool = parent
            .utxo_after
            .clone()
            .expect("parent node must retain state: looked up via nodes_by_id");

        if self.config.coinbase_maturity == 0 {
            return pool;
        }

        let mut cursor = Some(parent_idx);
        while let Some(idx) = cursor {
            let node = &self.arena[idx];
            // Ancestors strictly older than this threshold have matured;
            // height only decreases walking up, so the first mature
            // ancestor means every earlier one is mature too.
            if node.height + self.config.coinbase_maturity <= parent.height + 1 {
                break;
            }
            let coinbase = node.block.coinbase();
            for j in 0..coinbase.outputs().len() {
                pool.remove(&UtxoKey::new(coinbase.id(), j as u32));
            }
            cursor = node.parent;
        }
        pool
    }

    /// Drops cached state for, and forgets the id of, any node whose height
    /// is below `best_tip.height - CUT_OFF_AGE`. Arena slots are retained
    /// (never compacted) so existing parent indices stay valid; a pruned
    /// node can never again be looked up as a parent since it leaves
    /// `nodes_by_id`, which is the only thing `add_block` consults.
    fn prune(&mut self) {
        let threshold = self.arena[self.best_tip]
            .height
            .saturating_sub(self.config.cut_off_age);
        let doomed: Vec<Hash> = self
            .nodes_by_id
            .iter()
            .filter(|(_, &idx)| self.arena[idx].height < threshold)
            .map(|(id, _)| *id)
            .collect();
        for id in doomed {
            if let Some(idx) = self.nodes_by_id.remove(&id) {
                self.arena[idx].utxo_after = None;
            }
        }
    }

    /// The current best tip's block: maximum height, oldest age on tie.
    pub fn get_max_height_block(&self) -> Block {
        self.arena[self.best_tip].block.clone()
    }

    /// The current best tip's derived UTXO set.
    pub fn get_max_height_utxo_pool(&self) -> UtxoPool {
        self.arena[self.best_tip]
            .utxo_after
            .clone()
            .expect("best tip always retains state")
    }

    /// The best tip's height.
    pub fn get_max_height(&self) -> u64 {
        self.arena[self.best_tip].height
    }

    /// A deterministic, id-ascending snapshot of the mempool.
    pub fn get_transaction_pool(&self) -> Vec<Transaction> {
        self.mempool.snapshot()
    }

    /// Adds `tx` to the mempool without validating it.
    pub fn add_transaction(&mut self, tx: Transaction) {
        self.mempool.insert(tx);
    }

    pub fn config(&self) -> &BlockChainConfig {
        &self.config
    }

    /// The spendable UTXO view for assembling a candidate block atop the
    /// current best tip — i.e. maturity-filtered, matching what `add_block`
    /// will itself enforce.
    pub(crate) fn spendable_tip_view(&self) -> UtxoPool {
        self.maturity_filtered_view(self.best_tip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlockChainConfigBuilder;
    use crate::tx::TxBuilder;
    use ed25519_dalek::{Keypair, PublicKey, SecretKey, Signer};

    fn keypair(seed: u8) -> Keypair {
        let secret = SecretKey::from_bytes(&[seed; 32]).unwrap();
        let public = PublicKey::from(&secret);
        Keypair { secret, public }
    }

    fn pubkey_hash(kp: &Keypair) -> Hash {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(kp.public.as_bytes());
        Hash(bytes)
    }

    fn genesis(proposer: Hash, value: u64) -> Block {
        Block::new(None, Transaction::coinbase(proposer, value, 1), vec![])
    }

    fn child(prev: Hash, proposer: Hash, value: u64, height: u64) -> Block {
        Block::new(Some(prev), Transaction::coinbase(proposer, value, height), vec![])
    }

    #[test]
    fn genesis_node_has_height_one_and_only_its_coinbase() {
        let proposer = Hash::zero();
        let chain = BlockChain::new(genesis(proposer, 25), BlockChainConfig::default());
        assert_eq!(chain.get_max_height(), 1);
        let pool = chain.get_max_height_utxo_pool();
        assert_eq!(pool.total_value(), 25);
    }

    #[test]
    fn resubmitting_an_accepted_block_is_rejected() {
        let proposer = Hash::zero();
        let g = genesis(proposer, 25);
        let gid = g.id();
        let mut chain = BlockChain::new(g, BlockChainConfig::default());
        let b1 = child(gid, proposer, 25, 2);
        assert!(chain.add_block(b1.clone()));
        assert!(!chain.add_block(b1));
    }

    #[test]
    fn fork_tie_break_prefers_older_block_then_switches_on_new_tallest() {
        let proposer = Hash::zero();
        let g = genesis(proposer, 25);
        let gid = g.id();
        let mut chain = BlockChain::new(g, BlockChainConfig::default());

        let b1 = child(gid, proposer, 25, 2);
        let b2 = child(gid, proposer, 26, 2); // distinct coinbase value -> distinct id
        let b1_id = b1.id();
        assert!(chain.add_block(b1.clone()));
        assert!(chain.add_block(b2.clone()));

        // Both at height 2; the older (first-seen) b1 remains the tip.
        assert_eq!(chain.get_max_height_block().id(), b1_id);

        let b3 = child(b2.id(), proposer, 27, 3);
        let b3_id = b3.id();
        assert!(chain.add_block(b3));
        assert_eq!(chain.get_max_height_block().id(), b3_id);
    }

    #[test]
    fn too_deep_parent_is_rejected() {
        let proposer = Hash::zero();
        let g = genesis(proposer, 25);
        let genesis_id = g.id();
        let mut cursor = genesis_id;
        let cfg = BlockChainConfigBuilder::new().cut_off_age(10).finish();
        let mut chain = BlockChain::new(g, cfg);

        for h in 2..=12u64 {
            let b = child(cursor, proposer, 25, h);
            cursor = b.id();
            assert!(chain.add_block(b));
        }

        // A sibling of genesis's direct child, submitted after the tip sits
        // at height 12 with cut_off_age 10: parent.height(1) + 1 <= 12-10.
        let sibling = child(genesis_id, proposer, 99, 2);
        assert!(!chain.add_block(sibling));
    }

    #[test]
    fn pruning_drops_nodes_below_the_retention_horizon() {
        let proposer = Hash::zero();
        let g = genesis(proposer, 25);
        let gid = g.id();
        let cfg = BlockChainConfigBuilder::new().cut_off_age(2).finish();
        let mut chain = BlockChain::new(g, cfg);

        let mut cursor = gid;
        for h in 2..=5u64 {
            let b = child(cursor, proposer, 25, h);
            cursor = b.id();
            assert!(chain.add_block(b));
        }
        // best height 5, cut_off_age 2 -> threshold 3; genesis (height 1) and
        // height-2 nodes must be gone from the live id map.
        assert!(!chain.nodes_by_id.contains_key(&gid));
    }

    #[test]
    fn block_spending_parent_coinbase_is_accepted() {
        let scrooge = keypair(1);
        let alice = keypair(2);
        let scrooge_pkh = pubkey_hash(&scrooge);

        let g = Block::new(None, Transaction::coinbase(scrooge_pkh, 25, 1), vec![]);
        let gid = g.id();
        let coinbase_id = g.coinbase().id();
        let mut chain = BlockChain::new(g, BlockChainConfig::default());

        let mut builder = TxBuilder::new();
        builder.add_input(coinbase_id, 0);
        builder.add_output(25, pubkey_hash(&alice));
        let msg = builder.raw_data_to_sign(0);
        builder.add_signature(0, scrooge.sign(&msg).to_bytes().to_vec());
        let spend = builder.seal();

        let next = Block::new(
            Some(gid),
            Transaction::coinbase(scrooge_pkh, 25, 2),
            vec![spend],
        );
        assert!(chain.add_block(next));
        let pool = chain.get_max_height_utxo_pool();
        assert_eq!(pool.balance_of(&pubkey_hash(&alice)), 25);
    }

    #[test]
    fn block_with_one_invalid_tx_is_rejected_wholesale() {
        let scrooge = keypair(1);
        let alice = keypair(2);
        let g = Block::new(
            None,
            Transaction::coinbase(pubkey_hash(&scrooge), 25, 1),
            vec![],
        );
        let gid = g.id();
        let mut chain = BlockChain::new(g, BlockChainConfig::default());

        // Spend with no signature at all -> invalid.
        let mut builder = TxBuilder::new();
        builder.add_input(Hash::zero(), 99); // references nothing real
        builder.add_output(5, pubkey_hash(&alice));
        let bogus = builder.seal();

        let next = Block::new(
            Some(gid),
            Transaction::coinbase(pubkey_hash(&scrooge), 25, 2),
            vec![bogus],
        );
        assert!(!chain.add_block(next));
        assert_eq!(chain.get_max_height(), 1);
    }

    #[test]
    fn coinbase_maturity_blocks_spending_until_matured() {
        let scrooge = keypair(1);
        let alice = keypair(2);
        let scrooge_pkh = pubkey_hash(&scrooge);

        let g = Block::new(None, Transaction::coinbase(scrooge_pkh, 25, 1), vec![]);
        let gid = g.id();
        let coinbase_id = g.coinbase().id();
        let cfg = BlockChainConfigBuilder::new().coinbase_maturity(2).finish();
        let mut chain = BlockChain::new(g, cfg);

        let spend_genesis_coinbase = |nonce: u64| {
            let mut builder = TxBuilder::new();
            builder.add_input(coinbase_id, 0);
            builder.add_output(25, pubkey_hash(&alice));
            let msg = builder.raw_data_to_sign(0);
            builder.add_signature(0, scrooge.sign(&msg).to_bytes().to_vec());
            let _ = nonce;
            builder.seal()
        };

        let immature_spend = spend_genesis_coinbase(0);
        let b2 = Block::new(
            Some(gid),
            Transaction::coinbase(scrooge_pkh, 25, 2),
            vec![immature_spend],
        );
        assert!(!chain.add_block(b2));

        // A plain block with no spends still extends the tip fine.
        let b2_empty = Block::new(Some(gid), Transaction::coinbase(scrooge_pkh, 25, 2), vec![]);
        let b2_id = b2_empty.id();
        assert!(chain.add_block(b2_empty));

        // Still immature at height 3 relative to maturity 2 against the
        // genesis coinbase (matures once parent.height - maturity + 1 >= 1,
        // i.e. once parent height >= 2).
        let mature_spend = spend_genesis_coinbase(1);
        let b3 = Block::new(
            Some(b2_id),
            Transaction::coinbase(scrooge_pkh, 25, 3),
            vec![mature_spend],
        );
        assert!(chain.add_block(b3));
    }
}
