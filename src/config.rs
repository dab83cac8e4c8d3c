//! Consensus tunables for **obscura-core**.
//!
//! [`BlockChainConfig`] centralises the constants governing fork depth,
//! reward size, and coinbase spendability: `cut_off_age`, `coinbase_value`,
//! the optional `coinbase_maturity`, and the mempool capacity bound. It is
//! constructed via [`BlockChainConfigBuilder`] using the fluent builder
//! pattern, so callers customise only the fields they care about while
//! keeping sensible defaults.
//!
//! ```
//! use obscura_core::config::BlockChainConfig;
//!
//! let cfg = BlockChainConfig::default();
//! assert_eq!(cfg.coinbase_value, 25);
//! assert_eq!(cfg.coinbase_maturity, 0);
//! ```

use serde::{Deserialize, Serialize};

/// Runtime configuration shared across a [`crate::tree::BlockChain`] and its
/// [`crate::handler::BlockHandler`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockChainConfig {
    /// Maximum depth below the best tip a new block's parent may sit at, and
    /// the retention horizon for pruning.
    pub cut_off_age: u64,

    /// Fixed coinbase reward paid to a block's proposer.
    pub coinbase_value: u64,

    /// Number of blocks a coinbase output must age before it is spendable.
    /// `0` disables maturity enforcement entirely (see `DESIGN.md`'s
    /// resolution of the corresponding open design question).
    pub coinbase_maturity: u64,

    /// Maximum number of transactions retained in the mempool at once.
    pub mempool_capacity: usize,
}

impl Default for BlockChainConfig {
    fn default() -> Self {
        Self {
            cut_off_age: 10,
            coinbase_value: 25,
            coinbase_maturity: 0,
            mempool_capacity: 10_000,
        }
    }
}

/// Fluent builder for [`BlockChainConfig`].
#[derive(Debug, Default)]
pub struct BlockChainConfigBuilder {
    inner: BlockChainConfig,
}

impl BlockChainConfigBuilder {
    /// Starts a new builder pre-populated with [`BlockChainConfig::default`].
    pub fn new() -> Self {
        Self {
            inner: BlockChainConfig::default(),
        }
    }

    pub fn cut_off_age(mut self, age: u64) -> Self {
        self.inner.cut_off_age = age;
        self
    }

    pub fn coinbase_value(mut self, value: u64) -> Self {
        self.inner.coinbase_value = value;
        self
    }

    pub fn coinbase_maturity(mut self, depth: u64) -> Self {
        self.inner.coinbase_maturity = depth;
        self
    }

    pub fn mempool_capacity(mut self, capacity: usize) -> Self {
        self.inner.mempool_capacity = capacity;
        self
    }

    /// Consumes the builder returning an immutable configuration value.
    pub fn finish(self) -> BlockChainConfig {
        self.inner
    }
}
