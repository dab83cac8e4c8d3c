//! Error types for the **obscura-core** crate.
//!
//! All high-level operations return [`crate::Result`] which is a convenient
//! alias for `core::result::Result<T, Error>`.
//!
//! Public entry points that are boolean by contract (`is_valid`,
//! `add_block`, `process_block`) collapse this down to `bool` at the
//! boundary; the richer `Result`-returning internals stay available to
//! `pub(crate)` callers and tests that need to know *why* something was
//! rejected, which the public surface does not grant.
//!
//! # Examples
//!
//! ```
//! use obscura_core::{Error, Result};
//!
//! fn demo_fn(fail: bool) -> Result<()> {
//!     if fail {
//!         Err(Error::MissingUtxo)
//!     } else {
//!         Ok(())
//!     }
//! }
//! ```

use thiserror::Error;

/// Core crate error type.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Error {
    /// Signature could not be verified against the claimed UTXO's recipient.
    #[error("signature verification failed")]
    BadSignature,

    /// A referenced UTXO is absent from the pool being validated against.
    #[error("referenced UTXO not found")]
    MissingUtxo,

    /// Two inputs of the same transaction reference the same UTXO key.
    #[error("double spend within transaction")]
    DoubleSpend,

    /// Sum of output values exceeds sum of claimed input values.
    #[error("value outputs exceed inputs")]
    ValueOverflow,

    /// Block's `prev` does not name a live node in the tree.
    #[error("unknown or missing parent block")]
    UnknownParent,

    /// Block's parent is deeper below the best tip than `CUT_OFF_AGE` allows.
    #[error("parent block is too old to build on")]
    ParentTooOld,

    /// A non-coinbase transaction in the block failed validation, or the
    /// accepted subset did not cover every transaction the block promised.
    #[error("block contains a transaction that failed validation")]
    BlockTxRejected,

    /// The block id already names a node in the tree.
    #[error("block already accepted")]
    DuplicateBlock,
}

/// Convenient result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
