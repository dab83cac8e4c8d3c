//! Digest identity and the two external oracles this crate consumes.
//!
//! Both `digest` and `verify` are pure, synchronous functions: the hash and
//! signature primitives are treated as opaque collaborators and are never
//! expected to fail in a way that should propagate past this module.
//! Signature failures of any kind — malformed key, malformed signature, bad
//! signature — collapse to `false`.

use std::fmt;

use blake2::{Blake2b512, Digest as _};
use ed25519_dalek::{PublicKey, Signature};
use serde::{Deserialize, Serialize};

/// Fixed-width content digest used as the identity of transactions and
/// blocks, and as the raw bytes of a public key.
///
/// 32 bytes, truncated from a Blake2b-512 digest. Equality and ordering are
/// plain byte comparison, so digest equality and hashing always agree with
/// byte equality.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// The all-zero sentinel used as `Block.prev` for genesis and as the
    /// coinbase input's `prev_tx` sentinel.
    pub const fn zero() -> Self {
        Hash([0u8; 32])
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", hex::encode(self.0))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Hashes `bytes` with the crate's hash oracle.
///
/// Collision-resistant and deterministic; a hash-oracle fault would imply a
/// broken platform primitive and is not a condition this crate recovers
/// from.
pub fn digest(bytes: &[u8]) -> Hash {
    let out = Blake2b512::digest(bytes);
    let mut h = [0u8; 32];
    h.copy_from_slice(&out[..32]);
    Hash(h)
}

/// Verifies `signature` over `message` under `pubkey`.
///
/// Never panics and never propagates an error: any malformed input is
/// reported as `false`.
pub fn verify(pubkey: &Hash, message: &[u8], signature: &[u8]) -> bool {
    let pk = match PublicKey::from_bytes(&pubkey.0) {
        Ok(pk) => pk,
        Err(_) => return false,
    };
    let sig = match Signature::from_bytes(signature) {
        Ok(sig) => sig,
        Err(_) => return false,
    };
    pk.verify_strict(message, &sig).is_ok()
}
