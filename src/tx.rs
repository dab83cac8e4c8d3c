//! Transaction model: inputs, outputs, canonical encoding, and the builder
//! that produces a sealed (immutable, identified) [`Transaction`].
//!
//! Glossary
//! --------
//! * **Input** – a claim on a previously created, still-unspent output.
//! * **Output** – a newly created spendable value paid to a recipient.
//! * **Seal** – computing a transaction's id and freezing it against further
//!   mutation (named `seal` rather than `finalize`, which collides with a
//!   reserved method name elsewhere in the standard library's async traits).

use serde::{Deserialize, Serialize};

use crate::hash::{self, Hash};

/// A reference to a previously created output being spent.
///
/// Authority to spend is established by `signature` verifying against the
/// *recipient recorded on the UTXO itself* — `Input` does not carry a public
/// key of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub prev_tx: Hash,
    pub out_index: u32,
    pub signature: Vec<u8>,
}

/// A newly created spendable output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: u64,
    pub recipient: Hash,
}

/// A sealed, immutable transaction.
///
/// Constructed only via [`TxBuilder::seal`] or [`Transaction::coinbase`].
/// There is deliberately no public constructor that takes `id` directly:
/// the id is always derived, never supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    inputs: Vec<TxInput>,
    outputs: Vec<TxOutput>,
    id: Hash,
}

impl Transaction {
    pub fn inputs(&self) -> &[TxInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TxOutput] {
        &self.outputs
    }

    pub fn id(&self) -> Hash {
        self.id
    }

    /// Builds the single-output coinbase transaction for a block at
    /// `height`, paying `value` to `proposer`.
    ///
    /// The sentinel input's `prev_tx` is the zero hash and its `out_index`
    /// is `u32::MAX`; `height` is folded into the sentinel's signature bytes
    /// so that two coinbases paying the same proposer the same value at
    /// different heights still have distinct ids.
    pub fn coinbase(proposer: Hash, value: u64, height: u64) -> Self {
        let sentinel = TxInput {
            prev_tx: Hash::zero(),
            out_index: u32::MAX,
            signature: height.to_be_bytes().to_vec(),
        };
        let inputs = vec![sentinel];
        let outputs = vec![TxOutput {
            value,
            recipient: proposer,
        }];
        let id = compute_id(&inputs, &outputs);
        Transaction {
            inputs,
            outputs,
            id,
        }
    }
}

/// Canonical byte encoding shared by `id(T)` and `raw_data_to_sign`.
///
/// For each input in order: `prev_tx || u32_be(index) || signature`; then
/// for each output in order: `value_be || recipient_bytes`. Variable-length
/// `signature` fields are length-prefixed (`u32_be`) to keep the encoding
/// unambiguous between adjacent fields — see `DESIGN.md` for the byte-framing
/// rationale.
fn encode_body(inputs: &[TxInput], outputs: &[TxOutput]) -> Vec<u8> {
    let mut buf = Vec::new();
    for input in inputs {
        buf.extend_from_slice(input.prev_tx.as_bytes());
        buf.extend_from_slice(&input.out_index.to_be_bytes());
        buf.extend_from_slice(&(input.signature.len() as u32).to_be_bytes());
        buf.extend_from_slice(&input.signature);
    }
    for output in outputs {
        buf.extend_from_slice(&output.value.to_be_bytes());
        buf.extend_from_slice(output.recipient.as_bytes());
    }
    buf
}

fn compute_id(inputs: &[TxInput], outputs: &[TxOutput]) -> Hash {
    hash::digest(&encode_body(inputs, outputs))
}

/// The canonical body bytes of a sealed transaction, exposed to [`crate::block`]
/// so a block's id can fold in its coinbase's full serialized body rather
/// than just its id.
pub(crate) fn canonical_bytes(tx: &Transaction) -> Vec<u8> {
    encode_body(&tx.inputs, &tx.outputs)
}

/// The signing message for input `input_index` of an already-sealed
/// transaction, exposed to [`crate::validator`] so a signature minted
/// against [`TxBuilder::raw_data_to_sign`] verifies against the same bytes
/// once the transaction has been sealed.
pub(crate) fn unsigned_encoding_for_validation(tx: &Transaction, input_index: usize) -> Vec<u8> {
    let mut buf = encode_body_unsigned(&tx.inputs, &tx.outputs);
    buf.extend_from_slice(&(input_index as u32).to_be_bytes());
    buf
}

/// Same encoding as [`compute_id`] but with every input's signature bytes
/// zeroed (length-preserved as empty), so that signing one input does not
/// depend on the signatures of any other input nor on itself. Every
/// signature is cleared, not just the target input's — see `DESIGN.md` for
/// why that choice was made over the narrower alternative.
fn encode_body_unsigned(inputs: &[TxInput], outputs: &[TxOutput]) -> Vec<u8> {
    let stripped: Vec<TxInput> = inputs
        .iter()
        .map(|i| TxInput {
            prev_tx: i.prev_tx,
            out_index: i.out_index,
            signature: Vec::new(),
        })
        .collect();
    encode_body(&stripped, outputs)
}

/// Builds up an unsealed transaction body, input by input and output by
/// output, then seals it into an immutable [`Transaction`].
#[derive(Debug, Clone, Default)]
pub struct TxBuilder {
    inputs: Vec<TxInput>,
    outputs: Vec<TxOutput>,
}

impl TxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an input with an empty signature, returning its index for
    /// later use with [`TxBuilder::raw_data_to_sign`] / `add_signature`.
    pub fn add_input(&mut self, prev_tx: Hash, out_index: u32) -> usize {
        self.inputs.push(TxInput {
            prev_tx,
            out_index,
            signature: Vec::new(),
        });
        self.inputs.len() - 1
    }

    pub fn add_output(&mut self, value: u64, recipient: Hash) -> usize {
        self.outputs.push(TxOutput { value, recipient });
        self.outputs.len() - 1
    }

    /// The bytes a signer must sign to authorize `input_index`.
    ///
    /// Binds the signature to a specific input position within a specific
    /// transaction body: the unsigned encoding of the whole transaction plus
    /// `u32_be(input_index)`.
    ///
    /// # Panics
    /// Panics if `input_index` is out of range — a programmer-misuse
    /// condition, not data the core routes around.
    pub fn raw_data_to_sign(&self, input_index: usize) -> Vec<u8> {
        assert!(
            input_index < self.inputs.len(),
            "raw_data_to_sign: input index {input_index} out of range"
        );
        let mut buf = encode_body_unsigned(&self.inputs, &self.outputs);
        buf.extend_from_slice(&(input_index as u32).to_be_bytes());
        buf
    }

    /// Attaches a signature to `input_index`.
    ///
    /// # Panics
    /// Panics on an out-of-range index; see [`TxBuilder::raw_data_to_sign`].
    pub fn add_signature(&mut self, input_index: usize, signature: Vec<u8>) {
        assert!(
            input_index < self.inputs.len(),
            "add_signature: input index {input_index} out of range"
        );
        self.inputs[input_index].signature = signature;
    }

    /// Computes the transaction id from the current inputs/outputs
    /// (including whatever signatures have been attached) and freezes the
    /// result into an immutable [`Transaction`]. Mutating the builder after
    /// this point has no effect on the returned value.
    pub fn seal(self) -> Transaction {
        let id = compute_id(&self.inputs, &self.outputs);
        Transaction {
            inputs: self.inputs,
            outputs: self.outputs,
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Keypair, PublicKey, SecretKey, Signer};

    /// Deterministic test keypair; never used for anything but fixtures.
    fn keypair() -> Keypair {
        let secret = SecretKey::from_bytes(&[7u8; 32]).unwrap();
        let public = PublicKey::from(&secret);
        Keypair { secret, public }
    }

    fn pubkey_hash(kp: &Keypair) -> Hash {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(kp.public.as_bytes());
        Hash(bytes)
    }

    #[test]
    fn seal_is_deterministic_given_same_body() {
        let mut a = TxBuilder::new();
        a.add_input(Hash::zero(), 0);
        a.add_output(10, Hash::zero());
        let mut b = TxBuilder::new();
        b.add_input(Hash::zero(), 0);
        b.add_output(10, Hash::zero());
        assert_eq!(a.seal().id(), b.seal().id());
    }

    #[test]
    fn seal_id_changes_with_signature() {
        let mut unsigned = TxBuilder::new();
        unsigned.add_input(Hash::zero(), 0);
        unsigned.add_output(10, Hash::zero());
        let unsigned_id = unsigned.clone().seal().id();

        let mut signed = unsigned;
        signed.add_signature(0, vec![1, 2, 3]);
        let signed_id = signed.seal().id();

        assert_ne!(unsigned_id, signed_id);
    }

    #[test]
    fn raw_data_to_sign_ignores_signature_state() {
        let mut builder = TxBuilder::new();
        builder.add_input(Hash::zero(), 0);
        builder.add_output(5, Hash::zero());
        let before = builder.raw_data_to_sign(0);
        builder.add_signature(0, vec![9, 9, 9]);
        let after = builder.raw_data_to_sign(0);
        assert_eq!(before, after);
    }

    #[test]
    fn signature_verifies_against_recipient_of_spent_output() {
        let kp = keypair();
        let recipient = pubkey_hash(&kp);

        let mut builder = TxBuilder::new();
        builder.add_input(Hash::zero(), 0);
        builder.add_output(10, recipient);
        let msg = builder.raw_data_to_sign(0);
        let sig = kp.sign(&msg);
        builder.add_signature(0, sig.to_bytes().to_vec());
        let tx = builder.seal();

        assert!(hash::verify(&recipient, &msg, &tx.inputs()[0].signature));
    }

    #[test]
    fn coinbase_transactions_at_different_heights_have_different_ids() {
        let proposer = Hash::zero();
        let t1 = Transaction::coinbase(proposer, 25, 1);
        let t2 = Transaction::coinbase(proposer, 25, 2);
        assert_ne!(t1.id(), t2.id());
    }

    #[test]
    #[should_panic]
    fn raw_data_to_sign_panics_on_out_of_range_index() {
        let builder = TxBuilder::new();
        let _ = builder.raw_data_to_sign(0);
    }
}
