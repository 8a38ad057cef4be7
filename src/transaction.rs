//! Transactions: compiled message bytes plus an ordered signature list.

use thiserror::Error;

use crate::codec::{CodecError, Decoder, Encoder, ShortU16};
use crate::compile::{CompileError, CompiledMessage};
use crate::types::{signature_codec, Address, Signature};

/// Errors building, signing or serializing a transaction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// The message bytes could not be parsed or were inconsistent.
    #[error(transparent)]
    Message(#[from] CompileError),
    /// A signature was supplied for an address the message does not
    /// require a signature from.
    #[error("unknown signer {address}")]
    UnknownSigner { address: Address },
    /// Required signatures are still missing.
    #[error("missing signatures for {addresses:?}")]
    MissingSignatures { addresses: Vec<Address> },
    /// The transaction has no fee payer signature to identify it by.
    #[error("transaction is unsigned")]
    Unsigned,
    /// The wire envelope carried a different signature count than the
    /// message requires.
    #[error("signature count mismatch: envelope has {actual}, message requires {expected}")]
    SignatureCountMismatch { expected: usize, actual: usize },
    /// The wire bytes were malformed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// One required signer and its signature, once provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureSlot {
    pub address: Address,
    pub signature: Option<Signature>,
}

/// A transaction: immutable compiled message bytes and the signatures
/// collected over them, ordered exactly as the message's signer list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    message_bytes: Vec<u8>,
    signatures: Vec<SignatureSlot>,
}

impl Transaction {
    /// Builds an unsigned transaction, deriving the signature slots from
    /// the message's required signers.
    pub fn new_unsigned(message_bytes: Vec<u8>) -> Result<Self, TransactionError> {
        let message = CompiledMessage::from_bytes(&message_bytes)?;
        let signatures = message
            .required_signers()
            .iter()
            .map(|address| SignatureSlot {
                address: *address,
                signature: None,
            })
            .collect();
        Ok(Self {
            message_bytes,
            signatures,
        })
    }

    /// The exact bytes signatures are produced over.
    pub fn message_bytes(&self) -> &[u8] {
        &self.message_bytes
    }

    pub fn signatures(&self) -> &[SignatureSlot] {
        &self.signatures
    }

    /// Returns a copy of the transaction with `entries` merged into its
    /// signature slots. The original is untouched.
    pub fn with_signatures(
        &self,
        entries: impl IntoIterator<Item = (Address, Signature)>,
    ) -> Result<Self, TransactionError> {
        let mut updated = self.clone();
        for (address, signature) in entries {
            let slot = updated
                .signatures
                .iter_mut()
                .find(|slot| slot.address == address)
                .ok_or(TransactionError::UnknownSigner { address })?;
            slot.signature = Some(signature);
        }
        Ok(updated)
    }

    pub fn is_fully_signed(&self) -> bool {
        self.signatures.iter().all(|slot| slot.signature.is_some())
    }

    /// Addresses still lacking a signature, in slot order.
    pub fn missing_signers(&self) -> Vec<Address> {
        self.signatures
            .iter()
            .filter(|slot| slot.signature.is_none())
            .map(|slot| slot.address)
            .collect()
    }

    pub fn assert_fully_signed(&self) -> Result<(), TransactionError> {
        let addresses = self.missing_signers();
        if addresses.is_empty() {
            Ok(())
        } else {
            Err(TransactionError::MissingSignatures { addresses })
        }
    }

    /// The transaction's identifier: the fee payer's signature, which is
    /// the first slot.
    pub fn id(&self) -> Result<Signature, TransactionError> {
        self.signatures
            .first()
            .and_then(|slot| slot.signature)
            .ok_or(TransactionError::Unsigned)
    }

    /// Serializes the signature envelope followed by the message bytes.
    /// Missing signatures are written as 64 zero bytes.
    pub fn to_wire_bytes(&self) -> Result<Vec<u8>, TransactionError> {
        let mut out = Vec::with_capacity(1 + self.signatures.len() * 64 + self.message_bytes.len());
        ShortU16.encode(&(self.signatures.len() as u16), &mut out)?;
        let codec = signature_codec();
        for slot in &self.signatures {
            let signature = slot.signature.unwrap_or(Signature::PLACEHOLDER);
            codec.encode(&signature, &mut out)?;
        }
        out.extend_from_slice(&self.message_bytes);
        Ok(out)
    }

    /// Parses a wire transaction. All-zero signatures become empty slots;
    /// the envelope count must match the message's required signers.
    pub fn from_wire_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let (count, mut offset) = ShortU16.decode(bytes, 0)?;
        let codec = signature_codec();
        let mut provided = Vec::with_capacity(usize::from(count).min(256));
        for _ in 0..count {
            let (signature, next) = codec.decode(bytes, offset)?;
            provided.push(signature);
            offset = next;
        }

        let mut transaction = Self::new_unsigned(bytes[offset..].to_vec())?;
        if usize::from(count) != transaction.signatures.len() {
            return Err(TransactionError::SignatureCountMismatch {
                expected: transaction.signatures.len(),
                actual: usize::from(count),
            });
        }
        for (slot, signature) in transaction.signatures.iter_mut().zip(provided) {
            if !signature.is_placeholder() {
                slot.signature = Some(signature);
            }
        }
        Ok(transaction)
    }
}
