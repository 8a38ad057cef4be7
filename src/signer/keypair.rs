//! In-process ed25519 keypair signer.

use std::fmt;

use async_trait::async_trait;
use ed25519_dalek::{Signer as _, SigningKey};
use rand::rngs::OsRng;
use thiserror::Error;
use zeroize::Zeroize;

use super::error::SignError;
use super::traits::{
    MessagePartialSigner, SignatureDictionary, SignerOptions, TransactionPartialSigner,
};
use crate::offchain::SignedOffchainMessage;
use crate::transaction::Transaction;
use crate::types::{Address, Signature};

/// Errors loading keypair material.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeypairError {
    /// Keypair bytes must be a 32-byte seed or a 64-byte seed plus public
    /// key pair.
    #[error("invalid keypair length: expected 32 or 64 bytes, got {length}")]
    InvalidLength { length: usize },
    /// All-zero key material is rejected.
    #[error("invalid keypair seed")]
    InvalidSeed,
    /// The public half does not match the secret half.
    #[error("keypair halves do not match")]
    KeypairMismatch,
}

/// A signer holding its ed25519 secret in process memory.
///
/// Participates as a partial signer for both transactions and off-chain
/// messages. Local copies of key material are zeroized after the signing
/// key is built.
pub struct KeypairSigner {
    signing_key: SigningKey,
    address: Address,
}

impl KeypairSigner {
    /// Generates a signer from fresh OS randomness.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Loads a signer from a 32-byte seed or a 64-byte seed plus public
    /// key pair.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeypairError> {
        if bytes.iter().all(|&byte| byte == 0) {
            return Err(KeypairError::InvalidSeed);
        }
        match bytes.len() {
            32 => {
                let mut seed = [0u8; 32];
                seed.copy_from_slice(bytes);
                let signing_key = SigningKey::from_bytes(&seed);
                seed.zeroize();
                Ok(Self::from_signing_key(signing_key))
            }
            64 => {
                let mut keypair = [0u8; 64];
                keypair.copy_from_slice(bytes);
                let result = SigningKey::from_keypair_bytes(&keypair)
                    .map_err(|_| KeypairError::KeypairMismatch);
                keypair.zeroize();
                result.map(Self::from_signing_key)
            }
            length => Err(KeypairError::InvalidLength { length }),
        }
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = Address::new(signing_key.verifying_key().to_bytes());
        Self {
            signing_key,
            address,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Signs arbitrary bytes, the primitive both capacities build on.
    pub fn sign_bytes(&self, bytes: &[u8]) -> Signature {
        Signature::new(self.signing_key.sign(bytes).to_bytes())
    }

    fn sign_artifacts<'a>(
        &self,
        artifacts: impl Iterator<Item = &'a [u8]>,
    ) -> Vec<SignatureDictionary> {
        artifacts
            .map(|bytes| {
                let mut dictionary = SignatureDictionary::new();
                dictionary.insert(self.address, self.sign_bytes(bytes));
                dictionary
            })
            .collect()
    }
}

impl fmt::Debug for KeypairSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeypairSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TransactionPartialSigner for KeypairSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_transactions(
        &self,
        transactions: &[Transaction],
        _options: &SignerOptions,
    ) -> Result<Vec<SignatureDictionary>, SignError> {
        Ok(self.sign_artifacts(transactions.iter().map(Transaction::message_bytes)))
    }
}

#[async_trait]
impl MessagePartialSigner for KeypairSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_messages(
        &self,
        messages: &[SignedOffchainMessage],
        _options: &SignerOptions,
    ) -> Result<Vec<SignatureDictionary>, SignError> {
        Ok(self.sign_artifacts(messages.iter().map(SignedOffchainMessage::message_bytes)))
    }
}
