//! A signer that signs nothing.

use async_trait::async_trait;

use super::error::SignError;
use super::traits::{
    MessagePartialSigner, SignatureDictionary, SignerOptions, TransactionPartialSigner,
};
use crate::offchain::SignedOffchainMessage;
use crate::transaction::Transaction;
use crate::types::Address;

/// Stands in for a required signer whose signature arrives elsewhere, a
/// backend co-signer for example. Keeps the address in the protocol run
/// while contributing no signatures.
#[derive(Debug, Clone, Copy)]
pub struct NoopSigner {
    address: Address,
}

impl NoopSigner {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

#[async_trait]
impl TransactionPartialSigner for NoopSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_transactions(
        &self,
        transactions: &[Transaction],
        _options: &SignerOptions,
    ) -> Result<Vec<SignatureDictionary>, SignError> {
        Ok(vec![SignatureDictionary::new(); transactions.len()])
    }
}

#[async_trait]
impl MessagePartialSigner for NoopSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_messages(
        &self,
        messages: &[SignedOffchainMessage],
        _options: &SignerOptions,
    ) -> Result<Vec<SignatureDictionary>, SignError> {
        Ok(vec![SignatureDictionary::new(); messages.len()])
    }
}
