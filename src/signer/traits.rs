//! Signer capability traits and the handles the protocol runs over.
//!
//! A signer participates in one of three capacities. Modifying signers may
//! rewrite the artifact before signing and run sequentially, first.
//! Partial signers only add signatures and run concurrently. Sending
//! signers sign and submit themselves, run last, and at most one may take
//! part in a run. Off-chain messages support the first two capacities
//! only.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::error::SignError;
use crate::offchain::SignedOffchainMessage;
use crate::transaction::Transaction;
use crate::types::{Address, Signature};

/// Signatures keyed by the address that produced them.
pub type SignatureDictionary = BTreeMap<Address, Signature>;

/// Options passed through to every signer in a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignerOptions {
    /// Minimum slot wallet-backed signers should evaluate artifacts at.
    pub min_context_slot: Option<u64>,
}

/// A transaction rewritten by a modifying signer: the new message bytes
/// and the signatures produced over them.
#[derive(Debug, Clone)]
pub struct ModifiedTransaction {
    pub message_bytes: Vec<u8>,
    pub signatures: SignatureDictionary,
}

/// An off-chain message rewritten by a modifying signer.
#[derive(Debug, Clone)]
pub struct ModifiedMessage {
    pub message_bytes: Vec<u8>,
    pub signatures: SignatureDictionary,
}

/// Signs transactions as they are, without submitting them.
#[async_trait]
pub trait TransactionPartialSigner: Send + Sync {
    fn address(&self) -> Address;

    /// Returns one signature dictionary per input transaction, in input
    /// order.
    async fn sign_transactions(
        &self,
        transactions: &[Transaction],
        options: &SignerOptions,
    ) -> Result<Vec<SignatureDictionary>, SignError>;
}

/// Signs transactions it may first rewrite, a wallet inserting its own
/// priority fee for example.
#[async_trait]
pub trait TransactionModifyingSigner: Send + Sync {
    fn address(&self) -> Address;

    /// Returns one possibly rewritten transaction per input, in input
    /// order.
    async fn modify_and_sign_transactions(
        &self,
        transactions: &[Transaction],
        options: &SignerOptions,
    ) -> Result<Vec<ModifiedTransaction>, SignError>;
}

/// Signs transactions and submits them itself, returning the signature of
/// record per transaction.
#[async_trait]
pub trait TransactionSendingSigner: Send + Sync {
    fn address(&self) -> Address;

    async fn sign_and_send_transactions(
        &self,
        transactions: &[Transaction],
        options: &SignerOptions,
    ) -> Result<Vec<Signature>, SignError>;
}

/// Signs off-chain messages as they are.
#[async_trait]
pub trait MessagePartialSigner: Send + Sync {
    fn address(&self) -> Address;

    async fn sign_messages(
        &self,
        messages: &[SignedOffchainMessage],
        options: &SignerOptions,
    ) -> Result<Vec<SignatureDictionary>, SignError>;
}

/// Signs off-chain messages it may first rewrite.
#[async_trait]
pub trait MessageModifyingSigner: Send + Sync {
    fn address(&self) -> Address;

    async fn modify_and_sign_messages(
        &self,
        messages: &[SignedOffchainMessage],
        options: &SignerOptions,
    ) -> Result<Vec<ModifiedMessage>, SignError>;
}

/// One transaction signer in whichever capacity it participates.
#[derive(Clone)]
pub enum TransactionSignerHandle {
    Partial(Arc<dyn TransactionPartialSigner>),
    Modifying(Arc<dyn TransactionModifyingSigner>),
    Sending(Arc<dyn TransactionSendingSigner>),
}

impl TransactionSignerHandle {
    pub fn address(&self) -> Address {
        match self {
            TransactionSignerHandle::Partial(signer) => signer.address(),
            TransactionSignerHandle::Modifying(signer) => signer.address(),
            TransactionSignerHandle::Sending(signer) => signer.address(),
        }
    }
}

impl fmt::Debug for TransactionSignerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            TransactionSignerHandle::Partial(_) => "Partial",
            TransactionSignerHandle::Modifying(_) => "Modifying",
            TransactionSignerHandle::Sending(_) => "Sending",
        };
        f.debug_struct("TransactionSignerHandle")
            .field("kind", &kind)
            .field("address", &self.address())
            .finish()
    }
}

/// One off-chain message signer. Messages cannot be sent, so there is no
/// sending capacity here.
#[derive(Clone)]
pub enum MessageSignerHandle {
    Partial(Arc<dyn MessagePartialSigner>),
    Modifying(Arc<dyn MessageModifyingSigner>),
}

impl MessageSignerHandle {
    pub fn address(&self) -> Address {
        match self {
            MessageSignerHandle::Partial(signer) => signer.address(),
            MessageSignerHandle::Modifying(signer) => signer.address(),
        }
    }
}

impl fmt::Debug for MessageSignerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            MessageSignerHandle::Partial(_) => "Partial",
            MessageSignerHandle::Modifying(_) => "Modifying",
        };
        f.debug_struct("MessageSignerHandle")
            .field("kind", &kind)
            .field("address", &self.address())
            .finish()
    }
}
