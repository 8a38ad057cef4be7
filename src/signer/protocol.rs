//! The three-phase signing protocol.
//!
//! Signers run in a fixed order: every modifying signer sequentially,
//! since each may rewrite the artifact the next one sees; then all
//! partial signers concurrently, since none of them change the bytes;
//! then, for submission flows, the single sending signer. Cancellation is
//! checked between phases and raced against every in-flight signer call.

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::try_join_all;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use super::error::SignError;
use super::traits::{
    MessageModifyingSigner, MessagePartialSigner, MessageSignerHandle, ModifiedMessage,
    ModifiedTransaction, SignatureDictionary, SignerOptions, TransactionModifyingSigner,
    TransactionPartialSigner, TransactionSendingSigner, TransactionSignerHandle,
};
use crate::offchain::{OffchainMessage, SignedOffchainMessage};
use crate::transaction::Transaction;
use crate::types::Signature;

/// Options for one signing run.
#[derive(Debug, Clone, Default)]
pub struct SigningOptions {
    /// Passed through to every signer.
    pub min_context_slot: Option<u64>,
    /// Cancels the run between phases and aborts in-flight signer calls.
    pub cancel: CancellationToken,
}

impl SigningOptions {
    fn signer_options(&self) -> SignerOptions {
        SignerOptions {
            min_context_slot: self.min_context_slot,
        }
    }

    fn ensure_active(&self) -> Result<(), SignError> {
        if self.cancel.is_cancelled() {
            Err(SignError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Races `future` against cancellation.
async fn run_cancellable<T>(
    cancel: &CancellationToken,
    future: impl Future<Output = Result<T, SignError>>,
) -> Result<T, SignError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(SignError::Cancelled),
        result = future => result,
    }
}

/// Signers must return exactly one output per submitted artifact.
fn check_cardinality<T>(returned: &[T], submitted: usize) -> Result<(), SignError> {
    if returned.len() == submitted {
        Ok(())
    } else {
        Err(SignError::WalletMultiSignUnimplemented {
            submitted,
            returned: returned.len(),
        })
    }
}

struct PartitionedTransactionSigners {
    modifying: Vec<Arc<dyn TransactionModifyingSigner>>,
    partial: Vec<Arc<dyn TransactionPartialSigner>>,
    sending: Option<Arc<dyn TransactionSendingSigner>>,
}

impl fmt::Debug for PartitionedTransactionSigners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionedTransactionSigners")
            .field("modifying", &self.modifying.len())
            .field("partial", &self.partial.len())
            .field("sending", &self.sending.is_some())
            .finish()
    }
}

fn partition_transaction_signers(
    signers: &[TransactionSignerHandle],
) -> Result<PartitionedTransactionSigners, SignError> {
    let mut seen = BTreeSet::new();
    let mut modifying = Vec::new();
    let mut partial = Vec::new();
    let mut sending: Option<Arc<dyn TransactionSendingSigner>> = None;
    for handle in signers {
        let address = handle.address();
        if !seen.insert(address) {
            return Err(SignError::DuplicateSignerAddress { address });
        }
        match handle {
            TransactionSignerHandle::Modifying(signer) => modifying.push(Arc::clone(signer)),
            TransactionSignerHandle::Partial(signer) => partial.push(Arc::clone(signer)),
            TransactionSignerHandle::Sending(signer) => {
                if sending.is_some() {
                    return Err(SignError::MultipleSendingSigners);
                }
                sending = Some(Arc::clone(signer));
            }
        }
    }
    Ok(PartitionedTransactionSigners {
        modifying,
        partial,
        sending,
    })
}

struct PartitionedMessageSigners {
    modifying: Vec<Arc<dyn MessageModifyingSigner>>,
    partial: Vec<Arc<dyn MessagePartialSigner>>,
}

fn partition_message_signers(
    signers: &[MessageSignerHandle],
) -> Result<PartitionedMessageSigners, SignError> {
    let mut seen = BTreeSet::new();
    let mut modifying = Vec::new();
    let mut partial = Vec::new();
    for handle in signers {
        let address = handle.address();
        if !seen.insert(address) {
            return Err(SignError::DuplicateSignerAddress { address });
        }
        match handle {
            MessageSignerHandle::Modifying(signer) => modifying.push(Arc::clone(signer)),
            MessageSignerHandle::Partial(signer) => partial.push(Arc::clone(signer)),
        }
    }
    Ok(PartitionedMessageSigners { modifying, partial })
}

/// Merges a signature dictionary into a transaction, dropping entries for
/// addresses the transaction does not require. In a batch, a signer is
/// not necessarily required by every transaction.
fn merge_transaction_signatures(
    transaction: &Transaction,
    mut dictionary: SignatureDictionary,
) -> Result<Transaction, SignError> {
    dictionary.retain(|address, _| {
        let required = transaction
            .signatures()
            .iter()
            .any(|slot| slot.address == *address);
        if !required {
            tracing::debug!(address = %address, "Dropping signature the transaction does not require");
        }
        required
    });
    Ok(transaction.with_signatures(dictionary)?)
}

fn merge_message_signatures(
    message: &SignedOffchainMessage,
    mut dictionary: SignatureDictionary,
) -> Result<SignedOffchainMessage, SignError> {
    dictionary.retain(|address, _| {
        let required = message
            .signatures()
            .iter()
            .any(|slot| slot.address == *address);
        if !required {
            tracing::debug!(address = %address, "Dropping signature the message does not require");
        }
        required
    });
    Ok(message.with_signatures(dictionary)?)
}

/// Applies a modifying signer's output. An unchanged message keeps the
/// signatures collected so far; rewritten bytes invalidate them, so the
/// transaction is rebuilt and only the signer's fresh signatures survive.
fn reconcile_modified_transaction(
    current: &Transaction,
    modified: ModifiedTransaction,
) -> Result<Transaction, SignError> {
    if modified.message_bytes == current.message_bytes() {
        merge_transaction_signatures(current, modified.signatures)
    } else {
        let rebuilt = Transaction::new_unsigned(modified.message_bytes)?;
        merge_transaction_signatures(&rebuilt, modified.signatures)
    }
}

fn reconcile_modified_message(
    current: &SignedOffchainMessage,
    modified: ModifiedMessage,
) -> Result<SignedOffchainMessage, SignError> {
    if modified.message_bytes == current.message_bytes() {
        merge_message_signatures(current, modified.signatures)
    } else {
        let rebuilt = SignedOffchainMessage::new_unsigned(modified.message_bytes)?;
        merge_message_signatures(&rebuilt, modified.signatures)
    }
}

async fn run_transaction_modifying_phase(
    mut transactions: Vec<Transaction>,
    signers: &[Arc<dyn TransactionModifyingSigner>],
    options: &SigningOptions,
) -> Result<Vec<Transaction>, SignError> {
    let signer_options = options.signer_options();
    for signer in signers {
        options.ensure_active()?;
        let modified = run_cancellable(
            &options.cancel,
            signer.modify_and_sign_transactions(&transactions, &signer_options),
        )
        .await?;
        check_cardinality(&modified, transactions.len())?;
        let mut next = Vec::with_capacity(transactions.len());
        for (current, modified) in transactions.iter().zip(modified) {
            next.push(reconcile_modified_transaction(current, modified)?);
        }
        transactions = next;
    }
    Ok(transactions)
}

async fn run_transaction_partial_phase(
    transactions: Vec<Transaction>,
    signers: &[Arc<dyn TransactionPartialSigner>],
    options: &SigningOptions,
) -> Result<Vec<Transaction>, SignError> {
    if signers.is_empty() {
        return Ok(transactions);
    }
    options.ensure_active()?;
    let signer_options = options.signer_options();
    let artifacts = &transactions;
    let batches = run_cancellable(
        &options.cancel,
        try_join_all(signers.iter().map(|signer| {
            let signer_options = &signer_options;
            async move {
                let dictionaries = signer.sign_transactions(artifacts, signer_options).await?;
                check_cardinality(&dictionaries, artifacts.len())?;
                Ok::<_, SignError>(dictionaries)
            }
        })),
    )
    .await?;

    // Batches apply in handle order, so for the same address a later
    // signer's signature wins.
    let mut signed = transactions;
    for batch in batches {
        let mut merged = Vec::with_capacity(signed.len());
        for (transaction, dictionary) in signed.iter().zip(batch) {
            merged.push(merge_transaction_signatures(transaction, dictionary)?);
        }
        signed = merged;
    }
    Ok(signed)
}

async fn run_message_modifying_phase(
    mut messages: Vec<SignedOffchainMessage>,
    signers: &[Arc<dyn MessageModifyingSigner>],
    options: &SigningOptions,
) -> Result<Vec<SignedOffchainMessage>, SignError> {
    let signer_options = options.signer_options();
    for signer in signers {
        options.ensure_active()?;
        let modified = run_cancellable(
            &options.cancel,
            signer.modify_and_sign_messages(&messages, &signer_options),
        )
        .await?;
        check_cardinality(&modified, messages.len())?;
        let mut next = Vec::with_capacity(messages.len());
        for (current, modified) in messages.iter().zip(modified) {
            next.push(reconcile_modified_message(current, modified)?);
        }
        messages = next;
    }
    Ok(messages)
}

async fn run_message_partial_phase(
    messages: Vec<SignedOffchainMessage>,
    signers: &[Arc<dyn MessagePartialSigner>],
    options: &SigningOptions,
) -> Result<Vec<SignedOffchainMessage>, SignError> {
    if signers.is_empty() {
        return Ok(messages);
    }
    options.ensure_active()?;
    let signer_options = options.signer_options();
    let artifacts = &messages;
    let batches = run_cancellable(
        &options.cancel,
        try_join_all(signers.iter().map(|signer| {
            let signer_options = &signer_options;
            async move {
                let dictionaries = signer.sign_messages(artifacts, signer_options).await?;
                check_cardinality(&dictionaries, artifacts.len())?;
                Ok::<_, SignError>(dictionaries)
            }
        })),
    )
    .await?;

    let mut signed = messages;
    for batch in batches {
        let mut merged = Vec::with_capacity(signed.len());
        for (message, dictionary) in signed.iter().zip(batch) {
            merged.push(merge_message_signatures(message, dictionary)?);
        }
        signed = merged;
    }
    Ok(signed)
}

/// Runs the modifying then partial phases over a batch of transactions.
/// Sending signers are rejected here; use
/// [`sign_and_send_transaction`] to submit.
#[instrument(skip_all, fields(transactions = transactions.len(), signers = signers.len()))]
pub async fn partially_sign_transactions(
    transactions: Vec<Transaction>,
    signers: &[TransactionSignerHandle],
    options: &SigningOptions,
) -> Result<Vec<Transaction>, SignError> {
    options.ensure_active()?;
    let partitioned = partition_transaction_signers(signers)?;
    if partitioned.sending.is_some() {
        return Err(SignError::SendingSignerNotSupported);
    }
    let transactions =
        run_transaction_modifying_phase(transactions, &partitioned.modifying, options).await?;
    run_transaction_partial_phase(transactions, &partitioned.partial, options).await
}

/// Single-transaction form of [`partially_sign_transactions`].
pub async fn partially_sign_transaction(
    transaction: Transaction,
    signers: &[TransactionSignerHandle],
    options: &SigningOptions,
) -> Result<Transaction, SignError> {
    let mut transactions = partially_sign_transactions(vec![transaction], signers, options).await?;
    let returned = transactions.len();
    match transactions.pop() {
        Some(transaction) if returned == 1 => Ok(transaction),
        _ => Err(SignError::WalletMultiSignUnimplemented {
            submitted: 1,
            returned,
        }),
    }
}

/// Fully signs one transaction, erroring if any required signature is
/// still missing afterwards.
pub async fn sign_transaction(
    transaction: Transaction,
    signers: &[TransactionSignerHandle],
    options: &SigningOptions,
) -> Result<Transaction, SignError> {
    let transaction = partially_sign_transaction(transaction, signers, options).await?;
    let addresses = transaction.missing_signers();
    if addresses.is_empty() {
        Ok(transaction)
    } else {
        Err(SignError::MissingSignatures { addresses })
    }
}

/// Runs all three phases, submitting through the single sending signer
/// and returning the signature it reports.
#[instrument(skip_all, fields(signers = signers.len()))]
pub async fn sign_and_send_transaction(
    transaction: Transaction,
    signers: &[TransactionSignerHandle],
    options: &SigningOptions,
) -> Result<Signature, SignError> {
    options.ensure_active()?;
    let partitioned = partition_transaction_signers(signers)?;
    let sender = partitioned
        .sending
        .as_ref()
        .map(Arc::clone)
        .ok_or(SignError::MissingSendingSigner)?;

    let transactions =
        run_transaction_modifying_phase(vec![transaction], &partitioned.modifying, options).await?;
    let transactions =
        run_transaction_partial_phase(transactions, &partitioned.partial, options).await?;

    options.ensure_active()?;
    let signer_options = options.signer_options();
    let mut signatures = run_cancellable(
        &options.cancel,
        sender.sign_and_send_transactions(&transactions, &signer_options),
    )
    .await?;
    if signatures.len() != 1 {
        return Err(SignError::WalletMultiSignUnimplemented {
            submitted: 1,
            returned: signatures.len(),
        });
    }
    Ok(signatures.remove(0))
}

/// Runs the modifying then partial phases over one off-chain message.
#[instrument(skip_all, fields(signers = signers.len()))]
pub async fn partially_sign_offchain_message(
    message: &OffchainMessage,
    signers: &[MessageSignerHandle],
    options: &SigningOptions,
) -> Result<SignedOffchainMessage, SignError> {
    options.ensure_active()?;
    let partitioned = partition_message_signers(signers)?;
    let unsigned = SignedOffchainMessage::new_unsigned(message.to_bytes()?)?;
    let messages =
        run_message_modifying_phase(vec![unsigned], &partitioned.modifying, options).await?;
    let mut messages = run_message_partial_phase(messages, &partitioned.partial, options).await?;
    let returned = messages.len();
    match messages.pop() {
        Some(message) if returned == 1 => Ok(message),
        _ => Err(SignError::WalletMultiSignUnimplemented {
            submitted: 1,
            returned,
        }),
    }
}

/// Fully signs one off-chain message, erroring if any signatory's
/// signature is still missing afterwards.
pub async fn sign_offchain_message(
    message: &OffchainMessage,
    signers: &[MessageSignerHandle],
    options: &SigningOptions,
) -> Result<SignedOffchainMessage, SignError> {
    let signed = partially_sign_offchain_message(message, signers, options).await?;
    let addresses = signed.missing_signatories();
    if addresses.is_empty() {
        Ok(signed)
    } else {
        Err(SignError::MissingSignatures { addresses })
    }
}
