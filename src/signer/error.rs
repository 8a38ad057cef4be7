//! Signing errors and their classification.

use thiserror::Error;

use crate::offchain::OffchainMessageError;
use crate::transaction::TransactionError;
use crate::types::Address;

/// Errors from a signing run.
#[derive(Debug, Error)]
pub enum SignError {
    /// The signing run was cancelled before it completed.
    #[error("signing was cancelled")]
    Cancelled,

    /// More than one sending signer was supplied for one transaction.
    #[error("only one sending signer is allowed per transaction")]
    MultipleSendingSigners,

    /// A signer returned a different number of artifacts than it was
    /// given. Wallets that cannot sign batches surface here.
    #[error("signer returned {returned} artifacts for {submitted} submitted")]
    WalletMultiSignUnimplemented { submitted: usize, returned: usize },

    /// The same address appeared behind two signer handles.
    #[error("duplicate signer address {address}")]
    DuplicateSignerAddress { address: Address },

    /// Required signatures were still missing after every signer ran.
    #[error("missing signatures for {addresses:?}")]
    MissingSignatures { addresses: Vec<Address> },

    /// A sending signer was supplied to an operation that only signs.
    #[error("sending signers are not supported by this operation")]
    SendingSignerNotSupported,

    /// No sending signer was supplied to an operation that must submit.
    #[error("a sending signer is required to submit the transaction")]
    MissingSendingSigner,

    /// The signer refused to sign.
    #[error("signer rejected the request: {reason}")]
    SignerRejected { reason: String },

    /// A transaction artifact could not be built or merged.
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// An off-chain message artifact could not be built or merged.
    #[error(transparent)]
    OffchainMessage(#[from] OffchainMessageError),
}

impl SignError {
    /// Shorthand for a signer refusing with a reason.
    pub fn rejected(reason: impl Into<String>) -> Self {
        SignError::SignerRejected {
            reason: reason.into(),
        }
    }

    /// Coarse classification for logs and dashboards.
    pub fn category(&self) -> &'static str {
        match self {
            SignError::Cancelled => "cancelled",
            SignError::MultipleSendingSigners
            | SignError::DuplicateSignerAddress { .. }
            | SignError::SendingSignerNotSupported
            | SignError::MissingSendingSigner => "configuration",
            SignError::WalletMultiSignUnimplemented { .. } => "wallet",
            SignError::MissingSignatures { .. } => "incomplete",
            SignError::SignerRejected { .. } => "rejected",
            SignError::Transaction(_) | SignError::OffchainMessage(_) => "artifact",
        }
    }

    /// Whether the same run may succeed if repeated. Configuration and
    /// artifact errors need the caller to change something first.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SignError::Cancelled | SignError::SignerRejected { .. }
        )
    }
}
