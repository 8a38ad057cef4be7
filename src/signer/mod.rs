//! Signer abstractions and the batch signing protocol.
//!
//! A signer is anything that can produce Ed25519 signatures over
//! transaction or off-chain message bytes: an in-memory keypair, a
//! hardware wallet bridge, a remote signing service. Each concrete
//! signer implements the trait matching its capability (partial,
//! modifying, or sending) and is passed to the protocol entry points
//! wrapped in a handle enum.

mod error;
mod keypair;
mod noop;
mod protocol;
mod traits;

pub use error::SignError;
pub use keypair::{KeypairError, KeypairSigner};
pub use noop::NoopSigner;
pub use protocol::{
    partially_sign_offchain_message, partially_sign_transaction, partially_sign_transactions,
    sign_and_send_transaction, sign_offchain_message, sign_transaction, SigningOptions,
};
pub use traits::{
    MessageModifyingSigner, MessagePartialSigner, MessageSignerHandle, ModifiedMessage,
    ModifiedTransaction, SignatureDictionary, SignerOptions, TransactionModifyingSigner,
    TransactionPartialSigner, TransactionSendingSigner, TransactionSignerHandle,
};
