//! Client-side toolkit for Solana transactions and off-chain messages.
//!
//! The crate is layered bottom-up: [`codec`] provides composable binary
//! codecs, [`types`] the address and signature newtypes, [`message`] the
//! mutable transaction message builder, [`compile`] the account resolver
//! that turns a message into wire bytes, [`transaction`] the signable
//! envelope, [`offchain`] the off-chain message schema, [`signer`] the
//! batch signing protocol, and [`budget`] the simulation-backed compute
//! unit estimator on top of [`rpc`].

pub mod budget;
pub mod codec;
pub mod compile;
pub mod message;
pub mod offchain;
pub mod rpc;
pub mod signer;
pub mod transaction;
pub mod types;

pub use budget::{estimate_compute_unit_limit, EstimateError, EstimateOptions};
pub use compile::{compile_transaction_message, AddressLookupTable, CompileError, CompiledMessage};
pub use message::{
    AccountMeta, AccountRole, Instruction, Lifetime, TransactionConfig, TransactionMessage,
    TransactionVersion,
};
pub use offchain::{MessageFormat, OffchainMessage, OffchainMessageError, SignedOffchainMessage};
pub use signer::{KeypairSigner, SignError, SigningOptions};
pub use transaction::{Transaction, TransactionError};
pub use types::{Address, Blockhash, Signature};
