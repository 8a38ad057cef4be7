//! Compilation and compiled-message errors.

use thiserror::Error;

use crate::codec::CodecError;
use crate::types::Address;

/// Errors compiling a message or handling its compiled form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The message has no fee payer set.
    #[error("transaction message has no fee payer")]
    MissingFeePayer,
    /// The message has no lifetime set.
    #[error("transaction message has no lifetime")]
    MissingLifetime,
    /// More accounts than one-byte indices can address.
    #[error("account count exceeds the u8 index space")]
    AccountIndexOverflow,
    /// An address lookup table entry position does not fit in a u8.
    #[error("lookup table index exceeds the u8 index space")]
    LookupIndexOverflow,
    /// Legacy messages cannot carry address table lookups.
    #[error("address lookup tables require a version 0 message")]
    LookupTablesNotSupported,
    /// An instruction referenced an account missing from the layout.
    #[error("instruction references unknown account {address}")]
    UnknownInstructionAccount { address: Address },
    /// The serialized transaction exceeds the packet size.
    #[error("serialized transaction is {size} bytes, limit {max}")]
    TransactionTooLarge { size: usize, max: usize },
    /// The message version byte names an unknown format.
    #[error("unsupported message version {version}")]
    UnsupportedVersion { version: u8 },
    /// An instruction index points past the known accounts.
    #[error("account index {index} out of bounds for {num_accounts} accounts")]
    InvalidAccountIndex { index: u8, num_accounts: usize },
    /// Header counts are inconsistent with the static account list.
    #[error(
        "invalid header: {num_required_signatures} required signatures, \
         {num_readonly_signed_accounts} readonly signed, \
         {num_readonly_unsigned_accounts} readonly unsigned, \
         {static_accounts} static accounts"
    )]
    InvalidHeader {
        num_required_signatures: u8,
        num_readonly_signed_accounts: u8,
        num_readonly_unsigned_accounts: u8,
        static_accounts: usize,
    },
    /// The message bytes were malformed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
