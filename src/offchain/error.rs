//! Off-chain message errors.

use thiserror::Error;

use crate::codec::CodecError;
use crate::types::Address;

/// Errors building, parsing, signing or verifying an off-chain message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OffchainMessageError {
    /// Messages must carry at least one byte of content.
    #[error("off-chain message is empty")]
    EmptyMessage,
    /// The content exceeds what the format allows.
    #[error("message is {length} bytes, format allows at most {max}")]
    MaximumLengthExceeded { length: usize, max: usize },
    /// A restricted-ASCII message contained a character outside the
    /// printable range.
    #[error("character {character:?} at position {position} is outside the restricted ASCII range")]
    RestrictedAsciiCharacterOutOfRange { character: char, position: usize },
    /// More signatories than the one-byte count can carry.
    #[error("{count} signatories exceed the u8 count space")]
    TooManySignatories { count: usize },
    /// The signatory list was empty.
    #[error("off-chain message requires at least one signatory")]
    NoRequiredSignatories,
    /// The bytes do not start with the off-chain signing domain.
    #[error("invalid off-chain signing domain")]
    InvalidSigningDomain,
    /// The version byte names an unknown message version.
    #[error("unsupported off-chain message version {version}")]
    UnsupportedVersion { version: u8 },
    /// The format byte names an unknown message format.
    #[error("unsupported off-chain message format {format}")]
    UnsupportedFormat { format: u8 },
    /// The declared message length disagrees with the bytes present.
    #[error("declared message length {declared} but {actual} bytes remain")]
    MessageLengthMismatch { declared: usize, actual: usize },
    /// A signature was supplied for an address that is not a signatory.
    #[error("unknown signatory {address}")]
    UnknownSignatory { address: Address },
    /// Required signatures are still missing.
    #[error("missing signatures for {addresses:?}")]
    MissingSignatures { addresses: Vec<Address> },
    /// A present signature failed strict ed25519 verification.
    #[error("invalid signature from {address}")]
    InvalidSignature { address: Address },
    /// The surrounding bytes were malformed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
