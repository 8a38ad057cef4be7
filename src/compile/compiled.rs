//! Compiled messages and their wire format.
//!
//! A compiled message is the signable byte form of a transaction message:
//! a header with signature counts, the deduplicated static account list,
//! the lifetime token, index-compressed instructions and, for version 0,
//! the address table lookups. Everything length-delimited uses the
//! compact-u16 encoding.

use crate::codec::{transform, ArrayCodec, Codec, CodecError, Decoder, Encoder, ShortU16, U8};
use crate::message::TransactionVersion;
use crate::types::{address_codec, blockhash_codec, Address, Blockhash};

use super::error::CompileError;

/// High bit of the first message byte marks a versioned message.
const MESSAGE_VERSION_FLAG: u8 = 0x80;

/// Signature and readonly counts over the static account list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageHeader {
    pub num_required_signatures: u8,
    pub num_readonly_signed_accounts: u8,
    pub num_readonly_unsigned_accounts: u8,
}

/// An instruction with its accounts compressed to layout indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_address_index: u8,
    pub account_indices: Vec<u8>,
    pub data: Vec<u8>,
}

/// Accounts a message loads from one address lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledAddressLookup {
    pub table_address: Address,
    pub writable_indexes: Vec<u8>,
    pub readonly_indexes: Vec<u8>,
}

/// A fully compiled, signable transaction message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledMessage {
    pub version: TransactionVersion,
    pub header: MessageHeader,
    pub static_addresses: Vec<Address>,
    pub lifetime_token: Blockhash,
    pub instructions: Vec<CompiledInstruction>,
    pub address_table_lookups: Vec<CompiledAddressLookup>,
}

fn header_codec() -> impl Codec<MessageHeader> {
    transform(
        (U8, U8, U8),
        |header: &MessageHeader| {
            (
                header.num_required_signatures,
                header.num_readonly_signed_accounts,
                header.num_readonly_unsigned_accounts,
            )
        },
        |(num_required_signatures, num_readonly_signed_accounts, num_readonly_unsigned_accounts),
         _| {
            Ok(MessageHeader {
                num_required_signatures,
                num_readonly_signed_accounts,
                num_readonly_unsigned_accounts,
            })
        },
    )
}

fn instruction_codec() -> impl Codec<CompiledInstruction> {
    transform(
        (
            U8,
            ArrayCodec::short_vec(U8),
            ArrayCodec::short_vec(U8),
        ),
        |instruction: &CompiledInstruction| {
            (
                instruction.program_address_index,
                instruction.account_indices.clone(),
                instruction.data.clone(),
            )
        },
        |(program_address_index, account_indices, data), _| {
            Ok(CompiledInstruction {
                program_address_index,
                account_indices,
                data,
            })
        },
    )
}

fn lookup_codec() -> impl Codec<CompiledAddressLookup> {
    transform(
        (
            address_codec(),
            ArrayCodec::short_vec(U8),
            ArrayCodec::short_vec(U8),
        ),
        |lookup: &CompiledAddressLookup| {
            (
                lookup.table_address,
                lookup.writable_indexes.clone(),
                lookup.readonly_indexes.clone(),
            )
        },
        |(table_address, writable_indexes, readonly_indexes), _| {
            Ok(CompiledAddressLookup {
                table_address,
                writable_indexes,
                readonly_indexes,
            })
        },
    )
}

impl CompiledMessage {
    /// Serializes the message into its signable byte form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CompileError> {
        if self.version == TransactionVersion::Legacy && !self.address_table_lookups.is_empty() {
            return Err(CompileError::LookupTablesNotSupported);
        }
        let mut out = Vec::new();
        if self.version == TransactionVersion::V0 {
            out.push(MESSAGE_VERSION_FLAG);
        }
        header_codec().encode(&self.header, &mut out)?;
        ArrayCodec::short_vec(address_codec()).encode(&self.static_addresses, &mut out)?;
        blockhash_codec().encode(&self.lifetime_token, &mut out)?;
        ArrayCodec::short_vec(instruction_codec()).encode(&self.instructions, &mut out)?;
        if self.version == TransactionVersion::V0 {
            ArrayCodec::short_vec(lookup_codec()).encode(&self.address_table_lookups, &mut out)?;
        }
        Ok(out)
    }

    /// Parses and validates a compiled message.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CompileError> {
        let first = *bytes
            .first()
            .ok_or(CompileError::Codec(CodecError::end_of_buffer(0, 1, 0)))?;
        let (version, mut offset) = if first & MESSAGE_VERSION_FLAG != 0 {
            let version_number = first & !MESSAGE_VERSION_FLAG;
            if version_number != 0 {
                return Err(CompileError::UnsupportedVersion {
                    version: version_number,
                });
            }
            (TransactionVersion::V0, 1)
        } else {
            (TransactionVersion::Legacy, 0)
        };

        let (header, next) = header_codec().decode(bytes, offset)?;
        offset = next;
        let (static_addresses, next) =
            ArrayCodec::short_vec(address_codec()).decode(bytes, offset)?;
        offset = next;
        let (lifetime_token, next) = blockhash_codec().decode(bytes, offset)?;
        offset = next;
        let (instructions, next) =
            ArrayCodec::short_vec(instruction_codec()).decode(bytes, offset)?;
        offset = next;
        let address_table_lookups = if version == TransactionVersion::V0 {
            let (lookups, next) = ArrayCodec::short_vec(lookup_codec()).decode(bytes, offset)?;
            offset = next;
            lookups
        } else {
            Vec::new()
        };
        if offset != bytes.len() {
            return Err(CompileError::Codec(CodecError::SizeMismatch {
                expected: offset,
                actual: bytes.len(),
            }));
        }

        let message = CompiledMessage {
            version,
            header,
            static_addresses,
            lifetime_token,
            instructions,
            address_table_lookups,
        };
        message.validate()?;
        Ok(message)
    }

    /// Total accounts addressable by instruction indices: the static list
    /// followed by loaded writable then loaded readonly addresses.
    pub fn num_accounts(&self) -> usize {
        self.static_addresses.len()
            + self
                .address_table_lookups
                .iter()
                .map(|lookup| lookup.writable_indexes.len() + lookup.readonly_indexes.len())
                .sum::<usize>()
    }

    /// The static addresses that must sign, fee payer first.
    pub fn required_signers(&self) -> &[Address] {
        let count = usize::from(self.header.num_required_signatures)
            .min(self.static_addresses.len());
        &self.static_addresses[..count]
    }

    fn invalid_header(&self) -> CompileError {
        CompileError::InvalidHeader {
            num_required_signatures: self.header.num_required_signatures,
            num_readonly_signed_accounts: self.header.num_readonly_signed_accounts,
            num_readonly_unsigned_accounts: self.header.num_readonly_unsigned_accounts,
            static_accounts: self.static_addresses.len(),
        }
    }

    fn validate(&self) -> Result<(), CompileError> {
        let required = usize::from(self.header.num_required_signatures);
        let readonly_signed = usize::from(self.header.num_readonly_signed_accounts);
        let readonly_unsigned = usize::from(self.header.num_readonly_unsigned_accounts);
        let static_accounts = self.static_addresses.len();

        if required == 0 || required > static_accounts {
            return Err(self.invalid_header());
        }
        if readonly_signed >= required {
            return Err(self.invalid_header());
        }
        if readonly_unsigned > static_accounts - required {
            return Err(self.invalid_header());
        }

        let num_accounts = self.num_accounts();
        for instruction in &self.instructions {
            // Programs must live in the static list.
            if usize::from(instruction.program_address_index) >= static_accounts {
                return Err(CompileError::InvalidAccountIndex {
                    index: instruction.program_address_index,
                    num_accounts: static_accounts,
                });
            }
            for &index in &instruction.account_indices {
                if usize::from(index) >= num_accounts {
                    return Err(CompileError::InvalidAccountIndex {
                        index,
                        num_accounts,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Byte size of the signature envelope wrapped around a compiled message
/// with `num_signatures` required signatures.
pub(crate) fn signature_envelope_size(num_signatures: usize) -> usize {
    ShortU16.encoded_size(&(num_signatures as u16)) + num_signatures * 64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;

    fn address(byte: u8) -> Address {
        Address::new([byte; 32])
    }

    fn small_message() -> CompiledMessage {
        CompiledMessage {
            version: TransactionVersion::V0,
            header: MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 1,
            },
            static_addresses: vec![address(1), address(2)],
            lifetime_token: Blockhash::new([9u8; 32]),
            instructions: vec![CompiledInstruction {
                program_address_index: 1,
                account_indices: vec![0],
                data: vec![0xaa, 0xbb],
            }],
            address_table_lookups: Vec::new(),
        }
    }

    #[test]
    fn test_v0_wire_layout() {
        let bytes = small_message().to_bytes().unwrap();
        assert_eq!(bytes[0], 0x80);
        assert_eq!(&bytes[1..4], &[1, 0, 1]);
        assert_eq!(bytes[4], 2); // static account count
        assert_eq!(&bytes[5..37], &[1u8; 32]);
        assert_eq!(&bytes[37..69], &[2u8; 32]);
        assert_eq!(&bytes[69..101], &[9u8; 32]);
        assert_eq!(bytes[101], 1); // instruction count
        assert_eq!(&bytes[102..107], &[1, 1, 0, 2, 0xaa]);
        assert_eq!(bytes[bytes.len() - 1], 0); // no lookups
    }

    #[test]
    fn test_round_trip_v0() {
        let message = small_message();
        let bytes = message.to_bytes().unwrap();
        assert_eq!(CompiledMessage::from_bytes(&bytes).unwrap(), message);
    }

    #[test]
    fn test_round_trip_legacy() {
        let mut message = small_message();
        message.version = TransactionVersion::Legacy;
        let bytes = message.to_bytes().unwrap();
        assert_ne!(bytes[0] & 0x80, 0x80);
        let parsed = CompiledMessage::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.version, TransactionVersion::Legacy);
        assert_eq!(parsed.static_addresses, message.static_addresses);
    }

    #[test]
    fn test_round_trip_with_lookups() {
        let mut message = small_message();
        message.address_table_lookups = vec![CompiledAddressLookup {
            table_address: address(7),
            writable_indexes: vec![3, 4],
            readonly_indexes: vec![9],
        }];
        message.instructions[0].account_indices = vec![0, 2, 4];
        let bytes = message.to_bytes().unwrap();
        assert_eq!(CompiledMessage::from_bytes(&bytes).unwrap(), message);
    }

    #[test]
    fn test_legacy_rejects_lookups() {
        let mut message = small_message();
        message.version = TransactionVersion::Legacy;
        message.address_table_lookups = vec![CompiledAddressLookup {
            table_address: address(7),
            writable_indexes: vec![0],
            readonly_indexes: Vec::new(),
        }];
        assert_eq!(
            message.to_bytes().unwrap_err(),
            CompileError::LookupTablesNotSupported
        );
    }

    #[test]
    fn test_unknown_version_rejected() {
        let err = CompiledMessage::from_bytes(&[0x81]).unwrap_err();
        assert_eq!(err, CompileError::UnsupportedVersion { version: 1 });
    }

    #[test]
    fn test_header_consistency_enforced() {
        let mut message = small_message();
        message.header.num_required_signatures = 3; // more than static accounts
        let bytes = message.to_bytes().unwrap();
        assert!(matches!(
            CompiledMessage::from_bytes(&bytes).unwrap_err(),
            CompileError::InvalidHeader { .. }
        ));

        let mut message = small_message();
        message.header.num_readonly_signed_accounts = 1; // all signers readonly
        let bytes = message.to_bytes().unwrap();
        assert!(matches!(
            CompiledMessage::from_bytes(&bytes).unwrap_err(),
            CompileError::InvalidHeader { .. }
        ));
    }

    #[test]
    fn test_instruction_index_bounds_enforced() {
        let mut message = small_message();
        message.instructions[0].account_indices = vec![5];
        let bytes = message.to_bytes().unwrap();
        assert_eq!(
            CompiledMessage::from_bytes(&bytes).unwrap_err(),
            CompileError::InvalidAccountIndex {
                index: 5,
                num_accounts: 2
            }
        );
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = small_message().to_bytes().unwrap();
        bytes.push(0);
        assert!(matches!(
            CompiledMessage::from_bytes(&bytes).unwrap_err(),
            CompileError::Codec(_)
        ));
    }

    #[test]
    fn test_required_signers_prefix() {
        let message = small_message();
        assert_eq!(message.required_signers(), &[address(1)]);
    }

    #[test]
    fn test_signature_envelope_size() {
        assert_eq!(signature_envelope_size(1), 1 + 64);
        assert_eq!(signature_envelope_size(200), 2 + 200 * 64);
    }

    #[test]
    fn test_header_codec_is_three_bytes() {
        let header = MessageHeader {
            num_required_signatures: 1,
            num_readonly_signed_accounts: 2,
            num_readonly_unsigned_accounts: 3,
        };
        let bytes = encode(&header_codec(), &header).unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }
}
