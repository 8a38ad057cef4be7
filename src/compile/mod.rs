//! Compiling transaction messages into their signable wire form.
//!
//! Compilation resolves every account a message touches into one
//! deduplicated, canonically ordered list: fee payer first, then writable
//! signers, readonly signers, writable non-signers and readonly
//! non-signers, each group in address byte order. Version 0 messages may
//! push non-signer accounts out into address lookup tables. Instructions
//! are rewritten against the resulting index space and the whole message
//! is bounded by the packet size.

mod accounts;
mod compiled;
mod error;

pub use compiled::{CompiledAddressLookup, CompiledInstruction, CompiledMessage, MessageHeader};
pub use error::CompileError;

pub(crate) use compiled::signature_envelope_size;

use accounts::{compile_accounts, AccountLayout};
use crate::message::TransactionMessage;
use crate::types::Address;

/// Serialized transaction ceiling: an IPv6 minimum MTU minus fragment and
/// header overhead.
pub const PACKET_DATA_SIZE: usize = 1232;

/// An address lookup table: its account address and current entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressLookupTable {
    pub address: Address,
    pub addresses: Vec<Address>,
}

/// Compiles `message` into its signable form, resolving non-signer
/// accounts through `tables` where the version allows.
pub fn compile_transaction_message(
    message: &TransactionMessage,
    tables: &[AddressLookupTable],
) -> Result<CompiledMessage, CompileError> {
    let lifetime = message.lifetime().ok_or(CompileError::MissingLifetime)?;
    let layout = compile_accounts(message, tables)?;

    let mut instructions = Vec::with_capacity(message.instructions().len());
    for instruction in message.instructions() {
        let program_address_index = index_u8(&layout, &instruction.program_address)?;
        let mut account_indices = Vec::with_capacity(instruction.accounts.len());
        for meta in &instruction.accounts {
            account_indices.push(index_u8(&layout, &meta.address)?);
        }
        instructions.push(CompiledInstruction {
            program_address_index,
            account_indices,
            data: instruction.data.clone(),
        });
    }

    let compiled = CompiledMessage {
        version: message.version(),
        header: layout.header,
        static_addresses: layout.static_addresses,
        lifetime_token: lifetime.token(),
        instructions,
        address_table_lookups: layout.lookups,
    };

    let size = compiled.to_bytes()?.len()
        + signature_envelope_size(usize::from(compiled.header.num_required_signatures));
    if size > PACKET_DATA_SIZE {
        return Err(CompileError::TransactionTooLarge {
            size,
            max: PACKET_DATA_SIZE,
        });
    }

    tracing::debug!(
        static_accounts = compiled.static_addresses.len(),
        lookups = compiled.address_table_lookups.len(),
        size,
        "Compiled transaction message"
    );
    Ok(compiled)
}

fn index_u8(layout: &AccountLayout, address: &Address) -> Result<u8, CompileError> {
    let index = layout
        .index_of(address)
        .ok_or(CompileError::UnknownInstructionAccount { address: *address })?;
    u8::try_from(index).map_err(|_| CompileError::AccountIndexOverflow)
}
