//! Account collection, role merging and lookup table extraction.

use std::collections::BTreeMap;

use super::compiled::{CompiledAddressLookup, MessageHeader};
use super::error::CompileError;
use super::AddressLookupTable;
use crate::message::{AccountRole, TransactionMessage, TransactionVersion};
use crate::types::Address;

/// One-byte indices address at most this many accounts.
const MAX_INDEXED_ACCOUNTS: usize = 256;

/// Accumulated knowledge about one address across all instructions.
#[derive(Debug, Clone, Copy, Default)]
struct AccountUse {
    role: AccountRole,
    invoked: bool,
}

/// The resolved account layout of a message: the static list in canonical
/// order, the header counts over it, and the accounts moved out into
/// lookup tables.
#[derive(Debug)]
pub(crate) struct AccountLayout {
    pub static_addresses: Vec<Address>,
    pub header: MessageHeader,
    pub lookups: Vec<CompiledAddressLookup>,
    pub loaded_writable: Vec<Address>,
    pub loaded_readonly: Vec<Address>,
}

impl AccountLayout {
    /// Position of `address` in the combined index space: static accounts,
    /// then loaded writable, then loaded readonly.
    pub fn index_of(&self, address: &Address) -> Option<usize> {
        if let Some(position) = self.static_addresses.iter().position(|a| a == address) {
            return Some(position);
        }
        let base = self.static_addresses.len();
        if let Some(position) = self.loaded_writable.iter().position(|a| a == address) {
            return Some(base + position);
        }
        let base = base + self.loaded_writable.len();
        self.loaded_readonly
            .iter()
            .position(|a| a == address)
            .map(|position| base + position)
    }
}

/// Collects every account a message touches, merges duplicate mentions to
/// their most permissive role, extracts lookup-table accounts and lays the
/// rest out in canonical static order.
pub(crate) fn compile_accounts(
    message: &TransactionMessage,
    tables: &[AddressLookupTable],
) -> Result<AccountLayout, CompileError> {
    let fee_payer = message.fee_payer().ok_or(CompileError::MissingFeePayer)?;

    let mut uses: BTreeMap<Address, AccountUse> = BTreeMap::new();
    for instruction in message.instructions() {
        uses.entry(instruction.program_address).or_default().invoked = true;
        for meta in &instruction.accounts {
            let entry = uses.entry(meta.address).or_default();
            entry.role = entry.role.merge(meta.role);
        }
    }
    // The payer signs and is debited no matter how instructions mention it.
    uses.entry(fee_payer).or_default().role = AccountRole::WritableSigner;

    if message.version() == TransactionVersion::Legacy && !tables.is_empty() {
        return Err(CompileError::LookupTablesNotSupported);
    }

    let mut lookups = Vec::new();
    let mut loaded_writable = Vec::new();
    let mut loaded_readonly = Vec::new();
    for table in tables {
        // Signers and invoked programs must stay in the static list.
        let (writable_addresses, writable_indexes) = drain_matching(&mut uses, table, |usage| {
            !usage.invoked && !usage.role.is_signer() && usage.role.is_writable()
        })?;
        let (readonly_addresses, readonly_indexes) = drain_matching(&mut uses, table, |usage| {
            !usage.invoked && !usage.role.is_signer() && !usage.role.is_writable()
        })?;
        if writable_indexes.is_empty() && readonly_indexes.is_empty() {
            continue;
        }
        loaded_writable.extend(writable_addresses);
        loaded_readonly.extend(readonly_addresses);
        lookups.push(CompiledAddressLookup {
            table_address: table.address,
            writable_indexes,
            readonly_indexes,
        });
    }

    uses.remove(&fee_payer);
    let mut writable_signers = Vec::new();
    let mut readonly_signers = Vec::new();
    let mut writable_non_signers = Vec::new();
    let mut readonly_non_signers = Vec::new();
    for (address, usage) in uses {
        match (usage.role.is_signer(), usage.role.is_writable()) {
            (true, true) => writable_signers.push(address),
            (true, false) => readonly_signers.push(address),
            (false, true) => writable_non_signers.push(address),
            (false, false) => readonly_non_signers.push(address),
        }
    }

    let to_count = |count: usize| u8::try_from(count).map_err(|_| CompileError::AccountIndexOverflow);
    let header = MessageHeader {
        num_required_signatures: to_count(1 + writable_signers.len() + readonly_signers.len())?,
        num_readonly_signed_accounts: to_count(readonly_signers.len())?,
        num_readonly_unsigned_accounts: to_count(readonly_non_signers.len())?,
    };

    let mut static_addresses = vec![fee_payer];
    static_addresses.extend(writable_signers);
    static_addresses.extend(readonly_signers);
    static_addresses.extend(writable_non_signers);
    static_addresses.extend(readonly_non_signers);

    if static_addresses.len() + loaded_writable.len() + loaded_readonly.len()
        > MAX_INDEXED_ACCOUNTS
    {
        return Err(CompileError::AccountIndexOverflow);
    }

    Ok(AccountLayout {
        static_addresses,
        header,
        lookups,
        loaded_writable,
        loaded_readonly,
    })
}

/// Removes from `uses` every account matching `predicate` that appears in
/// `table`, returning the drained addresses and their table positions.
/// Iteration follows the map, so drained accounts come out in address
/// byte order.
fn drain_matching(
    uses: &mut BTreeMap<Address, AccountUse>,
    table: &AddressLookupTable,
    predicate: impl Fn(&AccountUse) -> bool,
) -> Result<(Vec<Address>, Vec<u8>), CompileError> {
    let mut drained = Vec::new();
    let mut indexes = Vec::new();
    for (address, usage) in uses.iter() {
        if !predicate(usage) {
            continue;
        }
        if let Some(position) = table.addresses.iter().position(|entry| entry == address) {
            let index = u8::try_from(position).map_err(|_| CompileError::LookupIndexOverflow)?;
            drained.push(*address);
            indexes.push(index);
        }
    }
    for address in &drained {
        uses.remove(address);
    }
    Ok((drained, indexes))
}
