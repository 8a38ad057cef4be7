//! Instructions and the accounts they touch.

use crate::types::Address;

/// How an instruction uses an account.
///
/// The discriminant packs two flags: bit 0 is writability, bit 1 is
/// whether the account must sign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum AccountRole {
    #[default]
    Readonly = 0,
    Writable = 1,
    ReadonlySigner = 2,
    WritableSigner = 3,
}

impl AccountRole {
    const IS_WRITABLE: u8 = 0b01;
    const IS_SIGNER: u8 = 0b10;

    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => AccountRole::Readonly,
            1 => AccountRole::Writable,
            2 => AccountRole::ReadonlySigner,
            _ => AccountRole::WritableSigner,
        }
    }

    pub fn is_signer(self) -> bool {
        self as u8 & Self::IS_SIGNER != 0
    }

    pub fn is_writable(self) -> bool {
        self as u8 & Self::IS_WRITABLE != 0
    }

    /// The most permissive of two roles: a signer anywhere stays a signer,
    /// a write anywhere stays a write.
    pub fn merge(self, other: AccountRole) -> AccountRole {
        Self::from_bits(self as u8 | other as u8)
    }

    /// Drops the signer flag, keeping writability.
    pub fn downgrade_to_non_signer(self) -> AccountRole {
        Self::from_bits(self as u8 & !Self::IS_SIGNER)
    }
}

/// One account an instruction reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountMeta {
    pub address: Address,
    pub role: AccountRole,
}

impl AccountMeta {
    pub fn new(address: Address, role: AccountRole) -> Self {
        Self { address, role }
    }

    pub fn readonly(address: Address) -> Self {
        Self::new(address, AccountRole::Readonly)
    }

    pub fn writable(address: Address) -> Self {
        Self::new(address, AccountRole::Writable)
    }

    pub fn readonly_signer(address: Address) -> Self {
        Self::new(address, AccountRole::ReadonlySigner)
    }

    pub fn writable_signer(address: Address) -> Self {
        Self::new(address, AccountRole::WritableSigner)
    }
}

/// A single program invocation: the program to call, the accounts it may
/// touch and its opaque input data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_address: Address,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

impl Instruction {
    pub fn new(program_address: Address, accounts: Vec<AccountMeta>, data: Vec<u8>) -> Self {
        Self {
            program_address,
            accounts,
            data,
        }
    }
}
