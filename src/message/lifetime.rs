//! Transaction lifetimes: recent blockhashes and durable nonces.

use once_cell::sync::Lazy;

use super::instruction::{AccountMeta, Instruction};
use crate::types::{Address, Blockhash};

/// The system program owns nonce accounts and handles nonce advancement.
pub const SYSTEM_PROGRAM_ADDRESS: Address = Address::new([0u8; 32]);

/// Sysvar consulted by the system program when advancing a nonce.
pub static RECENT_BLOCKHASHES_SYSVAR: Lazy<Address> = Lazy::new(|| {
    "SysvarRecentB1ockHashes11111111111111111111"
        .parse()
        .expect("valid sysvar address")
});

const ADVANCE_NONCE_DISCRIMINANT: u32 = 4;

/// What bounds how long a transaction stays landable.
///
/// A blockhash lifetime expires when the referenced block falls out of the
/// recent window. A durable nonce lifetime lasts until the nonce account
/// is advanced, and requires the message to start with an advance
/// instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    Blockhash(Blockhash),
    DurableNonce {
        nonce_account: Address,
        nonce_authority: Address,
        nonce_value: Blockhash,
    },
}

impl Lifetime {
    /// The 32-byte token a compiled message carries for this lifetime.
    pub fn token(&self) -> Blockhash {
        match self {
            Lifetime::Blockhash(blockhash) => *blockhash,
            Lifetime::DurableNonce { nonce_value, .. } => *nonce_value,
        }
    }

    pub fn is_durable_nonce(&self) -> bool {
        matches!(self, Lifetime::DurableNonce { .. })
    }
}

/// Builds the system instruction that advances `nonce_account`, authorized
/// by `nonce_authority`.
pub fn advance_nonce_account_instruction(
    nonce_account: Address,
    nonce_authority: Address,
) -> Instruction {
    Instruction::new(
        SYSTEM_PROGRAM_ADDRESS,
        vec![
            AccountMeta::writable(nonce_account),
            AccountMeta::readonly(*RECENT_BLOCKHASHES_SYSVAR),
            AccountMeta::readonly_signer(nonce_authority),
        ],
        ADVANCE_NONCE_DISCRIMINANT.to_le_bytes().to_vec(),
    )
}

/// Recognizes an advance-nonce instruction by program, discriminant and
/// account shape.
pub(crate) fn is_advance_nonce_account_instruction(instruction: &Instruction) -> bool {
    instruction.program_address == SYSTEM_PROGRAM_ADDRESS
        && instruction.data == ADVANCE_NONCE_DISCRIMINANT.to_le_bytes()
        && instruction.accounts.len() == 3
}
