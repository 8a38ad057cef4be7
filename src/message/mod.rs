//! Transaction messages before compilation.
//!
//! A [`TransactionMessage`] is the mutable, order-preserving form a
//! transaction is assembled in: a version, an optional fee payer, an
//! optional lifetime and a list of instructions. Builder methods consume
//! and return the message so construction chains.

mod compute_budget;
mod config;
mod instruction;
mod lifetime;

pub use compute_budget::{
    is_set_compute_unit_limit_instruction, request_heap_frame_instruction,
    set_compute_unit_limit_instruction, set_compute_unit_price_instruction,
    set_loaded_accounts_data_size_limit_instruction, COMPUTE_BUDGET_PROGRAM_ADDRESS,
    MAX_COMPUTE_UNIT_LIMIT,
};
pub use config::{ConfigError, TransactionConfig};
pub use instruction::{AccountMeta, AccountRole, Instruction};
pub use lifetime::{
    advance_nonce_account_instruction, Lifetime, RECENT_BLOCKHASHES_SYSVAR,
    SYSTEM_PROGRAM_ADDRESS,
};

pub(crate) use compute_budget::set_or_append_compute_unit_limit;
use lifetime::is_advance_nonce_account_instruction;

use crate::types::{Address, Blockhash};

/// Message serialization format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransactionVersion {
    /// The original format without address table lookups.
    Legacy,
    /// Versioned format zero, which supports address table lookups.
    #[default]
    V0,
}

/// An uncompiled transaction message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionMessage {
    version: TransactionVersion,
    fee_payer: Option<Address>,
    lifetime: Option<Lifetime>,
    instructions: Vec<Instruction>,
}

impl TransactionMessage {
    pub fn new(version: TransactionVersion) -> Self {
        Self {
            version,
            fee_payer: None,
            lifetime: None,
            instructions: Vec::new(),
        }
    }

    pub fn version(&self) -> TransactionVersion {
        self.version
    }

    pub fn fee_payer(&self) -> Option<Address> {
        self.fee_payer
    }

    pub fn lifetime(&self) -> Option<&Lifetime> {
        self.lifetime.as_ref()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn is_durable_nonce(&self) -> bool {
        self.lifetime.as_ref().map_or(false, Lifetime::is_durable_nonce)
    }

    pub(crate) fn instructions_mut(&mut self) -> &mut Vec<Instruction> {
        &mut self.instructions
    }

    pub fn with_fee_payer(mut self, fee_payer: Address) -> Self {
        self.fee_payer = Some(fee_payer);
        self
    }

    /// Sets a blockhash lifetime, replacing any previous lifetime.
    pub fn with_blockhash_lifetime(mut self, blockhash: Blockhash) -> Self {
        self.lifetime = Some(Lifetime::Blockhash(blockhash));
        self
    }

    /// Sets a durable nonce lifetime and puts the matching advance-nonce
    /// instruction first, replacing one already in that position.
    pub fn with_durable_nonce_lifetime(
        mut self,
        nonce_account: Address,
        nonce_authority: Address,
        nonce_value: Blockhash,
    ) -> Self {
        let advance = advance_nonce_account_instruction(nonce_account, nonce_authority);
        let replace = self
            .instructions
            .first()
            .map_or(false, is_advance_nonce_account_instruction);
        if replace {
            self.instructions[0] = advance;
        } else {
            self.instructions.insert(0, advance);
        }
        self.lifetime = Some(Lifetime::DurableNonce {
            nonce_account,
            nonce_authority,
            nonce_value,
        });
        self
    }

    pub fn with_instruction(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    pub fn with_instructions(mut self, instructions: impl IntoIterator<Item = Instruction>) -> Self {
        self.instructions.extend(instructions);
        self
    }

    /// Appends the compute budget instructions a config expands to.
    pub fn with_config(self, config: &TransactionConfig) -> Self {
        self.with_instructions(config.to_instructions())
    }
}
