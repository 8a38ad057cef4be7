//! Compute budget program instructions.

use once_cell::sync::Lazy;

use super::instruction::Instruction;
use crate::types::Address;

/// On-chain address of the compute budget program.
pub static COMPUTE_BUDGET_PROGRAM_ADDRESS: Lazy<Address> = Lazy::new(|| {
    "ComputeBudget111111111111111111111111111111"
        .parse()
        .expect("valid program address")
});

/// Hard runtime ceiling on a transaction's compute unit limit.
pub const MAX_COMPUTE_UNIT_LIMIT: u32 = 1_400_000;

// Instruction discriminants. Zero was a deprecated combined form and is
// never emitted.
const REQUEST_HEAP_FRAME: u8 = 1;
const SET_COMPUTE_UNIT_LIMIT: u8 = 2;
const SET_COMPUTE_UNIT_PRICE: u8 = 3;
const SET_LOADED_ACCOUNTS_DATA_SIZE_LIMIT: u8 = 4;

fn build(discriminant: u8, value_le: &[u8]) -> Instruction {
    let mut data = Vec::with_capacity(1 + value_le.len());
    data.push(discriminant);
    data.extend_from_slice(value_le);
    Instruction::new(*COMPUTE_BUDGET_PROGRAM_ADDRESS, Vec::new(), data)
}

/// Requests `bytes` of transaction-wide heap.
pub fn request_heap_frame_instruction(bytes: u32) -> Instruction {
    build(REQUEST_HEAP_FRAME, &bytes.to_le_bytes())
}

/// Caps the transaction at `units` compute units.
pub fn set_compute_unit_limit_instruction(units: u32) -> Instruction {
    build(SET_COMPUTE_UNIT_LIMIT, &units.to_le_bytes())
}

/// Sets the priority fee in micro-lamports per compute unit.
pub fn set_compute_unit_price_instruction(micro_lamports: u64) -> Instruction {
    build(SET_COMPUTE_UNIT_PRICE, &micro_lamports.to_le_bytes())
}

/// Caps the bytes of account data the transaction may load.
pub fn set_loaded_accounts_data_size_limit_instruction(bytes: u32) -> Instruction {
    build(SET_LOADED_ACCOUNTS_DATA_SIZE_LIMIT, &bytes.to_le_bytes())
}

/// Whether `instruction` is a compute budget `SetComputeUnitLimit`.
pub fn is_set_compute_unit_limit_instruction(instruction: &Instruction) -> bool {
    instruction.program_address == *COMPUTE_BUDGET_PROGRAM_ADDRESS
        && instruction.data.first() == Some(&SET_COMPUTE_UNIT_LIMIT)
}

/// Rewrites an existing `SetComputeUnitLimit` instruction in place, or
/// appends one when none is present.
pub(crate) fn set_or_append_compute_unit_limit(instructions: &mut Vec<Instruction>, units: u32) {
    let replacement = set_compute_unit_limit_instruction(units);
    match instructions
        .iter_mut()
        .find(|instruction| is_set_compute_unit_limit_instruction(instruction))
    {
        Some(existing) => existing.data = replacement.data,
        None => instructions.push(replacement),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_data_layouts() {
        assert_eq!(
            set_compute_unit_limit_instruction(1_400_000).data,
            vec![2, 0x40, 0x5c, 0x15, 0x00]
        );
        assert_eq!(
            set_compute_unit_price_instruction(1).data,
            vec![3, 1, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(request_heap_frame_instruction(32 * 1024).data[0], 1);
        assert_eq!(
            set_loaded_accounts_data_size_limit_instruction(1024).data[0],
            4
        );
        assert!(set_compute_unit_limit_instruction(1).accounts.is_empty());
    }

    #[test]
    fn test_recognizes_only_unit_limit() {
        assert!(is_set_compute_unit_limit_instruction(
            &set_compute_unit_limit_instruction(5)
        ));
        assert!(!is_set_compute_unit_limit_instruction(
            &set_compute_unit_price_instruction(5)
        ));
    }

    #[test]
    fn test_set_or_append_replaces_in_place() {
        let mut instructions = vec![
            set_compute_unit_price_instruction(100),
            set_compute_unit_limit_instruction(1),
        ];
        set_or_append_compute_unit_limit(&mut instructions, 999);
        assert_eq!(instructions.len(), 2);
        assert_eq!(instructions[1].data, vec![2, 0xe7, 0x03, 0x00, 0x00]);
    }

    #[test]
    fn test_set_or_append_appends_when_absent() {
        let mut instructions = vec![set_compute_unit_price_instruction(100)];
        set_or_append_compute_unit_limit(&mut instructions, 7);
        assert_eq!(instructions.len(), 2);
        assert!(is_set_compute_unit_limit_instruction(&instructions[1]));
    }
}
