//! Compact transaction config block.
//!
//! A config block carries the optional compute budget knobs in a
//! self-describing binary form: a four-byte little-endian presence mask
//! followed by the present values in bit order. The priority fee claims
//! two mask bits as a pair; a mask with only one of them set, or with any
//! bit beyond the known range set, is rejected.

use thiserror::Error;

use super::compute_budget;
use super::instruction::Instruction;
use crate::codec::{BitArrayCodec, CodecError, Decoder, Encoder, U32, U64};

const MASK_BYTES: usize = 4;

// Mask bit positions. Bits 0 and 1 together mean a priority fee.
const COMPUTE_UNIT_LIMIT_BIT: usize = 2;
const LOADED_ACCOUNTS_DATA_SIZE_LIMIT_BIT: usize = 3;
const HEAP_SIZE_BIT: usize = 4;
const KNOWN_BITS: usize = 5;

/// Errors reading or writing a config block.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The presence mask set unknown bits or half of the fee pair.
    #[error("invalid config mask {mask:#b}")]
    InvalidConfigMask { mask: u32 },
    /// The surrounding bytes were malformed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Optional compute budget settings for one transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionConfig {
    /// Priority fee in micro-lamports per compute unit.
    pub priority_fee_micro_lamports: Option<u64>,
    pub compute_unit_limit: Option<u32>,
    pub loaded_accounts_data_size_limit: Option<u32>,
    pub heap_size: Option<u32>,
}

impl TransactionConfig {
    /// Serializes the presence mask followed by the present values.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        let mut flags = vec![false; MASK_BYTES * 8];
        if self.priority_fee_micro_lamports.is_some() {
            flags[0] = true;
            flags[1] = true;
        }
        flags[COMPUTE_UNIT_LIMIT_BIT] = self.compute_unit_limit.is_some();
        flags[LOADED_ACCOUNTS_DATA_SIZE_LIMIT_BIT] = self.loaded_accounts_data_size_limit.is_some();
        flags[HEAP_SIZE_BIT] = self.heap_size.is_some();

        let mut out = Vec::with_capacity(MASK_BYTES + 8 + 4 * 3);
        BitArrayCodec::new(MASK_BYTES).encode(&flags, &mut out)?;
        if let Some(fee) = self.priority_fee_micro_lamports {
            U64.encode(&fee, &mut out)?;
        }
        if let Some(limit) = self.compute_unit_limit {
            U32.encode(&limit, &mut out)?;
        }
        if let Some(limit) = self.loaded_accounts_data_size_limit {
            U32.encode(&limit, &mut out)?;
        }
        if let Some(size) = self.heap_size {
            U32.encode(&size, &mut out)?;
        }
        Ok(out)
    }

    /// Parses a config block, requiring the whole buffer to be consumed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let (flags, mut offset) = BitArrayCodec::new(MASK_BYTES).decode(bytes, 0)?;
        let mask = flags
            .iter()
            .rev()
            .fold(0u32, |mask, &flag| mask << 1 | u32::from(flag));
        if flags[0] != flags[1] {
            return Err(ConfigError::InvalidConfigMask { mask });
        }
        if flags[KNOWN_BITS..].iter().any(|&flag| flag) {
            return Err(ConfigError::InvalidConfigMask { mask });
        }

        let mut config = TransactionConfig::default();
        if flags[0] {
            let (fee, next) = U64.decode(bytes, offset)?;
            config.priority_fee_micro_lamports = Some(fee);
            offset = next;
        }
        if flags[COMPUTE_UNIT_LIMIT_BIT] {
            let (limit, next) = U32.decode(bytes, offset)?;
            config.compute_unit_limit = Some(limit);
            offset = next;
        }
        if flags[LOADED_ACCOUNTS_DATA_SIZE_LIMIT_BIT] {
            let (limit, next) = U32.decode(bytes, offset)?;
            config.loaded_accounts_data_size_limit = Some(limit);
            offset = next;
        }
        if flags[HEAP_SIZE_BIT] {
            let (size, next) = U32.decode(bytes, offset)?;
            config.heap_size = Some(size);
            offset = next;
        }
        if offset != bytes.len() {
            return Err(ConfigError::Codec(CodecError::SizeMismatch {
                expected: offset,
                actual: bytes.len(),
            }));
        }
        Ok(config)
    }

    /// Expands the present settings into compute budget instructions.
    pub fn to_instructions(&self) -> Vec<Instruction> {
        let mut instructions = Vec::new();
        if let Some(fee) = self.priority_fee_micro_lamports {
            instructions.push(compute_budget::set_compute_unit_price_instruction(fee));
        }
        if let Some(limit) = self.compute_unit_limit {
            instructions.push(compute_budget::set_compute_unit_limit_instruction(limit));
        }
        if let Some(limit) = self.loaded_accounts_data_size_limit {
            instructions.push(compute_budget::set_loaded_accounts_data_size_limit_instruction(
                limit,
            ));
        }
        if let Some(size) = self.heap_size {
            instructions.push(compute_budget::request_heap_frame_instruction(size));
        }
        instructions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_alone_sets_both_mask_bits() {
        let config = TransactionConfig {
            priority_fee_micro_lamports: Some(9_000),
            ..Default::default()
        };
        let bytes = config.to_bytes().unwrap();
        assert_eq!(bytes[0], 0b0000_0011);
        assert_eq!(&bytes[1..4], &[0, 0, 0]);
        assert_eq!(bytes.len(), 4 + 8);
        assert_eq!(TransactionConfig::from_bytes(&bytes).unwrap(), config);
    }

    #[test]
    fn test_full_config_round_trip() {
        let config = TransactionConfig {
            priority_fee_micro_lamports: Some(u64::MAX),
            compute_unit_limit: Some(200_000),
            loaded_accounts_data_size_limit: Some(64 * 1024),
            heap_size: Some(256 * 1024),
        };
        let bytes = config.to_bytes().unwrap();
        assert_eq!(bytes[0], 0b0001_1111);
        assert_eq!(bytes.len(), 4 + 8 + 4 + 4 + 4);
        assert_eq!(TransactionConfig::from_bytes(&bytes).unwrap(), config);
    }

    #[test]
    fn test_empty_config_is_just_the_mask() {
        let bytes = TransactionConfig::default().to_bytes().unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 0]);
        assert_eq!(
            TransactionConfig::from_bytes(&bytes).unwrap(),
            TransactionConfig::default()
        );
    }

    #[test]
    fn test_half_set_fee_pair_rejected() {
        let err = TransactionConfig::from_bytes(&[0b0000_0001, 0, 0, 0]).unwrap_err();
        assert_eq!(err, ConfigError::InvalidConfigMask { mask: 0b1 });
        let err = TransactionConfig::from_bytes(&[0b0000_0010, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0])
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidConfigMask { mask: 0b10 });
    }

    #[test]
    fn test_unknown_mask_bits_rejected() {
        let err = TransactionConfig::from_bytes(&[0b0010_0000, 0, 0, 0]).unwrap_err();
        assert_eq!(err, ConfigError::InvalidConfigMask { mask: 0b10_0000 });
        let err = TransactionConfig::from_bytes(&[0, 0, 0, 0x80]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfigMask { .. }));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let err = TransactionConfig::from_bytes(&[0, 0, 0, 0, 0xaa]).unwrap_err();
        assert!(matches!(err, ConfigError::Codec(_)));
    }

    #[test]
    fn test_truncated_value_rejected() {
        let err = TransactionConfig::from_bytes(&[0b0000_0011, 0, 0, 0, 1, 2]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Codec(CodecError::UnexpectedEndOfBuffer { .. })
        ));
    }

    #[test]
    fn test_to_instructions_in_bit_order() {
        let config = TransactionConfig {
            priority_fee_micro_lamports: Some(1),
            compute_unit_limit: Some(2),
            loaded_accounts_data_size_limit: None,
            heap_size: Some(3),
        };
        let instructions = config.to_instructions();
        assert_eq!(instructions.len(), 3);
        assert_eq!(instructions[0].data[0], 3);
        assert_eq!(instructions[1].data[0], 2);
        assert_eq!(instructions[2].data[0], 1);
    }
}
