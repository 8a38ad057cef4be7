//! Fixed-width bit flag codec.

use super::core::{CodecSize, Decoder, Encoder, SizeMode};
use super::error::CodecError;

/// Codec reading a fixed block of bytes as individual flags.
///
/// Flag `i` maps to byte `i / 8` at bit position `i % 8`, least-significant
/// bit first, so flag 0 of a set byte is `0b0000_0001`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitArrayCodec {
    bytes: usize,
}

impl BitArrayCodec {
    pub fn new(bytes: usize) -> Self {
        Self { bytes }
    }

    /// Number of flags carried, always `bytes * 8`.
    pub fn bit_count(&self) -> usize {
        self.bytes * 8
    }
}

impl CodecSize for BitArrayCodec {
    fn size_mode(&self) -> SizeMode {
        SizeMode::Fixed(self.bytes)
    }
}

impl Encoder<Vec<bool>> for BitArrayCodec {
    fn encoded_size(&self, _value: &Vec<bool>) -> usize {
        self.bytes
    }

    fn encode(&self, value: &Vec<bool>, out: &mut Vec<u8>) -> Result<(), CodecError> {
        if value.len() != self.bit_count() {
            return Err(CodecError::InvalidBitArrayLength {
                expected_bits: self.bit_count(),
                actual_bits: value.len(),
            });
        }
        let start = out.len();
        out.resize(start + self.bytes, 0);
        for (i, flag) in value.iter().enumerate() {
            if *flag {
                out[start + i / 8] |= 1 << (i % 8);
            }
        }
        Ok(())
    }
}

impl Decoder<Vec<bool>> for BitArrayCodec {
    fn decode(&self, bytes: &[u8], offset: usize) -> Result<(Vec<bool>, usize), CodecError> {
        let window = bytes
            .get(offset..offset + self.bytes)
            .ok_or_else(|| CodecError::end_of_buffer(offset, self.bytes, bytes.len()))?;
        let mut flags = Vec::with_capacity(self.bit_count());
        for byte in window {
            for bit in 0..8 {
                flags.push(byte & (1 << bit) != 0);
            }
        }
        Ok((flags, offset + self.bytes))
    }
}
