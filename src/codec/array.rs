//! Codecs for homogeneous sequences.

use super::core::{CodecSize, Decoder, Encoder, SizeMode};
use super::error::CodecError;
use super::num::Prefix;

/// How an array codec determines its element count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArraySize {
    /// Exactly this many elements, no count on the wire.
    Fixed(usize),
    /// Element count carried in a leading prefix.
    Prefixed(Prefix),
    /// Elements fill the rest of the buffer.
    Remainder,
}

/// Codec for a `Vec<T>` of same-typed items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayCodec<C> {
    item: C,
    size: ArraySize,
}

impl<C> ArrayCodec<C> {
    pub fn new(item: C, size: ArraySize) -> Self {
        Self { item, size }
    }

    /// Solana shortvec form: compact-u16 count prefix.
    pub fn short_vec(item: C) -> Self {
        Self::new(item, ArraySize::Prefixed(Prefix::ShortU16))
    }

    pub fn fixed(item: C, len: usize) -> Self {
        Self::new(item, ArraySize::Fixed(len))
    }

    pub fn prefixed(item: C, prefix: Prefix) -> Self {
        Self::new(item, ArraySize::Prefixed(prefix))
    }

    pub fn remainder(item: C) -> Self {
        Self::new(item, ArraySize::Remainder)
    }

    fn decode_items<T>(
        &self,
        bytes: &[u8],
        mut offset: usize,
        count: usize,
    ) -> Result<(Vec<T>, usize), CodecError>
    where
        C: Decoder<T>,
    {
        // cap preallocation; counts come from untrusted bytes
        let mut items = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let (item, next) = self.item.decode(bytes, offset)?;
            items.push(item);
            offset = next;
        }
        Ok((items, offset))
    }
}

impl<C: CodecSize> CodecSize for ArrayCodec<C> {
    fn size_mode(&self) -> SizeMode {
        match (self.size, self.item.size_mode()) {
            (ArraySize::Fixed(count), SizeMode::Fixed(item)) => SizeMode::Fixed(count * item),
            _ => SizeMode::Variable,
        }
    }
}

impl<T, C: Encoder<T>> Encoder<Vec<T>> for ArrayCodec<C> {
    fn encoded_size(&self, value: &Vec<T>) -> usize {
        let items: usize = value.iter().map(|item| self.item.encoded_size(item)).sum();
        match self.size {
            ArraySize::Prefixed(prefix) => prefix.encoded_len_size(value.len()) + items,
            _ => items,
        }
    }

    fn encode(&self, value: &Vec<T>, out: &mut Vec<u8>) -> Result<(), CodecError> {
        match self.size {
            ArraySize::Fixed(expected) if value.len() != expected => {
                return Err(CodecError::SizeMismatch {
                    expected,
                    actual: value.len(),
                });
            }
            ArraySize::Prefixed(prefix) => prefix.encode_len(value.len(), out)?,
            _ => {}
        }
        for item in value {
            self.item.encode(item, out)?;
        }
        Ok(())
    }
}

impl<T, C: Decoder<T>> Decoder<Vec<T>> for ArrayCodec<C> {
    fn decode(&self, bytes: &[u8], offset: usize) -> Result<(Vec<T>, usize), CodecError> {
        match self.size {
            ArraySize::Fixed(count) => self.decode_items(bytes, offset, count),
            ArraySize::Prefixed(prefix) => {
                let (count, next) = prefix.decode_len(bytes, offset)?;
                self.decode_items(bytes, next, count)
            }
            ArraySize::Remainder => {
                let mut items = Vec::new();
                let mut offset = offset;
                while offset < bytes.len() {
                    let (item, next) = self.item.decode(bytes, offset)?;
                    if next == offset {
                        // zero-size items would never advance
                        break;
                    }
                    items.push(item);
                    offset = next;
                }
                Ok((items, offset))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode, ShortU16, U16, U8};

    #[test]
    fn test_short_vec_round_trip() {
        let codec = ArrayCodec::short_vec(U16);
        let value = vec![1u16, 513, u16::MAX];
        let bytes = encode(&codec, &value).unwrap();
        assert_eq!(bytes, vec![3, 0x01, 0x00, 0x01, 0x02, 0xff, 0xff]);
        assert_eq!(decode(&codec, &bytes).unwrap(), value);
    }

    #[test]
    fn test_fixed_array_enforces_length() {
        let codec = ArrayCodec::fixed(U8, 2);
        assert_eq!(codec.size_mode(), SizeMode::Fixed(2));
        let err = encode(&codec, &vec![1u8, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            CodecError::SizeMismatch {
                expected: 2,
                actual: 3
            }
        );
        assert_eq!(decode(&codec, &[7, 8]).unwrap(), vec![7u8, 8]);
    }

    #[test]
    fn test_remainder_array_drains_buffer() {
        let codec = ArrayCodec::remainder(U16);
        let (value, next) = codec.decode(&[1, 0, 2, 0, 3, 0], 0).unwrap();
        assert_eq!(value, vec![1u16, 2, 3]);
        assert_eq!(next, 6);
    }

    #[test]
    fn test_remainder_array_of_variable_items() {
        let codec = ArrayCodec::remainder(ShortU16);
        let bytes = encode(&codec, &vec![5u16, 300, 1]).unwrap();
        assert_eq!(decode(&codec, &bytes).unwrap(), vec![5u16, 300, 1]);
    }

    #[test]
    fn test_prefixed_count_larger_than_buffer() {
        let codec = ArrayCodec::prefixed(U8, Prefix::U8);
        let err = decode(&codec, &[5, 1, 2]).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedEndOfBuffer { .. }));
    }

    #[test]
    fn test_empty_array() {
        let codec = ArrayCodec::short_vec(U8);
        let bytes = encode(&codec, &Vec::<u8>::new()).unwrap();
        assert_eq!(bytes, vec![0]);
        assert_eq!(decode(&codec, &bytes).unwrap(), Vec::<u8>::new());
    }
}
