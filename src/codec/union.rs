//! Discriminated-union codec.

use std::fmt;

use super::core::{Codec, CodecSize, Decoder, Encoder, SizeMode};
use super::error::CodecError;
use super::num::Prefix;

/// Codec choosing between several variant encodings by a leading tag.
///
/// The tag is always computed from the value before encoding; decoding an
/// unknown tag fails with [`CodecError::InvalidDiscriminator`].
pub struct UnionCodec<T> {
    tag: Prefix,
    variants: Vec<Box<dyn Codec<T> + Send + Sync>>,
    selector: fn(&T) -> usize,
}

impl<T> UnionCodec<T> {
    /// `selector` maps a value to its variant index. Returning an index
    /// outside `variants` is a bug in the selector and panics on encode.
    pub fn new(
        tag: Prefix,
        variants: Vec<Box<dyn Codec<T> + Send + Sync>>,
        selector: fn(&T) -> usize,
    ) -> Self {
        Self {
            tag,
            variants,
            selector,
        }
    }

    pub fn num_variants(&self) -> usize {
        self.variants.len()
    }
}

impl<T> fmt::Debug for UnionCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnionCodec")
            .field("tag", &self.tag)
            .field("variants", &self.variants.len())
            .finish()
    }
}

impl<T> CodecSize for UnionCodec<T> {
    fn size_mode(&self) -> SizeMode {
        let tag_size = match self.tag.size_mode() {
            SizeMode::Fixed(size) => size,
            SizeMode::Variable => return SizeMode::Variable,
        };
        let mut sizes = self
            .variants
            .iter()
            .map(|variant| variant.size_mode().fixed_size());
        match sizes.next() {
            Some(Some(first)) if sizes.all(|size| size == Some(first)) => {
                SizeMode::Fixed(tag_size + first)
            }
            _ => SizeMode::Variable,
        }
    }
}

impl<T> Encoder<T> for UnionCodec<T> {
    fn encoded_size(&self, value: &T) -> usize {
        let index = (self.selector)(value);
        self.tag.encoded_len_size(index) + self.variants[index].encoded_size(value)
    }

    fn encode(&self, value: &T, out: &mut Vec<u8>) -> Result<(), CodecError> {
        let index = (self.selector)(value);
        assert!(
            index < self.variants.len(),
            "union selector returned variant {index}, only {} exist",
            self.variants.len()
        );
        self.tag.encode_len(index, out)?;
        self.variants[index].encode(value, out)
    }
}

impl<T> Decoder<T> for UnionCodec<T> {
    fn decode(&self, bytes: &[u8], offset: usize) -> Result<(T, usize), CodecError> {
        let (index, next) = self.tag.decode_len(bytes, offset)?;
        let variant = self
            .variants
            .get(index)
            .ok_or(CodecError::InvalidDiscriminator {
                discriminator: index as u64,
                offset,
                num_variants: self.variants.len(),
            })?;
        variant.decode(bytes, next)
    }
}
