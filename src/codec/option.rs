//! Codec for optional values.

use super::core::{CodecSize, Decoder, Encoder, SizeMode};
use super::error::CodecError;
use super::num::Prefix;

/// Wire representation of `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoneValue {
    /// `None` occupies no bytes beyond the presence prefix.
    Omitted,
    /// `None` is a zero-filled block the size of the item. Requires a
    /// fixed-size item codec.
    Zeroes,
    /// `None` is this exact byte pattern.
    Sentinel(Vec<u8>),
}

/// Codec for `Option<T>`.
///
/// The presence prefix and the `None` representation vary independently:
/// with a prefix, `0` means absent and `1` present; without one, absence is
/// inferred from the buffer per the [`NoneValue`] strategy.
#[derive(Debug, Clone)]
pub struct OptionCodec<C> {
    item: C,
    prefix: Option<Prefix>,
    none_value: NoneValue,
}

impl<C> OptionCodec<C> {
    /// Standard form: one `u8` presence byte, `None` omitted.
    pub fn new(item: C) -> Self {
        Self {
            item,
            prefix: Some(Prefix::U8),
            none_value: NoneValue::Omitted,
        }
    }

    pub fn with_prefix(mut self, prefix: Option<Prefix>) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn with_none_value(mut self, none_value: NoneValue) -> Self {
        self.none_value = none_value;
        self
    }
}

impl<C: CodecSize> OptionCodec<C> {
    fn fixed_item_size(&self) -> Result<usize, CodecError> {
        self.item
            .size_mode()
            .fixed_size()
            .ok_or(CodecError::ExpectedFixedSize)
    }
}

impl<C: CodecSize> CodecSize for OptionCodec<C> {
    fn size_mode(&self) -> SizeMode {
        let prefix_size = match self.prefix {
            Some(prefix) => match prefix.size_mode() {
                SizeMode::Fixed(size) => size,
                SizeMode::Variable => return SizeMode::Variable,
            },
            None => 0,
        };
        // fixed only when Some and None occupy identical space
        match (self.item.size_mode(), &self.none_value) {
            (SizeMode::Fixed(size), NoneValue::Zeroes) => SizeMode::Fixed(prefix_size + size),
            (SizeMode::Fixed(size), NoneValue::Sentinel(sentinel))
                if sentinel.len() == size =>
            {
                SizeMode::Fixed(prefix_size + size)
            }
            _ => SizeMode::Variable,
        }
    }
}

impl<T, C: Encoder<T>> Encoder<Option<T>> for OptionCodec<C> {
    fn encoded_size(&self, value: &Option<T>) -> usize {
        let prefix = match self.prefix {
            Some(prefix) => prefix.encoded_len_size(1),
            None => 0,
        };
        let body = match value {
            Some(item) => self.item.encoded_size(item),
            None => match &self.none_value {
                NoneValue::Omitted => 0,
                NoneValue::Zeroes => self.item.size_mode().fixed_size().unwrap_or(0),
                NoneValue::Sentinel(sentinel) => sentinel.len(),
            },
        };
        prefix + body
    }

    fn encode(&self, value: &Option<T>, out: &mut Vec<u8>) -> Result<(), CodecError> {
        if matches!(self.none_value, NoneValue::Zeroes) {
            self.fixed_item_size()?;
        }
        if let Some(prefix) = self.prefix {
            prefix.encode_len(usize::from(value.is_some()), out)?;
        }
        match value {
            Some(item) => self.item.encode(item, out),
            None => {
                match &self.none_value {
                    NoneValue::Omitted => {}
                    NoneValue::Zeroes => {
                        let size = self.fixed_item_size()?;
                        out.resize(out.len() + size, 0);
                    }
                    NoneValue::Sentinel(sentinel) => out.extend_from_slice(sentinel),
                }
                Ok(())
            }
        }
    }
}

impl<T, C: Decoder<T>> Decoder<Option<T>> for OptionCodec<C> {
    fn decode(&self, bytes: &[u8], offset: usize) -> Result<(Option<T>, usize), CodecError> {
        let Some(prefix) = self.prefix else {
            return self.decode_unprefixed(bytes, offset);
        };
        let (flag, next) = prefix.decode_len(bytes, offset)?;
        match flag {
            0 => {
                let end = match &self.none_value {
                    NoneValue::Omitted => next,
                    NoneValue::Zeroes => {
                        let size = self.fixed_item_size()?;
                        if bytes.len() < next + size {
                            return Err(CodecError::end_of_buffer(next, size, bytes.len()));
                        }
                        next + size
                    }
                    NoneValue::Sentinel(sentinel) => {
                        let window = bytes.get(next..next + sentinel.len()).ok_or_else(|| {
                            CodecError::end_of_buffer(next, sentinel.len(), bytes.len())
                        })?;
                        if window != sentinel.as_slice() {
                            return Err(CodecError::InvalidConstant { offset: next });
                        }
                        next + sentinel.len()
                    }
                };
                Ok((None, end))
            }
            1 => {
                let (value, end) = self.item.decode(bytes, next)?;
                Ok((Some(value), end))
            }
            other => Err(CodecError::InvalidDiscriminator {
                discriminator: other as u64,
                offset,
                num_variants: 2,
            }),
        }
    }
}

impl<C> OptionCodec<C> {
    fn decode_unprefixed<T>(
        &self,
        bytes: &[u8],
        offset: usize,
    ) -> Result<(Option<T>, usize), CodecError>
    where
        C: Decoder<T>,
    {
        match &self.none_value {
            NoneValue::Omitted => {
                if offset >= bytes.len() {
                    return Ok((None, offset.min(bytes.len())));
                }
                let (value, end) = self.item.decode(bytes, offset)?;
                Ok((Some(value), end))
            }
            NoneValue::Zeroes => {
                let size = self.fixed_item_size()?;
                let window = bytes
                    .get(offset..offset + size)
                    .ok_or_else(|| CodecError::end_of_buffer(offset, size, bytes.len()))?;
                if window.iter().all(|byte| *byte == 0) {
                    return Ok((None, offset + size));
                }
                let (value, end) = self.item.decode(bytes, offset)?;
                Ok((Some(value), end))
            }
            NoneValue::Sentinel(sentinel) => {
                if bytes.get(offset..offset + sentinel.len()) == Some(sentinel.as_slice()) {
                    return Ok((None, offset + sentinel.len()));
                }
                let (value, end) = self.item.decode(bytes, offset)?;
                Ok((Some(value), end))
            }
        }
    }
}
