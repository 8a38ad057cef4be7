//! Codec combinators: value transforms, hidden constants, offsets and
//! size framing.

use std::marker::PhantomData;

use super::core::{CodecSize, Decoder, Encoder, SizeMode};
use super::error::CodecError;
use super::num::Prefix;

/// Adapts a codec of `T` into a codec of `U` through two mappings.
///
/// Built with [`transform`]; the decode mapping may fail, and receives the
/// offset the value started at for error reporting.
pub struct TransformCodec<C, T, F, G> {
    inner: C,
    unmap: F,
    map: G,
    _marker: PhantomData<fn() -> T>,
}

/// Builds a [`TransformCodec`] from an inner codec, an `unmap` projecting
/// the outer value down, and a `map` lifting a decoded value back up.
pub fn transform<C, T, U, F, G>(inner: C, unmap: F, map: G) -> TransformCodec<C, T, F, G>
where
    F: Fn(&U) -> T,
    G: Fn(T, usize) -> Result<U, CodecError>,
{
    TransformCodec {
        inner,
        unmap,
        map,
        _marker: PhantomData,
    }
}

impl<C: CodecSize, T, F, G> CodecSize for TransformCodec<C, T, F, G> {
    fn size_mode(&self) -> SizeMode {
        self.inner.size_mode()
    }
}

impl<C, T, U, F, G> Encoder<U> for TransformCodec<C, T, F, G>
where
    C: Encoder<T>,
    F: Fn(&U) -> T,
{
    fn encoded_size(&self, value: &U) -> usize {
        self.inner.encoded_size(&(self.unmap)(value))
    }

    fn encode(&self, value: &U, out: &mut Vec<u8>) -> Result<(), CodecError> {
        self.inner.encode(&(self.unmap)(value), out)
    }
}

impl<C, T, U, F, G> Decoder<U> for TransformCodec<C, T, F, G>
where
    C: Decoder<T>,
    G: Fn(T, usize) -> Result<U, CodecError>,
{
    fn decode(&self, bytes: &[u8], offset: usize) -> Result<(U, usize), CodecError> {
        let (value, next) = self.inner.decode(bytes, offset)?;
        Ok(((self.map)(value, offset)?, next))
    }
}

/// Writes constant bytes before the inner value; verifies and skips them
/// on decode.
#[derive(Debug, Clone)]
pub struct HiddenPrefixCodec<C> {
    prefix: Vec<u8>,
    inner: C,
}

impl<C> HiddenPrefixCodec<C> {
    pub fn new(prefix: impl Into<Vec<u8>>, inner: C) -> Self {
        Self {
            prefix: prefix.into(),
            inner,
        }
    }
}

impl<C: CodecSize> CodecSize for HiddenPrefixCodec<C> {
    fn size_mode(&self) -> SizeMode {
        match self.inner.size_mode() {
            SizeMode::Fixed(size) => SizeMode::Fixed(self.prefix.len() + size),
            SizeMode::Variable => SizeMode::Variable,
        }
    }
}

impl<T, C: Encoder<T>> Encoder<T> for HiddenPrefixCodec<C> {
    fn encoded_size(&self, value: &T) -> usize {
        self.prefix.len() + self.inner.encoded_size(value)
    }

    fn encode(&self, value: &T, out: &mut Vec<u8>) -> Result<(), CodecError> {
        out.extend_from_slice(&self.prefix);
        self.inner.encode(value, out)
    }
}

impl<T, C: Decoder<T>> Decoder<T> for HiddenPrefixCodec<C> {
    fn decode(&self, bytes: &[u8], offset: usize) -> Result<(T, usize), CodecError> {
        let end = offset + self.prefix.len();
        let window = bytes
            .get(offset..end)
            .ok_or_else(|| CodecError::end_of_buffer(offset, self.prefix.len(), bytes.len()))?;
        if window != self.prefix.as_slice() {
            return Err(CodecError::InvalidConstant { offset });
        }
        self.inner.decode(bytes, end)
    }
}

/// Writes constant bytes after the inner value; verifies and skips them
/// on decode.
#[derive(Debug, Clone)]
pub struct HiddenSuffixCodec<C> {
    inner: C,
    suffix: Vec<u8>,
}

impl<C> HiddenSuffixCodec<C> {
    pub fn new(inner: C, suffix: impl Into<Vec<u8>>) -> Self {
        Self {
            inner,
            suffix: suffix.into(),
        }
    }
}

impl<C: CodecSize> CodecSize for HiddenSuffixCodec<C> {
    fn size_mode(&self) -> SizeMode {
        match self.inner.size_mode() {
            SizeMode::Fixed(size) => SizeMode::Fixed(size + self.suffix.len()),
            SizeMode::Variable => SizeMode::Variable,
        }
    }
}

impl<T, C: Encoder<T>> Encoder<T> for HiddenSuffixCodec<C> {
    fn encoded_size(&self, value: &T) -> usize {
        self.inner.encoded_size(value) + self.suffix.len()
    }

    fn encode(&self, value: &T, out: &mut Vec<u8>) -> Result<(), CodecError> {
        self.inner.encode(value, out)?;
        out.extend_from_slice(&self.suffix);
        Ok(())
    }
}

impl<T, C: Decoder<T>> Decoder<T> for HiddenSuffixCodec<C> {
    fn decode(&self, bytes: &[u8], offset: usize) -> Result<(T, usize), CodecError> {
        let (value, next) = self.inner.decode(bytes, offset)?;
        let end = next + self.suffix.len();
        let window = bytes
            .get(next..end)
            .ok_or_else(|| CodecError::end_of_buffer(next, self.suffix.len(), bytes.len()))?;
        if window != self.suffix.as_slice() {
            return Err(CodecError::InvalidConstant { offset: next });
        }
        Ok((value, end))
    }
}

/// Skips `displacement` bytes before the inner value.
///
/// The skipped region belongs to an enclosing protocol layer; encoding
/// zero-fills it for that layer to overwrite.
#[derive(Debug, Clone)]
pub struct OffsetCodec<C> {
    displacement: usize,
    inner: C,
}

impl<C> OffsetCodec<C> {
    pub fn new(displacement: usize, inner: C) -> Self {
        Self {
            displacement,
            inner,
        }
    }
}

impl<C: CodecSize> CodecSize for OffsetCodec<C> {
    fn size_mode(&self) -> SizeMode {
        match self.inner.size_mode() {
            SizeMode::Fixed(size) => SizeMode::Fixed(self.displacement + size),
            SizeMode::Variable => SizeMode::Variable,
        }
    }
}

impl<T, C: Encoder<T>> Encoder<T> for OffsetCodec<C> {
    fn encoded_size(&self, value: &T) -> usize {
        self.displacement + self.inner.encoded_size(value)
    }

    fn encode(&self, value: &T, out: &mut Vec<u8>) -> Result<(), CodecError> {
        out.resize(out.len() + self.displacement, 0);
        self.inner.encode(value, out)
    }
}

impl<T, C: Decoder<T>> Decoder<T> for OffsetCodec<C> {
    fn decode(&self, bytes: &[u8], offset: usize) -> Result<(T, usize), CodecError> {
        let start = offset + self.displacement;
        if bytes.len() < start {
            return Err(CodecError::end_of_buffer(
                offset,
                self.displacement,
                bytes.len(),
            ));
        }
        self.inner.decode(bytes, start)
    }
}

/// Pins the inner codec to an exact byte width.
///
/// Shorter encodings are zero-padded up to the width; longer ones fail.
/// Decoding hands the inner codec exactly this window, so a remainder-style
/// inner codec is effectively truncated to it.
#[derive(Debug, Clone)]
pub struct FixSizeCodec<C> {
    size: usize,
    inner: C,
}

impl<C> FixSizeCodec<C> {
    pub fn new(size: usize, inner: C) -> Self {
        Self { size, inner }
    }
}

impl<C> CodecSize for FixSizeCodec<C> {
    fn size_mode(&self) -> SizeMode {
        SizeMode::Fixed(self.size)
    }
}

impl<T, C: Encoder<T>> Encoder<T> for FixSizeCodec<C> {
    fn encoded_size(&self, _value: &T) -> usize {
        self.size
    }

    fn encode(&self, value: &T, out: &mut Vec<u8>) -> Result<(), CodecError> {
        let start = out.len();
        self.inner.encode(value, out)?;
        let written = out.len() - start;
        if written > self.size {
            out.truncate(start);
            return Err(CodecError::SizeMismatch {
                expected: self.size,
                actual: written,
            });
        }
        out.resize(start + self.size, 0);
        Ok(())
    }
}

impl<T, C: Decoder<T>> Decoder<T> for FixSizeCodec<C> {
    fn decode(&self, bytes: &[u8], offset: usize) -> Result<(T, usize), CodecError> {
        let end = offset + self.size;
        let window = bytes
            .get(offset..end)
            .ok_or_else(|| CodecError::end_of_buffer(offset, self.size, bytes.len()))?;
        let (value, _) = self.inner.decode(window, 0)?;
        Ok((value, end))
    }
}

/// Length-prefixes the inner encoding.
///
/// Decoding bounds the inner codec to the declared window and requires it
/// to consume the window fully.
#[derive(Debug, Clone)]
pub struct SizePrefixCodec<C> {
    prefix: Prefix,
    inner: C,
}

impl<C> SizePrefixCodec<C> {
    pub fn new(prefix: Prefix, inner: C) -> Self {
        Self { prefix, inner }
    }
}

impl<C> CodecSize for SizePrefixCodec<C> {
    fn size_mode(&self) -> SizeMode {
        SizeMode::Variable
    }
}

impl<T, C: Encoder<T>> Encoder<T> for SizePrefixCodec<C> {
    fn encoded_size(&self, value: &T) -> usize {
        let inner = self.inner.encoded_size(value);
        self.prefix.encoded_len_size(inner) + inner
    }

    fn encode(&self, value: &T, out: &mut Vec<u8>) -> Result<(), CodecError> {
        let declared = self.inner.encoded_size(value);
        self.prefix.encode_len(declared, out)?;
        let start = out.len();
        self.inner.encode(value, out)?;
        let written = out.len() - start;
        if written != declared {
            return Err(CodecError::SizeMismatch {
                expected: declared,
                actual: written,
            });
        }
        Ok(())
    }
}

impl<T, C: Decoder<T>> Decoder<T> for SizePrefixCodec<C> {
    fn decode(&self, bytes: &[u8], offset: usize) -> Result<(T, usize), CodecError> {
        let (size, next) = self.prefix.decode_len(bytes, offset)?;
        let end = next + size;
        let window = bytes
            .get(next..end)
            .ok_or_else(|| CodecError::end_of_buffer(next, size, bytes.len()))?;
        let (value, consumed) = self.inner.decode(window, 0)?;
        if consumed != size {
            return Err(CodecError::SizeMismatch {
                expected: size,
                actual: consumed,
            });
        }
        Ok((value, end))
    }
}

/// Independently supplied encoder and decoder halves, paired.
#[derive(Debug, Clone)]
pub struct CombinedCodec<E, D> {
    encoder: E,
    decoder: D,
}

/// Pairs an encoder with a decoder. Their size modes must agree.
pub fn combine<T, E: Encoder<T>, D: Decoder<T>>(
    encoder: E,
    decoder: D,
) -> Result<CombinedCodec<E, D>, CodecError> {
    if encoder.size_mode() != decoder.size_mode() {
        return Err(CodecError::SizeModeMismatch);
    }
    Ok(CombinedCodec { encoder, decoder })
}

impl<E: CodecSize, D> CodecSize for CombinedCodec<E, D> {
    fn size_mode(&self) -> SizeMode {
        self.encoder.size_mode()
    }
}

impl<T, E: Encoder<T>, D> Encoder<T> for CombinedCodec<E, D> {
    fn encoded_size(&self, value: &T) -> usize {
        self.encoder.encoded_size(value)
    }

    fn encode(&self, value: &T, out: &mut Vec<u8>) -> Result<(), CodecError> {
        self.encoder.encode(value, out)
    }
}

impl<T, E: CodecSize, D: Decoder<T>> Decoder<T> for CombinedCodec<E, D> {
    fn decode(&self, bytes: &[u8], offset: usize) -> Result<(T, usize), CodecError> {
        self.decoder.decode(bytes, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode, Bytes, ShortU16, Utf8, U16, U32, U8};

    #[test]
    fn test_transform_maps_both_directions() {
        // centimeters on the wire, meters in the model
        let codec = transform(
            U32,
            |meters: &f64| (*meters * 100.0) as u32,
            |centimeters: u32, _| Ok(f64::from(centimeters) / 100.0),
        );
        let bytes = encode(&codec, &1.25).unwrap();
        assert_eq!(decode(&codec, &bytes).unwrap(), 1.25);
    }

    #[test]
    fn test_transform_decode_can_fail() {
        let codec = transform(
            U8,
            |value: &bool| u8::from(*value),
            |byte: u8, offset| match byte {
                0 => Ok(false),
                1 => Ok(true),
                other => Err(CodecError::InvalidDiscriminator {
                    discriminator: other as u64,
                    offset,
                    num_variants: 2,
                }),
            },
        );
        assert_eq!(decode(&codec, &[1]).unwrap(), true);
        assert!(matches!(
            decode(&codec, &[9]),
            Err(CodecError::InvalidDiscriminator {
                discriminator: 9,
                ..
            })
        ));
    }

    #[test]
    fn test_hidden_prefix_written_and_verified() {
        let codec = HiddenPrefixCodec::new(*b"magic", U16);
        assert_eq!(codec.size_mode(), SizeMode::Fixed(7));
        let bytes = encode(&codec, &513).unwrap();
        assert_eq!(&bytes[..5], b"magic");
        assert_eq!(decode(&codec, &bytes).unwrap(), 513u16);

        let err = decode(&codec, b"wrong!\x01\x02").unwrap_err();
        assert_eq!(err, CodecError::InvalidConstant { offset: 0 });
    }

    #[test]
    fn test_hidden_suffix_written_and_verified() {
        let codec = HiddenSuffixCodec::new(U8, vec![0xee]);
        assert_eq!(encode(&codec, &5).unwrap(), vec![5, 0xee]);
        assert_eq!(decode(&codec, &[5, 0xee]).unwrap(), 5u8);
        let err = decode(&codec, &[5, 0xdd]).unwrap_err();
        assert_eq!(err, CodecError::InvalidConstant { offset: 1 });
    }

    #[test]
    fn test_offset_skips_enclosing_layer_bytes() {
        let codec = OffsetCodec::new(3, U16);
        let bytes = encode(&codec, &513).unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 0x01, 0x02]);
        assert_eq!(decode(&codec, &bytes).unwrap(), 513u16);
    }

    #[test]
    fn test_fix_size_pads_and_rejects_overflow() {
        let codec = FixSizeCodec::new(4, Bytes);
        assert_eq!(codec.size_mode(), SizeMode::Fixed(4));
        assert_eq!(encode(&codec, &vec![9u8]).unwrap(), vec![9, 0, 0, 0]);
        let err = encode(&codec, &vec![1u8; 5]).unwrap_err();
        assert_eq!(
            err,
            CodecError::SizeMismatch {
                expected: 4,
                actual: 5
            }
        );
    }

    #[test]
    fn test_fix_size_truncates_remainder_decoding() {
        let codec = FixSizeCodec::new(2, Bytes);
        let (value, next) = codec.decode(&[1, 2, 3, 4], 0).unwrap();
        assert_eq!(value, vec![1, 2]);
        assert_eq!(next, 2);
    }

    #[test]
    fn test_size_prefix_frames_variable_payload() {
        let codec = SizePrefixCodec::new(Prefix::U16, Utf8);
        let bytes = encode(&codec, &"hi".to_string()).unwrap();
        assert_eq!(bytes, vec![2, 0, b'h', b'i']);
        assert_eq!(decode(&codec, &bytes).unwrap(), "hi");
    }

    #[test]
    fn test_size_prefix_bounds_inner_decoder() {
        // remainder bytes stop at the declared window, not the buffer end
        let codec = SizePrefixCodec::new(Prefix::U8, Bytes);
        let (value, next) = codec.decode(&[2, 7, 8, 9], 0).unwrap();
        assert_eq!(value, vec![7, 8]);
        assert_eq!(next, 3);
    }

    #[test]
    fn test_combine_checks_size_modes() {
        assert!(combine(U16, U16).is_ok());
        let err = combine(U16, ShortU16).unwrap_err();
        assert_eq!(err, CodecError::SizeModeMismatch);
    }

    #[test]
    fn test_combined_codec_round_trip() {
        let codec = combine(U32, U32).unwrap();
        let bytes = encode(&codec, &42).unwrap();
        assert_eq!(decode(&codec, &bytes).unwrap(), 42u32);
    }
}
