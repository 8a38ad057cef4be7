//! Raw byte and text codecs.

use super::core::{CodecSize, Decoder, Encoder, SizeMode};
use super::error::CodecError;

/// Codec for a fixed `[u8; N]` block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedBytes<const N: usize>;

impl<const N: usize> CodecSize for FixedBytes<N> {
    fn size_mode(&self) -> SizeMode {
        SizeMode::Fixed(N)
    }
}

impl<const N: usize> Encoder<[u8; N]> for FixedBytes<N> {
    fn encoded_size(&self, _value: &[u8; N]) -> usize {
        N
    }

    fn encode(&self, value: &[u8; N], out: &mut Vec<u8>) -> Result<(), CodecError> {
        out.extend_from_slice(value);
        Ok(())
    }
}

impl<const N: usize> Decoder<[u8; N]> for FixedBytes<N> {
    fn decode(&self, bytes: &[u8], offset: usize) -> Result<([u8; N], usize), CodecError> {
        let slice = bytes
            .get(offset..offset + N)
            .ok_or_else(|| CodecError::end_of_buffer(offset, N, bytes.len()))?;
        let mut buf = [0u8; N];
        buf.copy_from_slice(slice);
        Ok((buf, offset + N))
    }
}

/// Codec for the remaining bytes of the buffer, unframed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bytes;

impl CodecSize for Bytes {
    fn size_mode(&self) -> SizeMode {
        SizeMode::Variable
    }
}

impl Encoder<Vec<u8>> for Bytes {
    fn encoded_size(&self, value: &Vec<u8>) -> usize {
        value.len()
    }

    fn encode(&self, value: &Vec<u8>, out: &mut Vec<u8>) -> Result<(), CodecError> {
        out.extend_from_slice(value);
        Ok(())
    }
}

impl Decoder<Vec<u8>> for Bytes {
    fn decode(&self, bytes: &[u8], offset: usize) -> Result<(Vec<u8>, usize), CodecError> {
        let slice = bytes
            .get(offset..)
            .ok_or_else(|| CodecError::end_of_buffer(offset, 0, bytes.len()))?;
        Ok((slice.to_vec(), bytes.len()))
    }
}

/// Codec for UTF-8 text occupying the rest of the buffer.
///
/// Frame it with [`SizePrefixCodec`](super::SizePrefixCodec) or
/// [`FixSizeCodec`](super::FixSizeCodec) when something follows it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Utf8;

impl CodecSize for Utf8 {
    fn size_mode(&self) -> SizeMode {
        SizeMode::Variable
    }
}

impl Encoder<String> for Utf8 {
    fn encoded_size(&self, value: &String) -> usize {
        value.len()
    }

    fn encode(&self, value: &String, out: &mut Vec<u8>) -> Result<(), CodecError> {
        out.extend_from_slice(value.as_bytes());
        Ok(())
    }
}

impl Decoder<String> for Utf8 {
    fn decode(&self, bytes: &[u8], offset: usize) -> Result<(String, usize), CodecError> {
        let slice = bytes
            .get(offset..)
            .ok_or_else(|| CodecError::end_of_buffer(offset, 0, bytes.len()))?;
        match std::str::from_utf8(slice) {
            Ok(text) => Ok((text.to_owned(), bytes.len())),
            Err(err) => Err(CodecError::InvalidUtf8 {
                offset: offset + err.valid_up_to(),
            }),
        }
    }
}
