//! Encoder, decoder and codec traits plus tuple composition.

use super::error::CodecError;

/// Whether a codec always produces the same number of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeMode {
    /// Every value encodes to exactly this many bytes.
    Fixed(usize),
    /// The encoded size depends on the value.
    Variable,
}

impl SizeMode {
    /// The byte size when fixed, `None` when variable.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            SizeMode::Fixed(size) => Some(*size),
            SizeMode::Variable => None,
        }
    }
}

/// Size reporting shared by encoders and decoders.
pub trait CodecSize {
    fn size_mode(&self) -> SizeMode;
}

/// Serializes values of `T` into bytes.
pub trait Encoder<T>: CodecSize {
    /// Exact number of bytes [`encode`](Encoder::encode) will append for
    /// `value`. For a fixed-size codec this equals the declared size for
    /// every value.
    fn encoded_size(&self, value: &T) -> usize;

    /// Appends the encoded form of `value` to `out`.
    fn encode(&self, value: &T, out: &mut Vec<u8>) -> Result<(), CodecError>;
}

/// Deserializes values of `T` from bytes.
pub trait Decoder<T>: CodecSize {
    /// Reads a value starting at `offset`, returning it together with the
    /// offset just past the consumed bytes.
    fn decode(&self, bytes: &[u8], offset: usize) -> Result<(T, usize), CodecError>;
}

/// A paired encoder and decoder for `T`.
///
/// Implemented automatically for anything that is both. Round-tripping is
/// the contract: decoding an encoded value yields the value back.
pub trait Codec<T>: Encoder<T> + Decoder<T> {}

impl<T, C: Encoder<T> + Decoder<T>> Codec<T> for C {}

/// Encodes `value` into a fresh buffer.
pub fn encode<T, C: Encoder<T> + ?Sized>(codec: &C, value: &T) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(codec.encoded_size(value));
    codec.encode(value, &mut out)?;
    Ok(out)
}

/// Decodes a value from `bytes`, requiring the whole buffer to be consumed.
pub fn decode<T, C: Decoder<T> + ?Sized>(codec: &C, bytes: &[u8]) -> Result<T, CodecError> {
    let (value, offset) = codec.decode(bytes, 0)?;
    if offset != bytes.len() {
        return Err(CodecError::SizeMismatch {
            expected: offset,
            actual: bytes.len(),
        });
    }
    Ok(value)
}

// Tuples of codecs encode and decode tuples of values field by field.
// Struct codecs are built by pairing a tuple with `transform`.
macro_rules! tuple_codec {
    ($(($idx:tt, $codec:ident, $value:ident)),+) => {
        impl<$($codec: CodecSize),+> CodecSize for ($($codec,)+) {
            fn size_mode(&self) -> SizeMode {
                let mut total = 0usize;
                $(
                    match self.$idx.size_mode() {
                        SizeMode::Fixed(size) => total += size,
                        SizeMode::Variable => return SizeMode::Variable,
                    }
                )+
                SizeMode::Fixed(total)
            }
        }

        impl<$($value,)+ $($codec: Encoder<$value>),+> Encoder<($($value,)+)> for ($($codec,)+) {
            fn encoded_size(&self, value: &($($value,)+)) -> usize {
                0 $(+ self.$idx.encoded_size(&value.$idx))+
            }

            fn encode(&self, value: &($($value,)+), out: &mut Vec<u8>) -> Result<(), CodecError> {
                $(self.$idx.encode(&value.$idx, out)?;)+
                Ok(())
            }
        }

        impl<$($value,)+ $($codec: Decoder<$value>),+> Decoder<($($value,)+)> for ($($codec,)+) {
            fn decode(&self, bytes: &[u8], offset: usize) -> Result<(($($value,)+), usize), CodecError> {
                let mut offset = offset;
                let value = ($(
                    {
                        let (field, next) = self.$idx.decode(bytes, offset)?;
                        offset = next;
                        field
                    },
                )+);
                Ok((value, offset))
            }
        }
    };
}

tuple_codec!((0, C0, T0), (1, C1, T1));
tuple_codec!((0, C0, T0), (1, C1, T1), (2, C2, T2));
tuple_codec!((0, C0, T0), (1, C1, T1), (2, C2, T2), (3, C3, T3));
tuple_codec!((0, C0, T0), (1, C1, T1), (2, C2, T2), (3, C3, T3), (4, C4, T4));
tuple_codec!(
    (0, C0, T0),
    (1, C1, T1),
    (2, C2, T2),
    (3, C3, T3),
    (4, C4, T4),
    (5, C5, T5)
);
