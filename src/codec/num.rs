//! Number codecs: little-endian integers, the Solana compact-u16 and the
//! length prefixes built from them.

use super::core::{CodecSize, Decoder, Encoder, SizeMode};
use super::error::CodecError;

macro_rules! number_codec {
    ($(#[$doc:meta])* $name:ident, $ty:ty) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl CodecSize for $name {
            fn size_mode(&self) -> SizeMode {
                SizeMode::Fixed(std::mem::size_of::<$ty>())
            }
        }

        impl Encoder<$ty> for $name {
            fn encoded_size(&self, _value: &$ty) -> usize {
                std::mem::size_of::<$ty>()
            }

            fn encode(&self, value: &$ty, out: &mut Vec<u8>) -> Result<(), CodecError> {
                out.extend_from_slice(&value.to_le_bytes());
                Ok(())
            }
        }

        impl Decoder<$ty> for $name {
            fn decode(&self, bytes: &[u8], offset: usize) -> Result<($ty, usize), CodecError> {
                const WIDTH: usize = std::mem::size_of::<$ty>();
                let slice = bytes
                    .get(offset..offset + WIDTH)
                    .ok_or_else(|| CodecError::end_of_buffer(offset, WIDTH, bytes.len()))?;
                let mut buf = [0u8; WIDTH];
                buf.copy_from_slice(slice);
                Ok((<$ty>::from_le_bytes(buf), offset + WIDTH))
            }
        }
    };
}

number_codec!(
    /// Codec for `u8` values.
    U8,
    u8
);
number_codec!(
    /// Codec for little-endian `u16` values.
    U16,
    u16
);
number_codec!(
    /// Codec for little-endian `u32` values.
    U32,
    u32
);
number_codec!(
    /// Codec for little-endian `u64` values.
    U64,
    u64
);
number_codec!(
    /// Codec for `i8` values.
    I8,
    i8
);
number_codec!(
    /// Codec for little-endian `i16` values.
    I16,
    i16
);
number_codec!(
    /// Codec for little-endian `i32` values.
    I32,
    i32
);
number_codec!(
    /// Codec for little-endian `i64` values.
    I64,
    i64
);

/// The Solana compact-u16: one to three bytes, seven value bits per byte,
/// high bit signalling continuation.
///
/// Decoding is strict: a non-minimal encoding (a terminating zero
/// continuation byte) or a value above `u16::MAX` is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShortU16;

impl CodecSize for ShortU16 {
    fn size_mode(&self) -> SizeMode {
        SizeMode::Variable
    }
}

impl Encoder<u16> for ShortU16 {
    fn encoded_size(&self, value: &u16) -> usize {
        match *value {
            0..=0x7f => 1,
            0x80..=0x3fff => 2,
            _ => 3,
        }
    }

    fn encode(&self, value: &u16, out: &mut Vec<u8>) -> Result<(), CodecError> {
        let mut rem = *value;
        loop {
            let byte = (rem & 0x7f) as u8;
            rem >>= 7;
            if rem == 0 {
                out.push(byte);
                return Ok(());
            }
            out.push(byte | 0x80);
        }
    }
}

impl Decoder<u16> for ShortU16 {
    fn decode(&self, bytes: &[u8], offset: usize) -> Result<(u16, usize), CodecError> {
        let mut value: u32 = 0;
        for n in 0..3 {
            let byte = *bytes
                .get(offset + n)
                .ok_or_else(|| CodecError::end_of_buffer(offset + n, 1, bytes.len()))?;
            if n == 2 && byte & 0x80 != 0 {
                return Err(CodecError::InvalidCompactU16 { offset });
            }
            value |= u32::from(byte & 0x7f) << (7 * n);
            if byte & 0x80 == 0 {
                // a trailing zero byte would alias a shorter encoding
                if n > 0 && byte == 0 {
                    return Err(CodecError::InvalidCompactU16 { offset });
                }
                if value > u32::from(u16::MAX) {
                    return Err(CodecError::InvalidCompactU16 { offset });
                }
                return Ok((value as u16, offset + n + 1));
            }
        }
        Err(CodecError::InvalidCompactU16 { offset })
    }
}

/// Length and count prefixes used by collection codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    U8,
    U16,
    U32,
    /// Solana compact-u16, the shortvec count encoding.
    ShortU16,
}

impl Prefix {
    /// Largest count this prefix can carry.
    pub fn max(&self) -> u64 {
        match self {
            Prefix::U8 => u8::MAX as u64,
            Prefix::U16 | Prefix::ShortU16 => u16::MAX as u64,
            Prefix::U32 => u32::MAX as u64,
        }
    }

    pub fn size_mode(&self) -> SizeMode {
        match self {
            Prefix::U8 => SizeMode::Fixed(1),
            Prefix::U16 => SizeMode::Fixed(2),
            Prefix::U32 => SizeMode::Fixed(4),
            Prefix::ShortU16 => SizeMode::Variable,
        }
    }

    /// Bytes the prefix occupies when carrying `len`.
    pub fn encoded_len_size(&self, len: usize) -> usize {
        match self {
            Prefix::U8 => 1,
            Prefix::U16 => 2,
            Prefix::U32 => 4,
            Prefix::ShortU16 => {
                ShortU16.encoded_size(&u16::try_from(len).unwrap_or(u16::MAX))
            }
        }
    }

    /// Writes `len`, failing when it exceeds the prefix range.
    pub fn encode_len(&self, len: usize, out: &mut Vec<u8>) -> Result<(), CodecError> {
        let value = len as u64;
        if value > self.max() {
            return Err(CodecError::NumberOutOfRange {
                value,
                max: self.max(),
            });
        }
        match self {
            Prefix::U8 => U8.encode(&(len as u8), out),
            Prefix::U16 => U16.encode(&(len as u16), out),
            Prefix::U32 => U32.encode(&(len as u32), out),
            Prefix::ShortU16 => ShortU16.encode(&(len as u16), out),
        }
    }

    /// Reads a count, returning it with the new offset.
    pub fn decode_len(&self, bytes: &[u8], offset: usize) -> Result<(usize, usize), CodecError> {
        match self {
            Prefix::U8 => {
                let (value, next) = U8.decode(bytes, offset)?;
                Ok((value as usize, next))
            }
            Prefix::U16 => {
                let (value, next) = U16.decode(bytes, offset)?;
                Ok((value as usize, next))
            }
            Prefix::U32 => {
                let (value, next) = U32.decode(bytes, offset)?;
                Ok((value as usize, next))
            }
            Prefix::ShortU16 => {
                let (value, next) = ShortU16.decode(bytes, offset)?;
                Ok((value as usize, next))
            }
        }
    }
}
