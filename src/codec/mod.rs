//! Composable binary codecs.
//!
//! A codec pairs an [`Encoder`] and a [`Decoder`] for one value type and
//! reports whether its wire form is fixed or variable sized. Leaf codecs
//! cover numbers, raw bytes and text; combinators build structs (tuples
//! plus [`transform`]), arrays, options, unions, bit arrays, constant
//! regions and size framing on top of them.
//!
//! Encoding a value and decoding the produced bytes always yields the
//! value back. Decoders never trust input: truncated buffers, bad
//! discriminators and malformed lengths all surface as [`CodecError`]s.

mod array;
mod bits;
mod bytes;
mod combinators;
mod core;
mod error;
mod num;
mod option;
mod union;

pub use array::{ArrayCodec, ArraySize};
pub use bits::BitArrayCodec;
pub use bytes::{Bytes, FixedBytes, Utf8};
pub use combinators::{
    combine, transform, CombinedCodec, FixSizeCodec, HiddenPrefixCodec, HiddenSuffixCodec,
    OffsetCodec, SizePrefixCodec, TransformCodec,
};
pub use self::core::{decode, encode, Codec, CodecSize, Decoder, Encoder, SizeMode};
pub use error::CodecError;
pub use num::{Prefix, ShortU16, I16, I32, I64, I8, U16, U32, U64, U8};
pub use option::{NoneValue, OptionCodec};
pub use union::UnionCodec;
