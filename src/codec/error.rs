//! Codec error type.

use thiserror::Error;

/// Errors produced while encoding or decoding binary data.
///
/// Every failure is reported as a value; codecs never panic on malformed
/// input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer ended before the full value could be read.
    #[error("unexpected end of buffer at offset {offset}: needed {needed} bytes, {remaining} remain")]
    UnexpectedEndOfBuffer {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    /// A value or buffer did not occupy the expected number of bytes.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    /// Paired encoder and decoder halves disagree on their size mode.
    #[error("encoder and decoder size modes do not match")]
    SizeModeMismatch,
    /// A union tag or option prefix did not select a known variant.
    #[error("invalid discriminator {discriminator} at offset {offset} ({num_variants} variants)")]
    InvalidDiscriminator {
        discriminator: u64,
        offset: usize,
        num_variants: usize,
    },
    /// A constant byte region did not hold its expected contents.
    #[error("constant bytes at offset {offset} do not match the expected value")]
    InvalidConstant { offset: usize },
    /// A length or count does not fit the prefix carrying it.
    #[error("number {value} out of range, maximum {max}")]
    NumberOutOfRange { value: u64, max: u64 },
    /// Text bytes were not valid UTF-8.
    #[error("invalid utf-8 at offset {offset}")]
    InvalidUtf8 { offset: usize },
    /// A compact-u16 was overlong, non-minimal or out of range.
    #[error("invalid compact-u16 at offset {offset}")]
    InvalidCompactU16 { offset: usize },
    /// The operation only works with a fixed-size codec.
    #[error("a fixed-size codec is required here")]
    ExpectedFixedSize,
    /// A bit array value had the wrong number of flags.
    #[error("bit array expects {expected_bits} flags, got {actual_bits}")]
    InvalidBitArrayLength {
        expected_bits: usize,
        actual_bits: usize,
    },
}

impl CodecError {
    /// Shorthand for an out-of-bounds read at `offset` needing `needed`
    /// bytes from a buffer of `len`.
    pub(crate) fn end_of_buffer(offset: usize, needed: usize, len: usize) -> Self {
        CodecError::UnexpectedEndOfBuffer {
            offset,
            needed,
            remaining: len.saturating_sub(offset),
        }
    }
}
