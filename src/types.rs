//! Core address, signature and hash value types.
//!
//! All three are thin newtypes over fixed byte arrays. They display and
//! parse as base58 strings, matching how Solana tooling renders them, and
//! serialize the same way through serde.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::codec::{transform, Codec, FixedBytes};

/// Errors from parsing a base58 string into a fixed-width value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseBase58Error {
    /// The string contains characters outside the base58 alphabet.
    #[error("invalid base58: {0}")]
    Invalid(#[from] bs58::decode::Error),
    /// The string decoded, but to the wrong number of bytes.
    #[error("decoded {actual} bytes, expected {expected}")]
    WrongLength { expected: usize, actual: usize },
}

fn decode_base58<const N: usize>(s: &str) -> Result<[u8; N], ParseBase58Error> {
    let decoded = bs58::decode(s).into_vec()?;
    let actual = decoded.len();
    decoded
        .try_into()
        .map_err(|_| ParseBase58Error::WrongLength { expected: N, actual })
}

macro_rules! base58_newtype {
    ($(#[$doc:meta])* $name:ident, $len:expr) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Length of the underlying byte array.
            pub const LEN: usize = $len;

            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub const fn to_bytes(self) -> [u8; $len] {
                self.0
            }

            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self([0u8; $len])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&bs58::encode(&self.0).into_string())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(self, f)
            }
        }

        impl FromStr for $name {
            type Err = ParseBase58Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_base58(s).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

base58_newtype!(
    /// A 32-byte account address, the public half of an ed25519 keypair.
    Address,
    32
);

base58_newtype!(
    /// A 64-byte ed25519 signature.
    Signature,
    64
);

base58_newtype!(
    /// A 32-byte hash anchoring a transaction lifetime: either a recent
    /// blockhash or a durable nonce value.
    Blockhash,
    32
);

impl Signature {
    /// Wire value standing in for a signature not yet collected.
    pub const PLACEHOLDER: Signature = Signature([0u8; 64]);

    pub fn is_placeholder(&self) -> bool {
        self.0 == [0u8; 64]
    }
}

/// Codec reading and writing an [`Address`] as its raw 32 bytes.
pub fn address_codec() -> impl Codec<Address> {
    transform(
        FixedBytes::<32>,
        |address: &Address| address.to_bytes(),
        |bytes: [u8; 32], _| Ok(Address::new(bytes)),
    )
}

/// Codec reading and writing a [`Blockhash`] as its raw 32 bytes.
pub fn blockhash_codec() -> impl Codec<Blockhash> {
    transform(
        FixedBytes::<32>,
        |hash: &Blockhash| hash.to_bytes(),
        |bytes: [u8; 32], _| Ok(Blockhash::new(bytes)),
    )
}

/// Codec reading and writing a [`Signature`] as its raw 64 bytes.
pub fn signature_codec() -> impl Codec<Signature> {
    transform(
        FixedBytes::<64>,
        |signature: &Signature| signature.to_bytes(),
        |bytes: [u8; 64], _| Ok(Signature::new(bytes)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode};

    #[test]
    fn test_address_base58_round_trip() {
        let address = Address::new([7u8; 32]);
        let text = address.to_string();
        let parsed: Address = text.parse().unwrap();
        assert_eq!(parsed, address);
    }

    #[test]
    fn test_all_zero_address_displays_as_ones() {
        let address = Address::default();
        assert_eq!(address.to_string(), "11111111111111111111111111111111");
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        let err = "abc".parse::<Address>().unwrap_err();
        assert!(matches!(
            err,
            ParseBase58Error::WrongLength { expected: 32, .. }
        ));
    }

    #[test]
    fn test_parse_rejects_invalid_characters() {
        // 0, I, O and l are outside the base58 alphabet
        let err = "0OIl".parse::<Address>().unwrap_err();
        assert!(matches!(err, ParseBase58Error::Invalid(_)));
    }

    #[test]
    fn test_serde_round_trip_as_base58_string() {
        let signature = Signature::new([3u8; 64]);
        let json = serde_json::to_string(&signature).unwrap();
        assert_eq!(json, format!("\"{signature}\""));
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, signature);
    }

    #[test]
    fn test_placeholder_signature() {
        assert!(Signature::PLACEHOLDER.is_placeholder());
        assert!(!Signature::new([1u8; 64]).is_placeholder());
    }

    #[test]
    fn test_address_codec_round_trip() {
        let codec = address_codec();
        let address = Address::new([42u8; 32]);
        let bytes = encode(&codec, &address).unwrap();
        assert_eq!(bytes, vec![42u8; 32]);
        assert_eq!(decode(&codec, &bytes).unwrap(), address);
    }
}
