//! Off-chain messages: human-readable content signed outside any block.
//!
//! The version 0 wire form opens with a 16-byte signing domain that no
//! valid transaction can begin with, so wallets can never be tricked into
//! signing a transaction disguised as text. The domain is followed by the
//! version, a 32-byte application domain, the content format, the
//! signatory list and the length-prefixed content.

mod error;

pub use error::OffchainMessageError;

use ed25519_dalek::{Signature as Ed25519Signature, VerifyingKey};
use nonempty::NonEmpty;

use crate::codec::{
    ArrayCodec, CodecError, Decoder, Encoder, FixedBytes, HiddenPrefixCodec, Prefix, Utf8, U16, U8,
};
use crate::types::{address_codec, Address, Signature};

/// First bytes of every off-chain message.
pub const SIGNING_DOMAIN: [u8; 16] = *b"\xffsolana offchain";

const VERSION: u8 = 0;
const MAX_SIGNATORIES: usize = u8::MAX as usize;

/// Content encoding of an off-chain message, from most to least
/// restrictive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageFormat {
    /// Printable ASCII (0x20..=0x7e) plus newline, hardware-wallet safe.
    RestrictedAscii = 0,
    /// UTF-8 within the ledger display budget.
    LimitedUtf8 = 1,
    /// UTF-8 up to the u16 length prefix.
    ExtendedUtf8 = 2,
}

impl MessageFormat {
    /// Largest content, in bytes, the format allows.
    pub fn max_message_len(self) -> usize {
        match self {
            MessageFormat::RestrictedAscii | MessageFormat::LimitedUtf8 => 1232,
            MessageFormat::ExtendedUtf8 => usize::from(u16::MAX),
        }
    }

    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(MessageFormat::RestrictedAscii),
            1 => Some(MessageFormat::LimitedUtf8),
            2 => Some(MessageFormat::ExtendedUtf8),
            _ => None,
        }
    }
}

fn is_restricted_ascii(character: char) -> bool {
    matches!(character, '\x20'..='\x7e' | '\n')
}

/// The narrowest format that can carry `message`.
fn infer_format(message: &str) -> MessageFormat {
    if message.len() <= MessageFormat::RestrictedAscii.max_message_len()
        && message.chars().all(is_restricted_ascii)
    {
        MessageFormat::RestrictedAscii
    } else if message.len() <= MessageFormat::LimitedUtf8.max_message_len() {
        MessageFormat::LimitedUtf8
    } else {
        MessageFormat::ExtendedUtf8
    }
}

fn validate_message(format: MessageFormat, message: &str) -> Result<(), OffchainMessageError> {
    if message.is_empty() {
        return Err(OffchainMessageError::EmptyMessage);
    }
    let length = message.len();
    let max = format.max_message_len();
    if length > max {
        return Err(OffchainMessageError::MaximumLengthExceeded { length, max });
    }
    if format == MessageFormat::RestrictedAscii {
        if let Some((position, character)) = message
            .chars()
            .enumerate()
            .find(|(_, character)| !is_restricted_ascii(*character))
        {
            return Err(OffchainMessageError::RestrictedAsciiCharacterOutOfRange {
                character,
                position,
            });
        }
    }
    Ok(())
}

/// A version 0 off-chain message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffchainMessage {
    application_domain: [u8; 32],
    format: MessageFormat,
    signatories: NonEmpty<Address>,
    message: String,
}

impl OffchainMessage {
    /// Builds a message in the narrowest format its content fits.
    pub fn new(
        application_domain: [u8; 32],
        signatories: NonEmpty<Address>,
        message: impl Into<String>,
    ) -> Result<Self, OffchainMessageError> {
        let message = message.into();
        let format = infer_format(&message);
        Self::new_with_format(format, application_domain, signatories, message)
    }

    /// Builds a message in a caller-chosen format, validating the content
    /// against it.
    pub fn new_with_format(
        format: MessageFormat,
        application_domain: [u8; 32],
        signatories: NonEmpty<Address>,
        message: impl Into<String>,
    ) -> Result<Self, OffchainMessageError> {
        let message = message.into();
        if signatories.len() > MAX_SIGNATORIES {
            return Err(OffchainMessageError::TooManySignatories {
                count: signatories.len(),
            });
        }
        validate_message(format, &message)?;
        Ok(Self {
            application_domain,
            format,
            signatories,
            message,
        })
    }

    pub fn application_domain(&self) -> &[u8; 32] {
        &self.application_domain
    }

    pub fn format(&self) -> MessageFormat {
        self.format
    }

    pub fn signatories(&self) -> &NonEmpty<Address> {
        &self.signatories
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Serializes the message into the bytes signatories sign.
    pub fn to_bytes(&self) -> Result<Vec<u8>, OffchainMessageError> {
        let mut out = Vec::new();
        HiddenPrefixCodec::new(SIGNING_DOMAIN, U8).encode(&VERSION, &mut out)?;
        FixedBytes::<32>.encode(&self.application_domain, &mut out)?;
        U8.encode(&(self.format as u8), &mut out)?;
        let signatories: Vec<Address> = self.signatories.iter().copied().collect();
        ArrayCodec::prefixed(address_codec(), Prefix::U8).encode(&signatories, &mut out)?;
        U16.encode(&(self.message.len() as u16), &mut out)?;
        Utf8.encode(&self.message, &mut out)?;
        Ok(out)
    }

    /// Parses and validates an off-chain message.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, OffchainMessageError> {
        let (version, offset) = HiddenPrefixCodec::new(SIGNING_DOMAIN, U8)
            .decode(bytes, 0)
            .map_err(|error| match error {
                CodecError::InvalidConstant { .. } => OffchainMessageError::InvalidSigningDomain,
                other => OffchainMessageError::Codec(other),
            })?;
        if version != VERSION {
            return Err(OffchainMessageError::UnsupportedVersion { version });
        }
        let (application_domain, offset) = FixedBytes::<32>.decode(bytes, offset)?;
        let (format_byte, offset) = U8.decode(bytes, offset)?;
        let format = MessageFormat::from_byte(format_byte)
            .ok_or(OffchainMessageError::UnsupportedFormat {
                format: format_byte,
            })?;
        let (signatories, offset) =
            ArrayCodec::prefixed(address_codec(), Prefix::U8).decode(bytes, offset)?;
        let signatories =
            NonEmpty::from_vec(signatories).ok_or(OffchainMessageError::NoRequiredSignatories)?;
        let (declared, offset) = U16.decode(bytes, offset)?;
        let declared = usize::from(declared);
        let actual = bytes.len() - offset;
        if declared != actual {
            return Err(OffchainMessageError::MessageLengthMismatch { declared, actual });
        }
        let (message, _) = Utf8.decode(bytes, offset)?;
        validate_message(format, &message)?;
        Ok(Self {
            application_domain,
            format,
            signatories,
            message,
        })
    }
}

/// One signatory and its signature, once provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffchainSignatureSlot {
    pub address: Address,
    pub signature: Option<Signature>,
}

/// An off-chain message with the signatures collected over its bytes,
/// ordered exactly as the signatory list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedOffchainMessage {
    message_bytes: Vec<u8>,
    signatures: Vec<OffchainSignatureSlot>,
}

impl SignedOffchainMessage {
    /// Builds an unsigned envelope, deriving the slots from the message's
    /// signatory list.
    pub fn new_unsigned(message_bytes: Vec<u8>) -> Result<Self, OffchainMessageError> {
        let message = OffchainMessage::from_bytes(&message_bytes)?;
        let signatures = message
            .signatories()
            .iter()
            .map(|address| OffchainSignatureSlot {
                address: *address,
                signature: None,
            })
            .collect();
        Ok(Self {
            message_bytes,
            signatures,
        })
    }

    /// The exact bytes signatories sign.
    pub fn message_bytes(&self) -> &[u8] {
        &self.message_bytes
    }

    pub fn signatures(&self) -> &[OffchainSignatureSlot] {
        &self.signatures
    }

    /// Returns a copy with `entries` merged into the signature slots.
    pub fn with_signatures(
        &self,
        entries: impl IntoIterator<Item = (Address, Signature)>,
    ) -> Result<Self, OffchainMessageError> {
        let mut updated = self.clone();
        for (address, signature) in entries {
            let slot = updated
                .signatures
                .iter_mut()
                .find(|slot| slot.address == address)
                .ok_or(OffchainMessageError::UnknownSignatory { address })?;
            slot.signature = Some(signature);
        }
        Ok(updated)
    }

    pub fn is_fully_signed(&self) -> bool {
        self.signatures.iter().all(|slot| slot.signature.is_some())
    }

    pub fn missing_signatories(&self) -> Vec<Address> {
        self.signatures
            .iter()
            .filter(|slot| slot.signature.is_none())
            .map(|slot| slot.address)
            .collect()
    }

    pub fn assert_fully_signed(&self) -> Result<(), OffchainMessageError> {
        let addresses = self.missing_signatories();
        if addresses.is_empty() {
            Ok(())
        } else {
            Err(OffchainMessageError::MissingSignatures { addresses })
        }
    }

    /// Strictly verifies every present signature against its signatory's
    /// public key. Missing signatures are not an error here.
    pub fn verify(&self) -> Result<(), OffchainMessageError> {
        for slot in &self.signatures {
            let Some(signature) = slot.signature else {
                continue;
            };
            let invalid = || OffchainMessageError::InvalidSignature {
                address: slot.address,
            };
            let key = VerifyingKey::from_bytes(slot.address.as_bytes()).map_err(|_| invalid())?;
            let signature = Ed25519Signature::from_bytes(signature.as_bytes());
            key.verify_strict(&self.message_bytes, &signature)
                .map_err(|_| invalid())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::KeypairSigner;

    fn address(byte: u8) -> Address {
        Address::new([byte; 32])
    }

    fn one_signatory() -> NonEmpty<Address> {
        NonEmpty::new(address(1))
    }

    #[test]
    fn test_format_inference() {
        let message = OffchainMessage::new([0u8; 32], one_signatory(), "hello\nworld").unwrap();
        assert_eq!(message.format(), MessageFormat::RestrictedAscii);

        let message = OffchainMessage::new([0u8; 32], one_signatory(), "héllo").unwrap();
        assert_eq!(message.format(), MessageFormat::LimitedUtf8);

        let long_ascii = "a".repeat(1233);
        let message = OffchainMessage::new([0u8; 32], one_signatory(), long_ascii).unwrap();
        assert_eq!(message.format(), MessageFormat::ExtendedUtf8);
    }

    #[test]
    fn test_forced_format_validates_content() {
        let err = OffchainMessage::new_with_format(
            MessageFormat::RestrictedAscii,
            [0u8; 32],
            one_signatory(),
            "héllo",
        )
        .unwrap_err();
        assert_eq!(
            err,
            OffchainMessageError::RestrictedAsciiCharacterOutOfRange {
                character: 'é',
                position: 1
            }
        );
    }

    #[test]
    fn test_empty_message_rejected() {
        let err = OffchainMessage::new([0u8; 32], one_signatory(), "").unwrap_err();
        assert_eq!(err, OffchainMessageError::EmptyMessage);
    }

    #[test]
    fn test_length_limits_per_format() {
        let err = OffchainMessage::new_with_format(
            MessageFormat::LimitedUtf8,
            [0u8; 32],
            one_signatory(),
            "a".repeat(1233),
        )
        .unwrap_err();
        assert_eq!(
            err,
            OffchainMessageError::MaximumLengthExceeded {
                length: 1233,
                max: 1232
            }
        );

        let err = OffchainMessage::new([0u8; 32], one_signatory(), "a".repeat(65536)).unwrap_err();
        assert_eq!(
            err,
            OffchainMessageError::MaximumLengthExceeded {
                length: 65536,
                max: 65535
            }
        );
    }

    #[test]
    fn test_wire_layout() {
        let signatories = NonEmpty::from_vec(vec![address(1), address(2)]).unwrap();
        let message = OffchainMessage::new([7u8; 32], signatories, "hi").unwrap();
        let bytes = message.to_bytes().unwrap();
        assert_eq!(&bytes[..16], b"\xffsolana offchain");
        assert_eq!(bytes[16], 0); // version
        assert_eq!(&bytes[17..49], &[7u8; 32]);
        assert_eq!(bytes[49], 0); // restricted ascii
        assert_eq!(bytes[50], 2); // signatory count
        assert_eq!(&bytes[51..83], &[1u8; 32]);
        assert_eq!(&bytes[83..115], &[2u8; 32]);
        assert_eq!(&bytes[115..117], &[2, 0]); // length u16 LE
        assert_eq!(&bytes[117..], b"hi");
    }

    #[test]
    fn test_round_trip() {
        let signatories = NonEmpty::from_vec(vec![address(1), address(2)]).unwrap();
        let message = OffchainMessage::new([7u8; 32], signatories, "héllo wörld").unwrap();
        let bytes = message.to_bytes().unwrap();
        assert_eq!(OffchainMessage::from_bytes(&bytes).unwrap(), message);
    }

    #[test]
    fn test_decode_rejects_bad_domain() {
        let mut bytes = OffchainMessage::new([0u8; 32], one_signatory(), "hi")
            .unwrap()
            .to_bytes()
            .unwrap();
        bytes[0] = 0xfe;
        assert_eq!(
            OffchainMessage::from_bytes(&bytes).unwrap_err(),
            OffchainMessageError::InvalidSigningDomain
        );
    }

    #[test]
    fn test_decode_rejects_unknown_version_and_format() {
        let template = OffchainMessage::new([0u8; 32], one_signatory(), "hi")
            .unwrap()
            .to_bytes()
            .unwrap();

        let mut bytes = template.clone();
        bytes[16] = 1;
        assert_eq!(
            OffchainMessage::from_bytes(&bytes).unwrap_err(),
            OffchainMessageError::UnsupportedVersion { version: 1 }
        );

        let mut bytes = template;
        bytes[49] = 9;
        assert_eq!(
            OffchainMessage::from_bytes(&bytes).unwrap_err(),
            OffchainMessageError::UnsupportedFormat { format: 9 }
        );
    }

    #[test]
    fn test_decode_rejects_zero_signatories() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&SIGNING_DOMAIN);
        bytes.push(0); // version
        bytes.extend_from_slice(&[0u8; 32]);
        bytes.push(0); // format
        bytes.push(0); // signatory count
        bytes.extend_from_slice(&[2, 0]);
        bytes.extend_from_slice(b"hi");
        assert_eq!(
            OffchainMessage::from_bytes(&bytes).unwrap_err(),
            OffchainMessageError::NoRequiredSignatories
        );
    }

    #[test]
    fn test_decode_rejects_length_mismatch() {
        let mut bytes = OffchainMessage::new([0u8; 32], one_signatory(), "hi")
            .unwrap()
            .to_bytes()
            .unwrap();
        let len = bytes.len();
        bytes[len - 4] = 9; // low byte of the u16 length, before "hi"
        assert_eq!(
            OffchainMessage::from_bytes(&bytes).unwrap_err(),
            OffchainMessageError::MessageLengthMismatch {
                declared: 9,
                actual: 2
            }
        );
    }

    #[test]
    fn test_decode_validates_content_against_format() {
        let message = OffchainMessage::new([0u8; 32], one_signatory(), "héllo").unwrap();
        let mut bytes = message.to_bytes().unwrap();
        bytes[49] = 0; // claim restricted ascii over utf-8 content
        assert!(matches!(
            OffchainMessage::from_bytes(&bytes).unwrap_err(),
            OffchainMessageError::RestrictedAsciiCharacterOutOfRange { .. }
        ));
    }

    #[test]
    fn test_signed_envelope_slots_follow_signatory_order() {
        let signatories = NonEmpty::from_vec(vec![address(2), address(1)]).unwrap();
        let message = OffchainMessage::new([0u8; 32], signatories, "hi").unwrap();
        let signed = SignedOffchainMessage::new_unsigned(message.to_bytes().unwrap()).unwrap();
        assert_eq!(signed.signatures()[0].address, address(2));
        assert_eq!(signed.signatures()[1].address, address(1));
        assert_eq!(signed.missing_signatories(), vec![address(2), address(1)]);
    }

    #[test]
    fn test_with_signatures_rejects_unknown_signatory() {
        let message = OffchainMessage::new([0u8; 32], one_signatory(), "hi").unwrap();
        let signed = SignedOffchainMessage::new_unsigned(message.to_bytes().unwrap()).unwrap();
        let err = signed
            .with_signatures([(address(9), Signature::new([1u8; 64]))])
            .unwrap_err();
        assert_eq!(
            err,
            OffchainMessageError::UnknownSignatory {
                address: address(9)
            }
        );
    }

    #[test]
    fn test_verify_accepts_real_signature() {
        let signer = KeypairSigner::generate();
        let message = OffchainMessage::new(
            [0u8; 32],
            NonEmpty::new(signer.address()),
            "attest: all good",
        )
        .unwrap();
        let signed = SignedOffchainMessage::new_unsigned(message.to_bytes().unwrap()).unwrap();
        let signature = signer.sign_bytes(signed.message_bytes());
        let signed = signed
            .with_signatures([(signer.address(), signature)])
            .unwrap();
        assert!(signed.is_fully_signed());
        signed.verify().unwrap();
    }

    #[test]
    fn test_verify_rejects_tampered_signature() {
        let signer = KeypairSigner::generate();
        let message = OffchainMessage::new(
            [0u8; 32],
            NonEmpty::new(signer.address()),
            "attest: all good",
        )
        .unwrap();
        let signed = SignedOffchainMessage::new_unsigned(message.to_bytes().unwrap()).unwrap();
        let signature = signer.sign_bytes(b"different bytes");
        let signed = signed
            .with_signatures([(signer.address(), signature)])
            .unwrap();
        assert_eq!(
            signed.verify().unwrap_err(),
            OffchainMessageError::InvalidSignature {
                address: signer.address()
            }
        );
    }
}
