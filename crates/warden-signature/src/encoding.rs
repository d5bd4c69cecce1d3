//! Signature text encodings
//!
//! Credential-bound signatures travel as standard base64, federated identity
//! signatures as `0x`-prefixed hex. Decoding here is only an early-reject
//! filter: a well-formed string says nothing about cryptographic validity,
//! which is always left to the back-end.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use warden_core::types::{EncodedSignature, SignerKind};

/// Text encoding used by a signer kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureEncoding {
    /// Standard alphabet base64 with padding
    Base64,
    /// Lowercase or uppercase hex behind a `0x` prefix
    PrefixedHex,
}

impl SignatureEncoding {
    /// Encoding used by `kind`
    pub fn for_kind(kind: SignerKind) -> Self {
        match kind {
            SignerKind::CredentialBound => SignatureEncoding::Base64,
            SignerKind::FederatedIdentity => SignatureEncoding::PrefixedHex,
        }
    }

    /// Decode, or `None` when malformed or empty
    pub fn decode(&self, signature: &EncodedSignature) -> Option<Vec<u8>> {
        let text = signature.as_str();
        let bytes = match self {
            SignatureEncoding::Base64 => STANDARD.decode(text).ok()?,
            SignatureEncoding::PrefixedHex => {
                let digits = text.strip_prefix("0x")?;
                hex::decode(digits).ok()?
            }
        };
        if bytes.is_empty() {
            return None;
        }
        Some(bytes)
    }

    /// Encode raw signature bytes
    pub fn encode(&self, bytes: &[u8]) -> EncodedSignature {
        match self {
            SignatureEncoding::Base64 => EncodedSignature::new(STANDARD.encode(bytes)),
            SignatureEncoding::PrefixedHex => {
                EncodedSignature::new(format!("0x{}", hex::encode(bytes)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_accepts_standard_alphabet_only() {
        let enc = SignatureEncoding::Base64;
        let encoded = enc.encode(&[0xfb, 0xff, 0x01]);
        assert_eq!(encoded.as_str(), "+/8B");
        assert_eq!(enc.decode(&encoded), Some(vec![0xfb, 0xff, 0x01]));
        assert_eq!(enc.decode(&EncodedSignature::new("-_8B")), None);
        assert_eq!(enc.decode(&EncodedSignature::new("not base64!")), None);
        assert_eq!(enc.decode(&EncodedSignature::new("")), None);
    }

    #[test]
    fn hex_requires_prefix() {
        let enc = SignatureEncoding::PrefixedHex;
        assert_eq!(enc.encode(&[0xab, 0x01]).as_str(), "0xab01");
        assert_eq!(enc.decode(&EncodedSignature::new("0xAB01")), Some(vec![0xab, 0x01]));
        assert_eq!(enc.decode(&EncodedSignature::new("ab01")), None);
        assert_eq!(enc.decode(&EncodedSignature::new("0xabc")), None);
        assert_eq!(enc.decode(&EncodedSignature::new("0x")), None);
    }

    #[test]
    fn encoding_follows_kind() {
        assert_eq!(
            SignatureEncoding::for_kind(SignerKind::CredentialBound),
            SignatureEncoding::Base64
        );
        assert_eq!(
            SignatureEncoding::for_kind(SignerKind::FederatedIdentity),
            SignatureEncoding::PrefixedHex
        );
    }
}
