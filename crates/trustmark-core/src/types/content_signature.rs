//! Content-signature verification records.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TrustError};
use crate::types::certificate::KeyAlgorithm;

/// Type tag carried by content-signature records.
pub const CONTENT_SIGNATURE_TYPE: &str = "contentsignature";

/// Prefix bound to every payload before signing.
pub const CONTENT_SIGNATURE_PREFIX: &[u8] = b"Content-Signature:\x00";

/// A signature to check, as returned by the signing service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSignature {
    /// Correlation reference
    #[serde(rename = "Ref", alias = "ref")]
    pub reference: String,
    /// Record type, always `contentsignature`
    #[serde(rename = "Type", alias = "type")]
    pub kind: String,
    /// Signature scheme, e.g. `p384ecdsa`
    #[serde(rename = "Mode", alias = "mode")]
    pub mode: String,
    /// Identifier of the signer that produced the record
    #[serde(rename = "SignerID", alias = "signer_id")]
    pub signer_id: String,
    /// Base64 DER `SubjectPublicKeyInfo` of the signing key (may be empty)
    #[serde(rename = "PublicKey", alias = "public_key", default)]
    pub public_key: String,
    /// Base64url (no padding) fixed-width `r || s`
    #[serde(rename = "Signature", alias = "signature")]
    pub signature: String,
    /// Location of the PEM certificate chain
    #[serde(rename = "X5U", alias = "x5u")]
    pub x5u: String,
}

impl ContentSignature {
    /// Decode the signature field.
    pub fn decode_signature(&self) -> Result<Vec<u8>> {
        URL_SAFE_NO_PAD
            .decode(self.signature.trim())
            .map_err(|e| TrustError::parse("content signature", e))
    }

    /// Decode the public key field; `None` when the record carries no key.
    pub fn decode_public_key(&self) -> Result<Option<Vec<u8>>> {
        if self.public_key.is_empty() {
            return Ok(None);
        }
        STANDARD
            .decode(self.public_key.trim())
            .map(Some)
            .map_err(|e| TrustError::parse("content signature public key", e))
    }

    /// The scheme named by `mode`.
    pub fn parsed_mode(&self) -> Result<ContentSignatureMode> {
        self.mode.parse()
    }
}

/// Message that content signatures are computed over.
#[must_use]
pub fn signed_message(payload: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(CONTENT_SIGNATURE_PREFIX.len() + payload.len());
    message.extend_from_slice(CONTENT_SIGNATURE_PREFIX);
    message.extend_from_slice(payload);
    message
}

/// Supported content-signature schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentSignatureMode {
    /// ECDSA P-256 with SHA-256
    P256Ecdsa,
    /// ECDSA P-384 with SHA-384
    P384Ecdsa,
}

impl ContentSignatureMode {
    /// Wire name of the mode.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::P256Ecdsa => "p256ecdsa",
            Self::P384Ecdsa => "p384ecdsa",
        }
    }

    /// Byte length of a fixed-width `r || s` signature.
    pub const fn signature_len(self) -> usize {
        match self {
            Self::P256Ecdsa => 64,
            Self::P384Ecdsa => 96,
        }
    }

    /// Key algorithm the end-entity certificate must carry.
    pub const fn key_algorithm(self) -> KeyAlgorithm {
        match self {
            Self::P256Ecdsa => KeyAlgorithm::EcdsaP256,
            Self::P384Ecdsa => KeyAlgorithm::EcdsaP384,
        }
    }
}

impl FromStr for ContentSignatureMode {
    type Err = TrustError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "p256ecdsa" => Ok(Self::P256Ecdsa),
            "p384ecdsa" => Ok(Self::P384Ecdsa),
            other => Err(TrustError::parse(
                "content signature mode",
                format!("unsupported mode {other:?}"),
            )),
        }
    }
}

impl fmt::Display for ContentSignatureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
