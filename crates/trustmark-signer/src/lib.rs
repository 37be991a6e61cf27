//! Detached-signature producers.
//!
//! Every signer format implements [`Signer`]: it validates its configuration
//! at construction, signs payloads, and parses its own transport encoding
//! back into a [`Signature`]. [`AnySigner`] selects the format from the
//! configuration's type tag.
//!
//! ```rust,ignore
//! use trustmark_signer::{AnySigner, Signature};
//!
//! let signer = AnySigner::from_config(&config)?;
//! let encoded = signer.sign_data(b"classes.dex")?.marshal()?;
//! let parsed = signer.unmarshal(&encoded, b"classes.dex")?;
//! parsed.verify(signer.certificate())?;
//! ```

mod apk;
mod key;

pub use apk::{ApkSigner, Pkcs7Signature, PKCS7_TAG};
pub use key::PrivateKey;

use std::fmt;
use trustmark_core::{Certificate, Result, SignerConfig, TrustError};

/// A signature produced by a [`Signer`].
pub trait Signature: fmt::Display {
    /// Transport encoding of the signature.
    fn marshal(&self) -> Result<String>;

    /// Check the signature over its content against `certificate`.
    fn verify(&self, certificate: &Certificate) -> Result<()>;
}

/// One signer format, bound to a single key and certificate.
pub trait Signer: Sized {
    /// Signature type this format produces.
    type Signature: Signature;

    /// Format tag selecting this signer in a [`SignerConfig`].
    const TYPE: &'static str;

    /// Validate `config` and build the signer.
    fn from_config(config: &SignerConfig) -> Result<Self>;

    /// Signer identifier.
    fn id(&self) -> &str;

    /// The configuration the signer was built from.
    fn config(&self) -> SignerConfig;

    /// Sign `data`.
    fn sign_data(&self, data: &[u8]) -> Result<Self::Signature>;

    /// Parse a marshaled signature and attach the content it covers.
    fn unmarshal(encoded: &str, content: &[u8]) -> Result<Self::Signature>;
}

/// Any supported signer, keyed by format tag.
#[derive(Debug)]
pub enum AnySigner {
    /// PKCS#7 detached signatures (`apk`)
    Apk(ApkSigner),
}

/// A signature from any supported signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnySignature {
    /// PKCS#7 detached signature
    Apk(Pkcs7Signature),
}

impl AnySigner {
    /// Build the signer named by `config.kind`.
    pub fn from_config(config: &SignerConfig) -> Result<Self> {
        match config.kind.as_str() {
            kind if kind == ApkSigner::TYPE => ApkSigner::from_config(config).map(Self::Apk),
            other => Err(TrustError::config(
                other,
                "type",
                format!("unknown signer type {other:?}"),
            )),
        }
    }

    /// Format tag of the signer.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Apk(_) => ApkSigner::TYPE,
        }
    }

    /// Signer identifier.
    pub fn id(&self) -> &str {
        match self {
            Self::Apk(signer) => signer.id(),
        }
    }

    /// The configuration the signer was built from.
    pub fn config(&self) -> SignerConfig {
        match self {
            Self::Apk(signer) => signer.config(),
        }
    }

    /// The signer's certificate.
    pub const fn certificate(&self) -> &Certificate {
        match self {
            Self::Apk(signer) => signer.certificate(),
        }
    }

    /// Sign `data`.
    pub fn sign_data(&self, data: &[u8]) -> Result<AnySignature> {
        match self {
            Self::Apk(signer) => signer.sign_data(data).map(AnySignature::Apk),
        }
    }

    /// Parse a signature in this signer's format.
    pub fn unmarshal(&self, encoded: &str, content: &[u8]) -> Result<AnySignature> {
        match self {
            Self::Apk(_) => ApkSigner::unmarshal(encoded, content).map(AnySignature::Apk),
        }
    }
}

impl Signature for AnySignature {
    fn marshal(&self) -> Result<String> {
        match self {
            Self::Apk(sig) => sig.marshal(),
        }
    }

    fn verify(&self, certificate: &Certificate) -> Result<()> {
        match self {
            Self::Apk(sig) => sig.verify(certificate),
        }
    }
}

impl fmt::Display for AnySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apk(sig) => fmt::Display::fmt(sig, f),
        }
    }
}
