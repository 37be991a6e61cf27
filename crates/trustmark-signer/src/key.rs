//! PEM private keys backed by ring key pairs.

use ring::digest;
use ring::rand::SystemRandom;
use ring::signature::{
    EcdsaKeyPair, KeyPair as _, RsaKeyPair, ECDSA_P256_SHA256_ASN1_SIGNING,
    ECDSA_P384_SHA384_ASN1_SIGNING, RSA_PKCS1_SHA256,
};
use std::fmt;
use trustmark_core::{KeyAlgorithm, Result, TrustError};

const PKCS8_TAG: &str = "PRIVATE KEY";
const PKCS1_TAG: &str = "RSA PRIVATE KEY";

/// A signing key: RSA (PKCS#1 v1.5, SHA-256) or ECDSA on P-256 / P-384
/// with DER-encoded signatures.
pub enum PrivateKey {
    /// RSA key pair
    Rsa(RsaKeyPair),
    /// ECDSA key pair and its curve
    Ecdsa(EcdsaKeyPair, KeyAlgorithm),
}

impl PrivateKey {
    /// Parse a PEM `PRIVATE KEY` (PKCS#8) or `RSA PRIVATE KEY` (PKCS#1) block.
    pub fn from_pem(text: &str) -> Result<Self> {
        let block = pem::parse(text.trim()).map_err(|e| TrustError::parse("private key PEM", e))?;
        match block.tag() {
            PKCS1_TAG => RsaKeyPair::from_der(block.contents())
                .map(Self::Rsa)
                .map_err(|e| TrustError::parse("PKCS#1 RSA private key", e)),
            PKCS8_TAG => Self::from_pkcs8(block.contents()),
            other => Err(TrustError::parse(
                "private key PEM",
                format!("unsupported PEM block {other:?}"),
            )),
        }
    }

    /// Parse a PKCS#8 document holding an RSA, P-256 or P-384 key.
    pub fn from_pkcs8(der: &[u8]) -> Result<Self> {
        let rng = SystemRandom::new();
        if let Ok(pair) = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, der, &rng) {
            return Ok(Self::Ecdsa(pair, KeyAlgorithm::EcdsaP256));
        }
        if let Ok(pair) = EcdsaKeyPair::from_pkcs8(&ECDSA_P384_SHA384_ASN1_SIGNING, der, &rng) {
            return Ok(Self::Ecdsa(pair, KeyAlgorithm::EcdsaP384));
        }
        RsaKeyPair::from_pkcs8(der)
            .map(Self::Rsa)
            .map_err(|e| TrustError::parse("PKCS#8 private key", e))
    }

    /// Algorithm family of the key.
    pub const fn algorithm(&self) -> KeyAlgorithm {
        match self {
            Self::Rsa(_) => KeyAlgorithm::Rsa,
            Self::Ecdsa(_, alg) => *alg,
        }
    }

    /// Raw public key, in the same form as a certificate's subject key:
    /// PKCS#1 `RSAPublicKey` DER or an uncompressed EC point.
    pub fn public_key(&self) -> &[u8] {
        match self {
            Self::Rsa(pair) => pair.public_key().as_ref(),
            Self::Ecdsa(pair, _) => pair.public_key().as_ref(),
        }
    }

    /// Digest paired with this key: SHA-384 for P-384, SHA-256 otherwise.
    pub fn digest_algorithm(&self) -> &'static digest::Algorithm {
        match self.algorithm() {
            KeyAlgorithm::EcdsaP384 => &digest::SHA384,
            _ => &digest::SHA256,
        }
    }

    /// Sign `message`, hashing it with [`Self::digest_algorithm`].
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let rng = SystemRandom::new();
        match self {
            Self::Rsa(pair) => {
                let mut sig = vec![0u8; pair.public().modulus_len()];
                pair.sign(&RSA_PKCS1_SHA256, &rng, message, &mut sig)
                    .map_err(|_| TrustError::Signing("RSA signing failed".to_string()))?;
                Ok(sig)
            }
            Self::Ecdsa(pair, _) => pair
                .sign(&rng, message)
                .map(|sig| sig.as_ref().to_vec())
                .map_err(|_| TrustError::Signing("ECDSA signing failed".to_string())),
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}
