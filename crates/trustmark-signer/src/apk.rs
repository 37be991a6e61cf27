//! PKCS#7 detached signatures for Android application packages.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use cms::cert::{CertificateChoices, IssuerAndSerialNumber};
use cms::content_info::{CmsVersion, ContentInfo};
use cms::signed_data::{
    CertificateSet, EncapsulatedContentInfo, SignedAttributes, SignedData, SignerIdentifier,
    SignerInfo, SignerInfos,
};
use const_oid::db::{rfc5911, rfc5912};
use const_oid::ObjectIdentifier;
use der::asn1::{OctetString, SetOfVec};
use der::{Any, AnyRef, Decode, Encode};
use ring::digest;
use ring::signature::{
    VerificationAlgorithm, ECDSA_P256_SHA256_ASN1, ECDSA_P384_SHA384_ASN1,
    RSA_PKCS1_2048_8192_SHA256,
};
use std::fmt;
use tracing::{debug, info};
use trustmark_core::{Certificate, KeyAlgorithm, Result, SignerConfig, TrustError};
use x509_cert::attr::Attribute;
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::key::PrivateKey;
use crate::{Signature, Signer};

/// PEM label of the transport encoding.
pub const PKCS7_TAG: &str = "PKCS7";

/// Issues PKCS#7 detached signatures with one key/certificate pair.
pub struct ApkSigner {
    config: SignerConfig,
    key: PrivateKey,
    certificate: Certificate,
}

impl ApkSigner {
    /// The signer's certificate.
    pub const fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    fn signed_attributes(&self, data: &[u8]) -> der::Result<SignedAttributes> {
        let content_digest = digest::digest(self.key.digest_algorithm(), data);
        SetOfVec::try_from(vec![
            attribute(rfc5911::ID_CONTENT_TYPE, Any::encode_from(&rfc5911::ID_DATA)?)?,
            attribute(
                rfc5911::ID_MESSAGE_DIGEST,
                Any::encode_from(&OctetString::new(content_digest.as_ref())?)?,
            )?,
        ])
    }

    fn assemble(&self, signed_attrs: SignedAttributes, signature: Vec<u8>) -> der::Result<Vec<u8>> {
        let cert = x509_cert::Certificate::from_der(self.certificate.der())?;
        let (digest_oid, signature_alg) = algorithms(self.key.algorithm());
        let digest_alg = AlgorithmIdentifierOwned {
            oid: digest_oid,
            parameters: None,
        };
        let signer_info = SignerInfo {
            version: CmsVersion::V1,
            sid: SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
                issuer: cert.tbs_certificate.issuer.clone(),
                serial_number: cert.tbs_certificate.serial_number.clone(),
            }),
            digest_alg: digest_alg.clone(),
            signed_attrs: Some(signed_attrs),
            signature_algorithm: signature_alg,
            signature: OctetString::new(signature)?,
            unsigned_attrs: None,
        };

        let signed_data = SignedData {
            version: CmsVersion::V1,
            digest_algorithms: SetOfVec::try_from(vec![digest_alg])?,
            encap_content_info: EncapsulatedContentInfo {
                econtent_type: rfc5911::ID_DATA,
                econtent: None,
            },
            certificates: Some(CertificateSet(SetOfVec::try_from(vec![
                CertificateChoices::Certificate(cert),
            ])?)),
            crls: None,
            signer_infos: SignerInfos(SetOfVec::try_from(vec![signer_info])?),
        };

        ContentInfo {
            content_type: rfc5911::ID_SIGNED_DATA,
            content: Any::encode_from(&signed_data)?,
        }
        .to_der()
    }
}

impl Signer for ApkSigner {
    type Signature = Pkcs7Signature;

    const TYPE: &'static str = "apk";

    fn from_config(config: &SignerConfig) -> Result<Self> {
        let invalid = |field, reason: String| TrustError::config(Self::TYPE, field, reason);

        if config.kind != Self::TYPE {
            return Err(invalid(
                "type",
                format!("invalid type {:?}, must be {:?}", config.kind, Self::TYPE),
            ));
        }
        if config.id.is_empty() {
            return Err(invalid("id", "missing signer ID".to_string()));
        }
        if config.private_key.is_empty() {
            return Err(invalid("privatekey", "missing private key".to_string()));
        }
        let key = PrivateKey::from_pem(&config.private_key)
            .map_err(|e| invalid("privatekey", e.to_string()))?;

        let certificate = Certificate::from_pem(config.certificate.as_bytes())
            .map_err(|e| invalid("certificate", e.to_string()))?;
        let now = Utc::now();
        if !certificate.is_valid_at(now) {
            return Err(invalid(
                "certificate",
                format!(
                    "signer certificate is not currently valid (valid {} to {})",
                    certificate.not_before(),
                    certificate.not_after()
                ),
            ));
        }
        if key.public_key() != certificate.public_key() {
            return Err(invalid(
                "certificate",
                "certificate public key does not match the private key".to_string(),
            ));
        }

        info!(
            id = %config.id,
            subject = %certificate.subject(),
            algorithm = ?key.algorithm(),
            "apk signer initialized"
        );
        Ok(Self {
            config: config.clone(),
            key,
            certificate,
        })
    }

    fn id(&self) -> &str {
        &self.config.id
    }

    fn config(&self) -> SignerConfig {
        self.config.clone()
    }

    fn sign_data(&self, data: &[u8]) -> Result<Pkcs7Signature> {
        let encoding =
            |e: der::Error| TrustError::Signing(format!("apk: cannot encode signed data: {e}"));
        let signed_attrs = self.signed_attributes(data).map_err(encoding)?;
        let signature = self.key.sign(&signed_attrs.to_der().map_err(encoding)?)?;
        let der = self.assemble(signed_attrs, signature).map_err(encoding)?;
        debug!(id = %self.config.id, bytes = data.len(), "signed data");
        Ok(Pkcs7Signature::Finished {
            der,
            content: data.to_vec(),
        })
    }

    fn unmarshal(encoded: &str, content: &[u8]) -> Result<Pkcs7Signature> {
        let der = STANDARD
            .decode(encoded.trim())
            .map_err(|e| TrustError::parse("PKCS#7 signature base64", e))?;
        parse_signed_data(&der)?;
        Ok(Pkcs7Signature::Finished {
            der,
            content: content.to_vec(),
        })
    }
}

impl fmt::Debug for ApkSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApkSigner")
            .field("id", &self.config.id)
            .field("key", &self.key)
            .field("certificate", &self.certificate.subject())
            .finish()
    }
}

/// A PKCS#7 detached signature.
///
/// Only a finished signature, holding both the encoded structure and the
/// content it covers, can be marshaled or verified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Pkcs7Signature {
    /// Nothing signed yet
    #[default]
    Unsigned,
    /// Encoded `ContentInfo` and the detached content
    Finished {
        /// DER `ContentInfo` wrapping `SignedData`
        der: Vec<u8>,
        /// The signed content, supplied out of band
        content: Vec<u8>,
    },
}

impl Pkcs7Signature {
    /// Encoded structure of a finished signature.
    pub fn der(&self) -> Option<&[u8]> {
        match self {
            Self::Unsigned => None,
            Self::Finished { der, .. } => Some(der),
        }
    }
}

impl Signature for Pkcs7Signature {
    fn marshal(&self) -> Result<String> {
        match self {
            Self::Unsigned => Err(TrustError::State(
                "apk: cannot marshal unfinished signature".to_string(),
            )),
            Self::Finished { der, .. } if der.is_empty() => Err(TrustError::State(
                "apk: cannot marshal empty signature data".to_string(),
            )),
            Self::Finished { der, .. } => Ok(STANDARD.encode(der)),
        }
    }

    fn verify(&self, certificate: &Certificate) -> Result<()> {
        let Self::Finished { der, content } = self else {
            return Err(TrustError::State(
                "apk: cannot verify unfinished signature".to_string(),
            ));
        };
        let signed_data = parse_signed_data(der)?;
        let signer_info = signed_data
            .signer_infos
            .0
            .iter()
            .next()
            .ok_or_else(|| TrustError::Verification("no signer info".to_string()))?;
        verify_signer_info(
            signer_info,
            signed_data.encap_content_info.econtent_type,
            certificate,
            content,
        )
    }
}

impl fmt::Display for Pkcs7Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let der = self.der().unwrap_or_default();
        f.write_str(&pem::encode(&pem::Pem::new(PKCS7_TAG, der.to_vec())))
    }
}

/// Digest and signature algorithm identifiers for a key.
fn algorithms(key: KeyAlgorithm) -> (ObjectIdentifier, AlgorithmIdentifierOwned) {
    match key {
        KeyAlgorithm::EcdsaP384 => (
            rfc5912::ID_SHA_384,
            AlgorithmIdentifierOwned {
                oid: rfc5912::ECDSA_WITH_SHA_384,
                parameters: None,
            },
        ),
        KeyAlgorithm::EcdsaP256 => (
            rfc5912::ID_SHA_256,
            AlgorithmIdentifierOwned {
                oid: rfc5912::ECDSA_WITH_SHA_256,
                parameters: None,
            },
        ),
        KeyAlgorithm::Rsa | KeyAlgorithm::Other => (
            rfc5912::ID_SHA_256,
            AlgorithmIdentifierOwned {
                oid: rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
                parameters: Some(Any::from(AnyRef::NULL)),
            },
        ),
    }
}

fn attribute(oid: ObjectIdentifier, value: Any) -> der::Result<Attribute> {
    Ok(Attribute {
        oid,
        values: SetOfVec::try_from(vec![value])?,
    })
}

fn parse_signed_data(der: &[u8]) -> Result<SignedData> {
    let info = ContentInfo::from_der(der).map_err(|e| TrustError::parse("PKCS#7 signature", e))?;
    if info.content_type != rfc5911::ID_SIGNED_DATA {
        return Err(TrustError::parse(
            "PKCS#7 signature",
            format!("content type {} is not signed data", info.content_type),
        ));
    }
    let signed_data = info
        .content
        .decode_as::<SignedData>()
        .map_err(|e| TrustError::parse("PKCS#7 signed data", e))?;
    if signed_data.encap_content_info.econtent.is_some() {
        return Err(TrustError::parse(
            "PKCS#7 signed data",
            "content is embedded, expected a detached signature",
        ));
    }
    Ok(signed_data)
}

fn verify_signer_info(
    info: &SignerInfo,
    content_type: ObjectIdentifier,
    certificate: &Certificate,
    content: &[u8],
) -> Result<()> {
    let failed = |reason: &str| TrustError::Verification(format!("apk: {reason}"));

    let cert = x509_cert::Certificate::from_der(certificate.der())
        .map_err(|e| TrustError::parse("X.509 certificate", e))?;
    match &info.sid {
        SignerIdentifier::IssuerAndSerialNumber(id)
            if id.issuer == cert.tbs_certificate.issuer
                && id.serial_number == cert.tbs_certificate.serial_number => {}
        _ => return Err(failed("signer identifier does not match certificate")),
    }

    let digest_alg = match info.digest_alg.oid {
        oid if oid == rfc5912::ID_SHA_256 => &digest::SHA256,
        oid if oid == rfc5912::ID_SHA_384 => &digest::SHA384,
        other => return Err(failed(&format!("unsupported digest algorithm {other}"))),
    };
    let attrs = info
        .signed_attrs
        .as_ref()
        .ok_or_else(|| failed("missing signed attributes"))?;
    let signed_type = attrs
        .iter()
        .find(|attr| attr.oid == rfc5911::ID_CONTENT_TYPE)
        .and_then(|attr| attr.values.iter().next())
        .and_then(|value| value.decode_as::<ObjectIdentifier>().ok())
        .ok_or_else(|| failed("missing content type attribute"))?;
    if signed_type != content_type {
        return Err(failed("content type attribute does not match signed data"));
    }
    let claimed = attrs
        .iter()
        .find(|attr| attr.oid == rfc5911::ID_MESSAGE_DIGEST)
        .and_then(|attr| attr.values.iter().next())
        .and_then(|value| value.decode_as::<OctetString>().ok())
        .ok_or_else(|| failed("missing message digest attribute"))?;
    if claimed.as_bytes() != digest::digest(digest_alg, content).as_ref() {
        return Err(failed("message digest does not match content"));
    }

    let (oid, key) = (info.signature_algorithm.oid, certificate.key_algorithm());
    let algorithm: &'static dyn VerificationAlgorithm = match key {
        KeyAlgorithm::Rsa if oid == rfc5912::SHA_256_WITH_RSA_ENCRYPTION => &RSA_PKCS1_2048_8192_SHA256,
        KeyAlgorithm::EcdsaP256 if oid == rfc5912::ECDSA_WITH_SHA_256 => &ECDSA_P256_SHA256_ASN1,
        KeyAlgorithm::EcdsaP384 if oid == rfc5912::ECDSA_WITH_SHA_384 => &ECDSA_P384_SHA384_ASN1,
        _ => {
            return Err(failed(&format!(
                "signature algorithm {oid} does not fit a {key:?} certificate"
            )))
        }
    };
    let message = attrs
        .to_der()
        .map_err(|e| TrustError::parse("PKCS#7 signed attributes", e))?;
    certificate
        .verify_data(algorithm, &message, info.signature.as_bytes())
        .map_err(|_| failed("signature does not verify"))
}
