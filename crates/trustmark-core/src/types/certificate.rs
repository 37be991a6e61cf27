//! Parsed X.509 certificates.

use chrono::{DateTime, TimeZone, Utc};
use ring::signature::{UnparsedPublicKey, VerificationAlgorithm};
use std::fmt;
use x509_parser::certificate::X509Certificate;
use x509_parser::oid_registry::{OID_EC_P256, OID_NIST_EC_P384};
use x509_parser::x509::SubjectPublicKeyInfo;
use x509_parser::public_key::PublicKey;
use x509_parser::time::ASN1Time;

use crate::error::{Result, TrustError};
use crate::hash;

/// PEM label of an X.509 certificate block.
pub const CERTIFICATE_TAG: &str = "CERTIFICATE";

/// Public key algorithm of a certificate's subject key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    /// RSA, any modulus size
    Rsa,
    /// ECDSA on NIST P-256
    EcdsaP256,
    /// ECDSA on NIST P-384
    EcdsaP384,
    /// Anything else (still parseable, but unusable for signing here)
    Other,
}

/// An X.509 certificate owned as DER, with the fields validation needs.
///
/// Parsed fresh from PEM or DER for each validation call; the DER is kept so
/// signatures and fingerprints are always computed over the original bytes.
#[derive(Clone)]
pub struct Certificate {
    der: Vec<u8>,
    subject: String,
    issuer: String,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    spki: Vec<u8>,
    public_key: Vec<u8>,
    key_algorithm: KeyAlgorithm,
    is_ca: bool,
    self_issued: bool,
}

impl Certificate {
    /// Parse a DER-encoded certificate.
    pub fn from_der(der: impl Into<Vec<u8>>) -> Result<Self> {
        let der = der.into();
        let (rest, cert) = x509_parser::parse_x509_certificate(&der)
            .map_err(|e| TrustError::parse("X.509 certificate", e))?;
        if !rest.is_empty() {
            return Err(TrustError::parse(
                "X.509 certificate",
                format!("{} trailing bytes after certificate", rest.len()),
            ));
        }

        let spki = cert.public_key();
        let key_algorithm = match spki.parsed() {
            Ok(PublicKey::RSA(_)) => KeyAlgorithm::Rsa,
            Ok(PublicKey::EC(_)) => named_curve(spki),
            _ => KeyAlgorithm::Other,
        };
        let subject = cert.subject().to_string();
        let issuer = cert.issuer().to_string();
        let not_before = asn1_to_utc(cert.validity().not_before)?;
        let not_after = asn1_to_utc(cert.validity().not_after)?;
        let spki_der = spki.raw.to_vec();
        let public_key = spki.subject_public_key.data.to_vec();
        let is_ca = cert.is_ca();
        let self_issued = cert.subject().as_raw() == cert.issuer().as_raw();
        drop(cert);

        Ok(Self {
            der,
            subject,
            issuer,
            not_before,
            not_after,
            spki: spki_der,
            public_key,
            key_algorithm,
            is_ca,
            self_issued,
        })
    }

    /// Parse a single PEM `CERTIFICATE` block.
    pub fn from_pem(pem_data: &[u8]) -> Result<Self> {
        let block = pem::parse(pem_data).map_err(|e| TrustError::parse("certificate PEM", e))?;
        if block.tag() != CERTIFICATE_TAG {
            return Err(TrustError::parse(
                "certificate PEM",
                format!("unexpected PEM block {:?}", block.tag()),
            ));
        }
        Self::from_der(block.into_contents())
    }

    /// Re-borrow the certificate as an `x509_parser` view.
    pub fn x509(&self) -> Result<X509Certificate<'_>> {
        x509_parser::parse_x509_certificate(&self.der)
            .map(|(_, cert)| cert)
            .map_err(|e| TrustError::parse("X.509 certificate", e))
    }

    /// Original DER bytes.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Subject distinguished name, RFC 4514 style.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Issuer distinguished name, RFC 4514 style.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Start of the validity window.
    pub const fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    /// End of the validity window.
    pub const fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    /// DER `SubjectPublicKeyInfo`.
    pub fn spki_der(&self) -> &[u8] {
        &self.spki
    }

    /// Raw subject public key: an uncompressed EC point or a PKCS#1 RSA key.
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Algorithm of the subject public key.
    pub const fn key_algorithm(&self) -> KeyAlgorithm {
        self.key_algorithm
    }

    /// Whether the basic constraints extension marks this certificate as a CA.
    pub const fn is_ca(&self) -> bool {
        self.is_ca
    }

    /// Subject and issuer names are byte-identical.
    pub const fn is_self_issued(&self) -> bool {
        self.self_issued
    }

    /// SHA-256 fingerprint of the DER, uppercase colon-separated hex.
    pub fn fingerprint(&self) -> String {
        hash::fingerprint(&self.der)
    }

    /// True if `at` falls inside `[not_before, not_after]`.
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.not_before <= at && at <= self.not_after
    }

    /// Check that `parent` issued this certificate: names chain and the
    /// signature verifies under the parent's key.
    ///
    /// The error string explains which check failed.
    pub fn verify_issued_by(&self, parent: &Self) -> std::result::Result<(), String> {
        let child = self.x509().map_err(|e| e.to_string())?;
        let issuer = parent.x509().map_err(|e| e.to_string())?;
        if child.issuer().as_raw() != issuer.subject().as_raw() {
            return Err(format!(
                "issuer {:?} does not match parent subject",
                self.issuer
            ));
        }
        child
            .verify_signature(Some(issuer.public_key()))
            .map_err(|e| format!("bad signature: {e}"))
    }

    /// Check the certificate signature against its own key.
    pub fn verify_self_signature(&self) -> std::result::Result<(), String> {
        let cert = self.x509().map_err(|e| e.to_string())?;
        cert.verify_signature(None)
            .map_err(|e| format!("bad self-signature: {e}"))
    }

    /// Verify `signature` over `message` with the subject public key.
    pub fn verify_data(
        &self,
        algorithm: &'static dyn VerificationAlgorithm,
        message: &[u8],
        signature: &[u8],
    ) -> std::result::Result<(), ring::error::Unspecified> {
        UnparsedPublicKey::new(algorithm, &self.public_key).verify(message, signature)
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject)
            .field("issuer", &self.issuer)
            .field("not_before", &self.not_before)
            .field("not_after", &self.not_after)
            .field("key_algorithm", &self.key_algorithm)
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// Convert an ASN.1 `GeneralizedTime` / `UTCTime` to `DateTime<Utc>`.
fn asn1_to_utc(t: ASN1Time) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(t.timestamp(), 0)
        .single()
        .ok_or_else(|| TrustError::parse("certificate validity", "timestamp out of range"))
}

/// Curve named in the EC algorithm parameters; explicit curves are `Other`.
fn named_curve(spki: &SubjectPublicKeyInfo<'_>) -> KeyAlgorithm {
    let curve = spki
        .algorithm
        .parameters
        .as_ref()
        .and_then(|params| params.as_oid().ok());
    match curve {
        Some(oid) if oid == OID_EC_P256 => KeyAlgorithm::EcdsaP256,
        Some(oid) if oid == OID_NIST_EC_P384 => KeyAlgorithm::EcdsaP384,
        _ => KeyAlgorithm::Other,
    }
}
