//! Ordered certificate chains.

use crate::error::{Result, TrustError};
use crate::types::certificate::{Certificate, CERTIFICATE_TAG};

/// Ordered certificates: position 0 is the end-entity, each following
/// position is the issuer of the previous one, the last is the root.
///
/// Never empty.
#[derive(Debug, Clone)]
pub struct CertificateChain {
    certs: Vec<Certificate>,
}

impl CertificateChain {
    /// Build a chain from certificates already in leaf-to-root order.
    pub fn new(certs: Vec<Certificate>) -> Result<Self> {
        if certs.is_empty() {
            return Err(TrustError::parse(
                "certificate chain",
                "chain contains no certificates",
            ));
        }
        Ok(Self { certs })
    }

    /// Parse a bundle of concatenated PEM certificates, leaf first.
    ///
    /// Any block that is not a `CERTIFICATE` is rejected rather than skipped.
    pub fn from_pem_bundle(data: &[u8]) -> Result<Self> {
        let blocks =
            pem::parse_many(data).map_err(|e| TrustError::parse("certificate chain PEM", e))?;

        let mut certs = Vec::with_capacity(blocks.len());
        for (index, block) in blocks.into_iter().enumerate() {
            if block.tag() != CERTIFICATE_TAG {
                return Err(TrustError::parse(
                    "certificate chain PEM",
                    format!("block {index} is {:?}, expected {CERTIFICATE_TAG}", block.tag()),
                ));
            }
            certs.push(Certificate::from_der(block.into_contents())?);
        }
        Self::new(certs)
    }

    /// The end-entity certificate.
    pub fn leaf(&self) -> &Certificate {
        &self.certs[0]
    }

    /// The last certificate, expected to be the trust anchor.
    pub fn root(&self) -> &Certificate {
        &self.certs[self.certs.len() - 1]
    }

    /// Number of certificates.
    pub fn len(&self) -> usize {
        self.certs.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    /// Certificates in chain order.
    pub fn iter(&self) -> std::slice::Iter<'_, Certificate> {
        self.certs.iter()
    }

    /// Certificates in chain order, as a slice.
    pub fn as_slice(&self) -> &[Certificate] {
        &self.certs
    }

    /// Adjacent `(index, child, parent)` triples, leaf first.
    pub fn links(&self) -> impl Iterator<Item = (usize, &Certificate, &Certificate)> {
        self.certs
            .windows(2)
            .enumerate()
            .map(|(i, pair)| (i, &pair[0], &pair[1]))
    }
}

impl<'a> IntoIterator for &'a CertificateChain {
    type Item = &'a Certificate;
    type IntoIter = std::slice::Iter<'a, Certificate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};

    fn two_cert_bundle() -> String {
        let root_key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::default();
        params.distinguished_name.push(DnType::CommonName, "Root");
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let root = params.self_signed(&root_key).unwrap();

        let leaf_key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::default();
        params.distinguished_name.push(DnType::CommonName, "Leaf");
        let leaf = params.signed_by(&leaf_key, &root, &root_key).unwrap();

        format!("{}{}", leaf.pem(), root.pem())
    }

    #[test]
    fn test_parse_bundle_keeps_order() {
        let chain = CertificateChain::from_pem_bundle(two_cert_bundle().as_bytes()).unwrap();
        assert_eq!(chain.len(), 2);
        assert!(chain.leaf().subject().contains("Leaf"));
        assert!(chain.root().subject().contains("Root"));

        let links: Vec<_> = chain.links().collect();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].0, 0);
    }

    #[test]
    fn test_empty_bundle_is_parse_error() {
        let err = CertificateChain::from_pem_bundle(b"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);

        let err = CertificateChain::from_pem_bundle(b"not pem at all").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_foreign_block_is_parse_error() {
        let mut bundle = two_cert_bundle();
        bundle.push_str(&pem::encode(&pem::Pem::new("PRIVATE KEY", vec![0u8; 4])));
        let err = CertificateChain::from_pem_bundle(bundle.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("block 2"));
    }

    #[test]
    fn test_corrupt_certificate_body_is_parse_error() {
        let bundle = pem::encode(&pem::Pem::new("CERTIFICATE", vec![0x30, 0x01, 0x00]));
        let err = CertificateChain::from_pem_bundle(bundle.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }
}
