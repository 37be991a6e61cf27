//! Throw-away P-384 hierarchies for tests.

use rcgen::{
    BasicConstraints, CertificateParams, DnType, IsCa, KeyPair, PKCS_ECDSA_P384_SHA384,
};
use time::{Duration, OffsetDateTime};
use trustmark_core::{hash, Certificate, CertificateChain, PinnedRoot};

pub fn days_from_now(days: i64) -> OffsetDateTime {
    OffsetDateTime::now_utc() + Duration::days(days)
}

fn params(cn: &str, ca: bool, not_before: OffsetDateTime, not_after: OffsetDateTime) -> CertificateParams {
    let mut params = CertificateParams::default();
    params.distinguished_name.push(DnType::CommonName, cn);
    params.distinguished_name.push(DnType::OrganizationName, "Trustmark Test");
    params.is_ca = if ca {
        IsCa::Ca(BasicConstraints::Unconstrained)
    } else {
        IsCa::NoCa
    };
    params.not_before = not_before;
    params.not_after = not_after;
    params
}

fn p384() -> KeyPair {
    KeyPair::generate_for(&PKCS_ECDSA_P384_SHA384).unwrap()
}

/// Root -> intermediate, both CAs.
pub struct Pki {
    pub root: rcgen::Certificate,
    pub intermediate: rcgen::Certificate,
    intermediate_key: KeyPair,
}

impl Pki {
    pub fn new() -> Self {
        Self::with_intermediate_validity(days_from_now(-1), days_from_now(365))
    }

    pub fn with_intermediate_validity(not_before: OffsetDateTime, not_after: OffsetDateTime) -> Self {
        let root_key = p384();
        let root = params("Test Root CA", true, days_from_now(-10), days_from_now(3650))
            .self_signed(&root_key)
            .unwrap();
        let intermediate_key = p384();
        let intermediate = params("Test Content Signing Intermediate", true, not_before, not_after)
            .signed_by(&intermediate_key, &root, &root_key)
            .unwrap();
        Self {
            root,
            intermediate,
            intermediate_key,
        }
    }

    /// End-entity valid from yesterday for `valid_days` more days.
    pub fn leaf(&self, valid_days: i64) -> (rcgen::Certificate, KeyPair) {
        let key = p384();
        let cert = params("leaf.content-signature.test", false, days_from_now(-1), days_from_now(valid_days))
            .signed_by(&key, &self.intermediate, &self.intermediate_key)
            .unwrap();
        (cert, key)
    }

    /// A second, unrelated root with the same subject.
    pub fn impostor_root(&self) -> rcgen::Certificate {
        params("Test Root CA", true, days_from_now(-10), days_from_now(3650))
            .self_signed(&p384())
            .unwrap()
    }

    pub fn pin(&self) -> PinnedRoot {
        PinnedRoot::new(hash::fingerprint(self.root.der()))
    }

    pub fn bundle(&self, leaf: &rcgen::Certificate) -> String {
        format!("{}{}{}", leaf.pem(), self.intermediate.pem(), self.root.pem())
    }

    pub fn chain(&self, leaf: &rcgen::Certificate) -> CertificateChain {
        CertificateChain::from_pem_bundle(self.bundle(leaf).as_bytes()).unwrap()
    }
}

pub fn parsed(cert: &rcgen::Certificate) -> Certificate {
    Certificate::from_der(cert.der().to_vec()).unwrap()
}
