//! Certificate chain validation.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use trustmark_core::{Certificate, CertificateChain, PinnedRoot, Result, TrustError};

use crate::root::verify_root;

/// Remaining validity, in days, the end-entity must have.
pub const DEFAULT_EXPIRY_MARGIN_DAYS: i64 = 15;

/// What a chain has to satisfy: the pinned trust anchor and the leaf's
/// minimum remaining validity.
#[derive(Debug, Clone)]
pub struct ChainPolicy {
    pinned_root: PinnedRoot,
    expiry_margin: Duration,
}

impl ChainPolicy {
    /// Policy pinning `pinned_root` with the default expiry margin.
    #[must_use]
    pub fn new(pinned_root: PinnedRoot) -> Self {
        Self {
            pinned_root,
            expiry_margin: Duration::days(DEFAULT_EXPIRY_MARGIN_DAYS),
        }
    }

    /// Override the leaf expiry margin.
    #[must_use]
    pub const fn with_expiry_margin(mut self, margin: Duration) -> Self {
        self.expiry_margin = margin;
        self
    }

    /// The pinned root fingerprint.
    pub const fn pinned_root(&self) -> &PinnedRoot {
        &self.pinned_root
    }

    /// The leaf expiry margin.
    pub const fn expiry_margin(&self) -> Duration {
        self.expiry_margin
    }

    /// Validate `chain` at the current time.
    pub fn verify(&self, chain: &CertificateChain) -> Result<()> {
        self.verify_at(chain, Utc::now())
    }

    /// Validate `chain` as of `at`.
    ///
    /// Links are checked leaf first; the leaf margin is enforced as soon as
    /// the leaf's own link is established, and the root is checked last.
    pub fn verify_at(&self, chain: &CertificateChain, at: DateTime<Utc>) -> Result<()> {
        if chain.len() == 1 {
            return self.verify_root_at(chain.root(), at);
        }

        for (index, child, parent) in chain.links() {
            child
                .verify_issued_by(parent)
                .map_err(|reason| TrustError::ChainOrder {
                    index,
                    subject: child.subject().to_string(),
                    parent_index: index + 1,
                    parent: parent.subject().to_string(),
                    reason,
                })?;

            if index == 0 {
                self.check_margin(child, at)?;
            }
            check_validity(index, child, at)?;
        }

        self.verify_root_at(chain.root(), at)?;
        debug!(
            leaf = %chain.leaf().subject(),
            length = chain.len(),
            "certificate chain verified"
        );
        Ok(())
    }

    /// Run root validation on a single certificate with this policy's pin.
    pub fn verify_root_at(&self, cert: &Certificate, at: DateTime<Utc>) -> Result<()> {
        verify_root(cert, &self.pinned_root, at)
    }

    fn check_margin(&self, leaf: &Certificate, at: DateTime<Utc>) -> Result<()> {
        if at + self.expiry_margin > leaf.not_after() {
            return Err(TrustError::Expiry {
                index: 0,
                subject: leaf.subject().to_string(),
                margin: describe_margin(self.expiry_margin),
                not_after: leaf.not_after().to_rfc3339(),
            });
        }
        Ok(())
    }
}

/// Margin in the largest whole unit that represents it exactly.
fn describe_margin(margin: Duration) -> String {
    let secs = margin.num_seconds();
    match secs {
        s if s % 86_400 == 0 => format!("{} days", s / 86_400),
        s if s % 3_600 == 0 => format!("{} hours", s / 3_600),
        s => format!("{s} seconds"),
    }
}

fn check_validity(index: usize, cert: &Certificate, at: DateTime<Utc>) -> Result<()> {
    if cert.is_valid_at(at) {
        return Ok(());
    }
    Err(TrustError::NotValid {
        index,
        subject: cert.subject().to_string(),
        at: at.to_rfc3339(),
        not_before: cert.not_before().to_rfc3339(),
        not_after: cert.not_after().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{days_from_now, parsed, Pki};
    use chrono::TimeZone;
    use trustmark_core::ErrorKind;

    const EXPIRED_LEAF_CHAIN: &[u8] = include_bytes!("../testdata/expired_leaf_chain.pem");
    const WRONGLY_ORDERED_CHAIN: &[u8] = include_bytes!("../testdata/wrongly_ordered_chain.pem");
    const PROD_HASH: &str =
        "97:E8:BA:9C:F1:2F:B3:DE:53:CC:42:A4:E6:57:7E:D6:4D:F4:93:C2:47:B4:14:FE:A0:36:81:8D:38:23:56:0E";

    fn prod_policy() -> ChainPolicy {
        ChainPolicy::new(PinnedRoot::new(PROD_HASH))
    }

    #[test]
    fn test_valid_generated_chain() {
        let pki = Pki::new();
        let (leaf, _) = pki.leaf(60);
        ChainPolicy::new(pki.pin()).verify(&pki.chain(&leaf)).unwrap();
    }

    #[test]
    fn test_expired_leaf_fixture() {
        let chain = CertificateChain::from_pem_bundle(EXPIRED_LEAF_CHAIN).unwrap();
        assert_eq!(chain.len(), 3);
        let err = prod_policy().verify(&chain).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Expiry);
        assert!(err.to_string().contains("expires in less than 15 days"), "{err}");
    }

    #[test]
    fn test_fixture_chain_valid_while_current() {
        let chain = CertificateChain::from_pem_bundle(EXPIRED_LEAF_CHAIN).unwrap();
        let at = Utc.with_ymd_and_hms(2017, 7, 1, 0, 0, 0).unwrap();
        prod_policy().verify_at(&chain, at).unwrap();
    }

    #[test]
    fn test_wrongly_ordered_fixture() {
        let chain = CertificateChain::from_pem_bundle(WRONGLY_ORDERED_CHAIN).unwrap();
        let err = prod_policy().verify(&chain).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ChainOrder);
        assert!(
            err.to_string().contains("is not signed by parent certificate"),
            "{err}"
        );
    }

    #[test]
    fn test_leaf_within_margin() {
        let pki = Pki::new();
        let (leaf, _) = pki.leaf(10);
        let err = ChainPolicy::new(pki.pin()).verify(&pki.chain(&leaf)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Expiry);
        assert!(err.to_string().contains("expires in less than 15 days"));

        ChainPolicy::new(pki.pin())
            .with_expiry_margin(Duration::days(5))
            .verify(&pki.chain(&leaf))
            .unwrap();
    }

    #[test]
    fn test_margin_boundary_is_inclusive() {
        let pki = Pki::new();
        let (leaf, _) = pki.leaf(60);
        let chain = pki.chain(&leaf);
        let not_after = parsed(&leaf).not_after();
        let policy = ChainPolicy::new(pki.pin());

        policy.verify_at(&chain, not_after - Duration::days(15)).unwrap();

        let err = policy
            .verify_at(&chain, not_after - Duration::days(15) + Duration::seconds(1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Expiry);
    }

    #[test]
    fn test_sub_day_margin_is_reported_exactly() {
        let pki = Pki::new();
        let (leaf, _) = pki.leaf(60);
        let chain = pki.chain(&leaf);
        let not_after = parsed(&leaf).not_after();

        let err = ChainPolicy::new(pki.pin())
            .with_expiry_margin(Duration::hours(12))
            .verify_at(&chain, not_after - Duration::hours(6))
            .unwrap_err();
        assert!(err.to_string().contains("less than 12 hours"), "{err}");

        assert_eq!(describe_margin(Duration::days(15)), "15 days");
        assert_eq!(describe_margin(Duration::seconds(90)), "90 seconds");
    }

    #[test]
    fn test_root_before_intermediate() {
        let pki = Pki::new();
        let (leaf, _) = pki.leaf(60);
        let bundle = format!("{}{}{}", leaf.pem(), pki.root.pem(), pki.intermediate.pem());
        let chain = CertificateChain::from_pem_bundle(bundle.as_bytes()).unwrap();
        let err = ChainPolicy::new(pki.pin()).verify(&chain).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ChainOrder);
        let msg = err.to_string();
        assert!(msg.contains("certificate 0"), "{msg}");
        assert!(msg.contains("parent certificate 1"), "{msg}");
    }

    #[test]
    fn test_substituted_root_fails_linkage() {
        let pki = Pki::new();
        let (leaf, _) = pki.leaf(60);
        let impostor = pki.impostor_root();
        let bundle = format!("{}{}{}", leaf.pem(), pki.intermediate.pem(), impostor.pem());
        let chain = CertificateChain::from_pem_bundle(bundle.as_bytes()).unwrap();
        let err = ChainPolicy::new(pki.pin()).verify(&chain).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ChainOrder);
    }

    #[test]
    fn test_wrong_pin_on_otherwise_valid_chain() {
        let pki = Pki::new();
        let (leaf, _) = pki.leaf(60);
        let err = prod_policy().verify(&pki.chain(&leaf)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RootMismatch);
    }

    #[test]
    fn test_expired_intermediate() {
        let pki = Pki::with_intermediate_validity(days_from_now(-60), days_from_now(-1));
        let (leaf, _) = pki.leaf(60);
        let err = ChainPolicy::new(pki.pin()).verify(&pki.chain(&leaf)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Expiry);
        assert!(err.to_string().contains("certificate 1"), "{err}");
    }

    #[test]
    fn test_single_certificate_chain() {
        let pki = Pki::new();
        let chain = CertificateChain::from_pem_bundle(pki.root.pem().as_bytes()).unwrap();
        ChainPolicy::new(pki.pin()).verify(&chain).unwrap();

        let (leaf, _) = pki.leaf(60);
        let chain = CertificateChain::from_pem_bundle(leaf.pem().as_bytes()).unwrap();
        let err = ChainPolicy::new(pki.pin()).verify(&chain).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RootMismatch);
    }
}
