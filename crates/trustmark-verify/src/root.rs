//! Root-of-trust validation.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use trustmark_core::{Certificate, PinnedRoot, Result, TrustError};

/// Check that `cert` is the pinned, self-signed, currently valid trust anchor.
///
/// The fingerprint is compared first so a substituted root is always
/// reported as a mismatch, whatever else is wrong with it.
pub fn verify_root(cert: &Certificate, pinned: &PinnedRoot, at: DateTime<Utc>) -> Result<()> {
    let fingerprint = cert.fingerprint();
    if !pinned.matches(&fingerprint) {
        warn!(
            subject = %cert.subject(),
            expected = %pinned,
            got = %fingerprint,
            "root fingerprint mismatch"
        );
        return Err(TrustError::RootMismatch {
            expected: pinned.to_string(),
            actual: fingerprint,
        });
    }

    let invalid = |reason: String| TrustError::RootInvalid {
        subject: cert.subject().to_string(),
        reason,
    };

    if !cert.is_self_issued() {
        return Err(invalid(format!(
            "issuer {:?} differs from subject",
            cert.issuer()
        )));
    }
    cert.verify_self_signature().map_err(invalid)?;
    if !cert.is_ca() {
        return Err(invalid("not a CA certificate".to_string()));
    }
    if !cert.is_valid_at(at) {
        return Err(invalid(format!(
            "not valid at {at} (valid {} to {})",
            cert.not_before(),
            cert.not_after()
        )));
    }

    debug!(subject = %cert.subject(), fingerprint = %fingerprint, "root verified");
    Ok(())
}

/// [`verify_root`] against the current time.
pub fn verify_root_now(cert: &Certificate, pinned: &PinnedRoot) -> Result<()> {
    verify_root(cert, pinned, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{parsed, Pki};
    use chrono::TimeZone;
    use trustmark_core::ErrorKind;

    const PROD_ROOT: &[u8] = include_bytes!("../testdata/prod_root.pem");
    const STAGING_ROOT: &[u8] = include_bytes!("../testdata/staging_root.pem");
    const PROD_HASH: &str =
        "97:E8:BA:9C:F1:2F:B3:DE:53:CC:42:A4:E6:57:7E:D6:4D:F4:93:C2:47:B4:14:FE:A0:36:81:8D:38:23:56:0E";
    const STAGING_HASH: &str =
        "DB:74:CE:58:E4:F9:D0:9E:E0:42:36:BE:6C:C5:C4:F6:6A:E7:74:7D:C0:21:42:7A:03:BC:2F:57:0C:8B:9B:90";

    fn mid_2020() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_prod_root_with_correct_pin() {
        let root = Certificate::from_pem(PROD_ROOT).unwrap();
        verify_root(&root, &PinnedRoot::new(PROD_HASH), mid_2020()).unwrap();
    }

    #[test]
    fn test_staging_root_with_its_own_pin() {
        let root = Certificate::from_pem(STAGING_ROOT).unwrap();
        verify_root(&root, &PinnedRoot::new(STAGING_HASH), mid_2020()).unwrap();
        assert_eq!(
            verify_root(&root, &PinnedRoot::new(PROD_HASH), mid_2020())
                .unwrap_err()
                .kind(),
            ErrorKind::RootMismatch
        );
    }

    #[test]
    fn test_wrong_pin_is_mismatch() {
        let root = Certificate::from_pem(PROD_ROOT).unwrap();
        let err = verify_root(&root, &PinnedRoot::new("foo"), mid_2020()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RootMismatch);
        let msg = err.to_string();
        assert!(msg.contains("hash does not match expected root"), "{msg}");
        assert!(msg.contains("expected=foo"), "{msg}");
        assert!(msg.contains(PROD_HASH), "{msg}");
    }

    #[test]
    fn test_lowercase_pin_matches() {
        let root = Certificate::from_pem(PROD_ROOT).unwrap();
        verify_root(&root, &PinnedRoot::new(PROD_HASH.to_lowercase()), mid_2020()).unwrap();
    }

    #[test]
    fn test_expired_root_is_invalid() {
        let root = Certificate::from_pem(PROD_ROOT).unwrap();
        let after = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let err = verify_root(&root, &PinnedRoot::new(PROD_HASH), after).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RootInvalid);
        assert!(err.to_string().contains("not valid at"));
    }

    #[test]
    fn test_intermediate_pinned_as_root_is_invalid() {
        let pki = Pki::new();
        let intermediate = parsed(&pki.intermediate);
        let pin = PinnedRoot::new(intermediate.fingerprint());
        let err = verify_root_now(&intermediate, &pin).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RootInvalid);
    }

    #[test]
    fn test_generated_root_now() {
        let pki = Pki::new();
        verify_root_now(&parsed(&pki.root), &pki.pin()).unwrap();
        let err = verify_root(&parsed(&pki.root), &pki.pin(), Utc::now() - chrono::Duration::days(30))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RootInvalid);
    }

    #[test]
    fn test_leaf_is_not_a_root() {
        let pki = Pki::new();
        let (leaf, _) = pki.leaf(30);
        let leaf = parsed(&leaf);
        let pin = PinnedRoot::new(leaf.fingerprint());
        let err = verify_root_now(&leaf, &pin).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RootInvalid);
        assert!(err.to_string().contains("differs from subject"));
    }
}
