//! SHA-256 fingerprints via `ring::digest`.

use ring::digest::{digest, SHA256};

/// Compute SHA-256 of raw bytes, lowercase hex.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(digest(&SHA256, data).as_ref())
}

/// Fingerprint of a DER certificate: SHA-256, uppercase hex, colon separated.
///
/// This is the format pinned roots are configured in, e.g. `97:E8:BA:...`.
#[must_use]
pub fn fingerprint(der: &[u8]) -> String {
    let hash = digest(&SHA256, der);
    hash.as_ref()
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// Canonical comparison form of a fingerprint: colons dropped, uppercased.
#[must_use]
pub fn normalize_fingerprint(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| *c != ':')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_fingerprint_format() {
        let fp = fingerprint(b"hello world");
        assert!(fp.starts_with("B9:4D:27:B9"));
        assert_eq!(fp.len(), 32 * 3 - 1);
        assert_eq!(normalize_fingerprint(&fp), sha256_hex(b"hello world").to_uppercase());
    }

    #[test]
    fn test_normalize_ignores_case_and_colons() {
        assert_eq!(normalize_fingerprint("ab:cd:0e"), "ABCD0E");
        assert_eq!(normalize_fingerprint(" ABCD0E "), "ABCD0E");
    }
}
