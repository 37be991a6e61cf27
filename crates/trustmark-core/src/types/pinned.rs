//! Pinned root-of-trust fingerprints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::hash::normalize_fingerprint;

/// Expected SHA-256 fingerprint of the trust anchor, as configured
/// (uppercase colon-separated hex, e.g. `97:E8:BA:9C:...`).
///
/// The configured text is kept verbatim so mismatch reports show exactly
/// what the operator pinned.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinnedRoot(String);

impl PinnedRoot {
    /// Pin the given fingerprint.
    pub fn new(fingerprint: impl Into<String>) -> Self {
        Self(fingerprint.into())
    }

    /// The configured fingerprint text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against a computed fingerprint, ignoring colons and case.
    ///
    /// An empty pin never matches.
    pub fn matches(&self, fingerprint: &str) -> bool {
        let pinned = normalize_fingerprint(&self.0);
        !pinned.is_empty() && pinned == normalize_fingerprint(fingerprint)
    }
}

impl FromStr for PinnedRoot {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl fmt::Display for PinnedRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PinnedRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PinnedRoot({})", self.0)
    }
}
