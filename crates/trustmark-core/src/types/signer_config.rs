//! Signer configuration records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration handed to a signer at construction.
///
/// Owned by the caller; signers validate it and keep only what they need.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerConfig {
    /// Format tag selecting the signer variant, e.g. `apk`
    #[serde(rename = "type")]
    pub kind: String,
    /// Signer identifier
    pub id: String,
    /// PEM private key
    #[serde(rename = "privatekey", alias = "private_key", default)]
    pub private_key: String,
    /// PEM certificate matching the private key
    #[serde(default)]
    pub certificate: String,
}

impl SignerConfig {
    /// Build a configuration from its four fields.
    pub fn new(
        kind: impl Into<String>,
        id: impl Into<String>,
        private_key: impl Into<String>,
        certificate: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            private_key: private_key.into(),
            certificate: certificate.into(),
        }
    }
}

impl fmt::Debug for SignerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = if self.private_key.is_empty() {
            "<empty>"
        } else {
            "<redacted>"
        };
        f.debug_struct("SignerConfig")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("private_key", &key)
            .field("certificate_len", &self.certificate.len())
            .finish()
    }
}
