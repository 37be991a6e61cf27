//! Verifier configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use trustmark_core::{PinnedRoot, Result, TrustError};

use crate::chain::{ChainPolicy, DEFAULT_EXPIRY_MARGIN_DAYS};

const COMPONENT: &str = "verifier";

/// Settings for chain and content-signature validation.
///
/// ```toml
/// root_hash = "97:E8:BA:9C:..."
/// expiry_margin_days = 15
/// fetch_timeout_secs = 30
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Pinned SHA-256 fingerprint of the trust anchor.
    pub root_hash: PinnedRoot,

    /// Minimum remaining validity of the end-entity certificate, in days.
    #[serde(default = "default_expiry_margin")]
    pub expiry_margin_days: i64,

    /// X5U request timeout; unset means the caller bounds the call.
    #[serde(default)]
    pub fetch_timeout_secs: Option<u64>,
}

fn default_expiry_margin() -> i64 {
    DEFAULT_EXPIRY_MARGIN_DAYS
}

impl VerifierConfig {
    /// Configuration pinning `root_hash` with defaults for everything else.
    #[must_use]
    pub fn new(root_hash: PinnedRoot) -> Self {
        Self {
            root_hash,
            expiry_margin_days: DEFAULT_EXPIRY_MARGIN_DAYS,
            fetch_timeout_secs: None,
        }
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| TrustError::parse("verifier config", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no policy can be built from.
    pub fn validate(&self) -> Result<()> {
        if self.root_hash.as_str().trim().is_empty() {
            return Err(TrustError::config(COMPONENT, "root_hash", "pinned root hash is empty"));
        }
        if self.expiry_margin_days < 0 {
            return Err(TrustError::config(
                COMPONENT,
                "expiry_margin_days",
                format!("must not be negative, got {}", self.expiry_margin_days),
            ));
        }
        Ok(())
    }

    /// The chain policy these settings describe.
    #[must_use]
    pub fn policy(&self) -> ChainPolicy {
        ChainPolicy::new(self.root_hash.clone())
            .with_expiry_margin(chrono::Duration::days(self.expiry_margin_days))
    }

    /// The X5U fetch timeout, if any.
    #[must_use]
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }
}
