//! Validation of certificate chains against a pinned root of trust, and of
//! content signatures made by the chain's end-entity.
//!
//! Verification path: [`ContentSignatureVerifier`] fetches the chain named by
//! a record's X5U, [`ChainPolicy`] checks linkage and expiry margin, and
//! [`verify_root`] checks the trust anchor against its pinned fingerprint.

mod chain;
mod config;
mod content_signature;
mod fetch;
mod root;

#[cfg(test)]
mod testutil;

pub use chain::{ChainPolicy, DEFAULT_EXPIRY_MARGIN_DAYS};
pub use config::VerifierConfig;
pub use content_signature::ContentSignatureVerifier;
pub use fetch::{ChainFetcher, HttpFetcher, MAX_CHAIN_BYTES};
pub use root::{verify_root, verify_root_now};
pub use trustmark_core::{Result, TrustError};
