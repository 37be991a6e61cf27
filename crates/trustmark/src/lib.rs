//! Trust core of a content-signing service: chain validation against a
//! pinned root, content-signature verification, and detached signature
//! production.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use trustmark::{ContentSignature, ContentSignatureVerifier, VerifierConfig};
//!
//! fn check(record: &ContentSignature, payload: &[u8]) -> trustmark::Result<()> {
//!     let config = VerifierConfig::load("verifier.toml")?;
//!     let verifier = ContentSignatureVerifier::from_config(&config)?;
//!     verifier.verify(record, payload)
//! }
//! ```
//!
//! Signing:
//!
//! ```rust,ignore
//! use trustmark::signer::{AnySigner, Signature};
//!
//! let signer = AnySigner::from_config(&config)?;
//! let encoded = signer.sign_data(payload)?.marshal()?;
//! ```
//!
//! # Features
//!
//! - `default` - Uses rustls for X5U fetches
//! - `rustls` - Use rustls for TLS (recommended)
//! - `native-tls` - Use system native TLS

// Re-export core types
pub use trustmark_core::*;

// Re-export the verification path
pub use trustmark_verify::{
    verify_root, verify_root_now, ChainFetcher, ChainPolicy, ContentSignatureVerifier,
    HttpFetcher, VerifierConfig, DEFAULT_EXPIRY_MARGIN_DAYS, MAX_CHAIN_BYTES,
};

// Signer formats
pub use trustmark_signer as signer;
