//! Core types for the trustmark signing and validation crates.
//!
//! This crate provides the data model shared by the verification and signing
//! paths:
//!
//! - **Types**: [`Certificate`], [`CertificateChain`], [`PinnedRoot`],
//!   [`ContentSignature`] and [`SignerConfig`]
//! - **Errors**: the [`TrustError`] taxonomy, classified by [`ErrorKind`]
//!
//! # Example
//!
//! ```rust,ignore
//! use trustmark_core::{CertificateChain, PinnedRoot, Result};
//!
//! fn describe(bundle: &[u8], pin: &PinnedRoot) -> Result<()> {
//!     let chain = CertificateChain::from_pem_bundle(bundle)?;
//!     println!("leaf: {}", chain.leaf().subject());
//!     println!("root pinned: {}", pin.matches(&chain.root().fingerprint()));
//!     Ok(())
//! }
//! ```

mod error;
pub mod hash;
pub mod types;

pub use error::{ErrorKind, Result, TrustError};
pub use types::*;
