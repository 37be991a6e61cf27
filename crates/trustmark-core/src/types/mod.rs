//! Shared data model for validation and signing.

pub mod certificate;
pub mod chain;
pub mod content_signature;
pub mod pinned;
pub mod signer_config;

pub use certificate::{Certificate, KeyAlgorithm, CERTIFICATE_TAG};
pub use chain::CertificateChain;
pub use content_signature::{
    signed_message, ContentSignature, ContentSignatureMode, CONTENT_SIGNATURE_PREFIX,
    CONTENT_SIGNATURE_TYPE,
};
pub use pinned::PinnedRoot;
pub use signer_config::SignerConfig;
