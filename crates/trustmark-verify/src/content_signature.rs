//! Content-signature validation against an X5U-referenced chain.

use chrono::{DateTime, Utc};
use ring::signature::{self, VerificationAlgorithm};
use tracing::{info, warn};
use trustmark_core::{
    signed_message, CertificateChain, ContentSignature, ContentSignatureMode, Result,
    TrustError, CONTENT_SIGNATURE_TYPE,
};

use crate::chain::ChainPolicy;
use crate::config::VerifierConfig;
use crate::fetch::{ChainFetcher, HttpFetcher};

/// Checks content-signature records: fetches the chain, validates it under
/// the policy, then verifies the signature with the leaf key.
#[derive(Debug, Clone)]
pub struct ContentSignatureVerifier<F = HttpFetcher> {
    fetcher: F,
    policy: ChainPolicy,
}

impl ContentSignatureVerifier<HttpFetcher> {
    /// HTTP-backed verifier built from configuration.
    pub fn from_config(config: &VerifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(HttpFetcher::new(config.fetch_timeout())?, config.policy()))
    }
}

impl<F: ChainFetcher> ContentSignatureVerifier<F> {
    /// Verifier using `fetcher` to retrieve chains.
    pub const fn new(fetcher: F, policy: ChainPolicy) -> Self {
        Self { fetcher, policy }
    }

    /// The chain policy in force.
    pub const fn policy(&self) -> &ChainPolicy {
        &self.policy
    }

    /// Verify `record` over `payload` at the current time.
    pub fn verify(&self, record: &ContentSignature, payload: &[u8]) -> Result<()> {
        self.verify_at(record, payload, Utc::now())
    }

    /// Verify `record` over `payload` as of `at`.
    ///
    /// Any failure comes back as [`TrustError::ContentSignature`] with the
    /// original cause as its source.
    pub fn verify_at(
        &self,
        record: &ContentSignature,
        payload: &[u8],
        at: DateTime<Utc>,
    ) -> Result<()> {
        match self.check(record, payload, at) {
            Ok(()) => {
                info!(
                    reference = %record.reference,
                    signer = %record.signer_id,
                    mode = %record.mode,
                    "content signature verified"
                );
                Ok(())
            }
            Err(source) => {
                warn!(
                    reference = %record.reference,
                    x5u = %record.x5u,
                    error = %source,
                    "content signature rejected"
                );
                Err(TrustError::ContentSignature {
                    reference: record.reference.clone(),
                    source: Box::new(source),
                })
            }
        }
    }

    fn check(&self, record: &ContentSignature, payload: &[u8], at: DateTime<Utc>) -> Result<()> {
        if record.kind != CONTENT_SIGNATURE_TYPE {
            return Err(TrustError::parse(
                "content signature",
                format!("type is {:?}, expected {CONTENT_SIGNATURE_TYPE:?}", record.kind),
            ));
        }
        let mode = record.parsed_mode()?;
        let sig = record.decode_signature()?;
        if sig.len() != mode.signature_len() {
            return Err(TrustError::parse(
                "content signature",
                format!(
                    "{mode} signature is {} bytes, expected {}",
                    sig.len(),
                    mode.signature_len()
                ),
            ));
        }
        let claimed_key = record.decode_public_key()?;

        let bundle = self.fetcher.fetch(&record.x5u)?;
        let chain = CertificateChain::from_pem_bundle(&bundle)?;
        self.policy.verify_at(&chain, at)?;

        let leaf = chain.leaf();
        if leaf.key_algorithm() != mode.key_algorithm() {
            return Err(TrustError::Verification(format!(
                "leaf {:?} has a {:?} key, {mode} needs {:?}",
                leaf.subject(),
                leaf.key_algorithm(),
                mode.key_algorithm()
            )));
        }
        if let Some(key) = claimed_key {
            if key != leaf.spki_der() {
                return Err(TrustError::Verification(format!(
                    "public key in record does not match leaf {:?}",
                    leaf.subject()
                )));
            }
        }

        leaf.verify_data(ring_algorithm(mode), &signed_message(payload), &sig)
            .map_err(|_| {
                TrustError::Verification(format!(
                    "{mode} signature does not verify under leaf {:?}",
                    leaf.subject()
                ))
            })
    }
}

/// Fixed-width `r || s` verification algorithm for `mode`.
fn ring_algorithm(mode: ContentSignatureMode) -> &'static dyn VerificationAlgorithm {
    match mode {
        ContentSignatureMode::P256Ecdsa => &signature::ECDSA_P256_SHA256_FIXED,
        ContentSignatureMode::P384Ecdsa => &signature::ECDSA_P384_SHA384_FIXED,
    }
}
