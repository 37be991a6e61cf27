use thiserror::Error;

/// Result type alias for trustmark operations
pub type Result<T> = std::result::Result<T, TrustError>;

/// Errors raised while validating trust chains or producing signatures
#[derive(Error, Debug)]
pub enum TrustError {
    /// Configuration is missing a field or holds an invalid value
    #[error("{component}: invalid configuration field {field:?}: {reason}")]
    Config {
        /// Signer format tag or component being configured
        component: String,
        /// Name of the offending configuration field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// Malformed PEM, base64, DER or signed-data input
    #[error("failed to parse {what}: {reason}")]
    Parse {
        /// What was being parsed
        what: &'static str,
        /// Underlying decoder error
        reason: String,
    },

    /// A certificate is not signed by the certificate that follows it
    #[error(
        "certificate {index} {subject:?} is not signed by parent certificate {parent_index} {parent:?}: {reason}"
    )]
    ChainOrder {
        /// Position of the child certificate
        index: usize,
        /// Subject of the child certificate
        subject: String,
        /// Position of the expected parent
        parent_index: usize,
        /// Subject of the expected parent
        parent: String,
        /// Why the linkage check failed
        reason: String,
    },

    /// A certificate expires within the configured margin
    #[error("certificate {index} {subject:?} expires in less than {margin} (not after {not_after})")]
    Expiry {
        /// Position in the chain
        index: usize,
        /// Certificate subject
        subject: String,
        /// Required remaining validity, e.g. `15 days`
        margin: String,
        /// Expiry instant of the certificate
        not_after: String,
    },

    /// A certificate is outside its validity window
    #[error("certificate {index} {subject:?} is not valid at {at} (valid {not_before} to {not_after})")]
    NotValid {
        /// Position in the chain
        index: usize,
        /// Certificate subject
        subject: String,
        /// Instant the check was made for
        at: String,
        /// Start of validity
        not_before: String,
        /// End of validity
        not_after: String,
    },

    /// Root fingerprint does not match the pinned value
    #[error("hash does not match expected root: expected={expected}; got={actual}")]
    RootMismatch {
        /// Pinned fingerprint
        expected: String,
        /// Fingerprint of the presented root
        actual: String,
    },

    /// Root is not self-signed, not a CA, or outside its validity window
    #[error("root certificate {subject:?} is invalid: {reason}")]
    RootInvalid {
        /// Root subject
        subject: String,
        /// Failed check
        reason: String,
    },

    /// Certificate chain could not be retrieved
    #[error("failed to fetch certificate chain from {url}: {reason}")]
    Fetch {
        /// X5U location
        url: String,
        /// Transport error or response status
        reason: String,
    },

    /// Signature is cryptographically invalid
    #[error("signature verification failed: {0}")]
    Verification(String),

    /// Operation invoked in the wrong lifecycle phase
    #[error("invalid signature state: {0}")]
    State(String),

    /// Producing a signature failed
    #[error("signing failed: {0}")]
    Signing(String),

    /// Reading configuration from disk failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Content-signature validation failed; `source` holds the cause
    #[error("content signature {reference:?} is invalid: {source}")]
    ContentSignature {
        /// Correlation reference of the record
        reference: String,
        /// Underlying failure
        #[source]
        source: Box<TrustError>,
    },
}

/// Taxonomy of failure conditions, used by callers to branch on errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad signer setup
    Configuration,
    /// Malformed input
    Parse,
    /// Adjacent certificates are not linked
    ChainOrder,
    /// Insufficient validity margin or expired certificate
    Expiry,
    /// Fingerprint disagreement
    RootMismatch,
    /// Root failed its own checks
    RootInvalid,
    /// Network or transport failure
    Fetch,
    /// Cryptographic mismatch
    Verification,
    /// Wrong lifecycle phase
    State,
    /// Signature production failure
    Signing,
}

impl TrustError {
    /// Build a configuration error for `component` (a signer format tag or
    /// the verifier)
    pub fn config(component: &str, field: &'static str, reason: impl Into<String>) -> Self {
        Self::Config {
            component: component.to_string(),
            field,
            reason: reason.into(),
        }
    }

    /// Build a parse error
    pub fn parse(what: &'static str, reason: impl ToString) -> Self {
        Self::Parse {
            what,
            reason: reason.to_string(),
        }
    }

    /// Returns the failure condition, looking through content-signature wrapping
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } | Self::Io(_) => ErrorKind::Configuration,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::ChainOrder { .. } => ErrorKind::ChainOrder,
            Self::Expiry { .. } | Self::NotValid { .. } => ErrorKind::Expiry,
            Self::RootMismatch { .. } => ErrorKind::RootMismatch,
            Self::RootInvalid { .. } => ErrorKind::RootInvalid,
            Self::Fetch { .. } => ErrorKind::Fetch,
            Self::Verification(_) => ErrorKind::Verification,
            Self::State(_) => ErrorKind::State,
            Self::Signing(_) => ErrorKind::Signing,
            Self::ContentSignature { source, .. } => source.kind(),
        }
    }

    /// Returns true if the failure concerns the certificate chain itself
    #[must_use]
    pub fn is_chain_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ChainOrder
                | ErrorKind::Expiry
                | ErrorKind::RootMismatch
                | ErrorKind::RootInvalid
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn wrapped_error_reports_inner_kind() {
        let err = TrustError::ContentSignature {
            reference: "abc".into(),
            source: Box::new(TrustError::Fetch {
                url: "http://127.0.0.1:1/chain".into(),
                reason: "connection refused".into(),
            }),
        };
        assert_eq!(err.kind(), ErrorKind::Fetch);
        assert!(err.source().is_some());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn root_mismatch_message() {
        let err = TrustError::RootMismatch {
            expected: "foo".into(),
            actual: "AA:BB".into(),
        };
        assert!(err
            .to_string()
            .contains("hash does not match expected root"));
        assert!(err.is_chain_error());
    }

    #[test]
    fn config_error_names_field() {
        let err = TrustError::config("apk", "id", "missing signer ID");
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("\"id\""));
    }
}
