//! X5U certificate chain retrieval.

use reqwest::blocking::Client;
use std::io::Read;
use std::time::Duration;
use tracing::debug;
use trustmark_core::{hash, Result, TrustError};
use url::Url;

/// Retrieves the PEM bundle an X5U reference points at.
///
/// One attempt per call; failures are returned as-is.
pub trait ChainFetcher: Send + Sync {
    /// Fetch the raw bundle at `url`.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Largest chain bundle [`HttpFetcher`] reads by default.
pub const MAX_CHAIN_BYTES: u64 = 1024 * 1024;

/// Blocking HTTP(S) fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
    max_bytes: u64,
}

impl HttpFetcher {
    /// Build a fetcher; `timeout` of `None` leaves the request unbounded.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        // reqwest's blocking client defaults to 30s; `None` clears it.
        let http = Client::builder()
            .user_agent(format!("trustmark/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| TrustError::config("x5u fetcher", "fetch_timeout_secs", e.to_string()))?;
        Ok(Self {
            http,
            max_bytes: MAX_CHAIN_BYTES,
        })
    }

    /// Override the response size limit.
    #[must_use]
    pub const fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn fetch_error(url: &str, reason: impl ToString) -> TrustError {
        TrustError::Fetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl ChainFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let parsed = Url::parse(url).map_err(|e| Self::fetch_error(url, e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Self::fetch_error(
                url,
                format!("unsupported scheme {:?}", parsed.scheme()),
            ));
        }

        debug!(url = %parsed, "fetching certificate chain");
        let response = self
            .http
            .get(parsed)
            .send()
            .map_err(|e| Self::fetch_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::fetch_error(url, format!("unexpected status {status}")));
        }

        let too_large =
            || Self::fetch_error(url, format!("response exceeds {} bytes", self.max_bytes));
        if response.content_length().is_some_and(|len| len > self.max_bytes) {
            return Err(too_large());
        }
        let mut body = Vec::new();
        response
            .take(self.max_bytes.saturating_add(1))
            .read_to_end(&mut body)
            .map_err(|e| Self::fetch_error(url, e))?;
        if body.len() as u64 > self.max_bytes {
            return Err(too_large());
        }
        debug!(
            url = %url,
            bytes = body.len(),
            sha256 = %hash::sha256_hex(&body),
            "certificate chain fetched"
        );
        Ok(body)
    }
}
