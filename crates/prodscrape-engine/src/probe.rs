//! Image-reachability probing.
//!
//! Candidate image and icon URLs are only accepted into a record after a
//! lightweight HEAD existence check. The prober is an injected capability so
//! the loader and fallback resolver stay testable with deterministic
//! stand-ins instead of live requests.

use std::time::Duration;

use crate::EngineError;

/// Timeout for one existence check. One unreachable CDN must not stall the
/// rest of the page's pipeline, so each probe times out independently.
const PROBE_TIMEOUT_SECS: u64 = 5;

/// Checks whether a URL resolves to a reachable resource.
pub trait UrlProber {
    /// Returns the URL unchanged when it answers with a 2xx status, `None`
    /// on any error, timeout, or non-2xx response. Never fails loudly.
    fn probe(&self, url: &str) -> impl std::future::Future<Output = Option<String>> + Send;
}

/// HEAD-request prober backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    /// # Errors
    ///
    /// Returns [`EngineError::Http`] if the underlying client cannot be
    /// constructed.
    pub fn new() -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

impl UrlProber for HttpProber {
    async fn probe(&self, url: &str) -> Option<String> {
        match self.client.head(url).send().await {
            Ok(response) if response.status().is_success() => Some(url.to_string()),
            Ok(response) => {
                tracing::debug!(url, status = response.status().as_u16(), "image probe rejected");
                None
            }
            Err(error) => {
                tracing::debug!(url, error = %error, "image probe failed");
                None
            }
        }
    }
}

/// Probes all candidates concurrently and returns the survivors in input
/// order. Verification is idempotent and side-effect-free, so ordering of
/// the requests themselves does not matter.
pub async fn verify_urls<P: UrlProber>(prober: &P, candidates: Vec<String>) -> Vec<String> {
    let probes = candidates.iter().map(|url| prober.probe(url));
    futures::future::join_all(probes)
        .await
        .into_iter()
        .flatten()
        .collect()
}
