//! HTTP page fetching.
//!
//! Produces the [`FetchedPage`] objects the pipeline consumes. Each request
//! carries a User-Agent freshly drawn from the rotation pool plus the
//! configured `Accept-Language` and `Referer` headers. Non-2xx responses are
//! returned as pages, not errors — the page controller owns the abort
//! decision and distinguishes bot challenges from other failures.

use std::time::Duration;

use prodscrape_core::{HeadersConfig, ScrapeConfig};
use reqwest::Client;

use crate::error::EngineError;
use crate::page::FetchedPage;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct PageFetcher {
    client: Client,
    headers: HeadersConfig,
    /// Delay in seconds between consecutive requests.
    delay_secs: u64,
}

impl PageFetcher {
    /// Creates a fetcher for one site config.
    ///
    /// When the config asks for browser rendering or scroll simulation,
    /// that work belongs to an external rendering collaborator; this
    /// fetcher logs the request and serves the raw HTTP body.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: &ScrapeConfig) -> Result<Self, EngineError> {
        if config.anti_bot.use_playwright {
            tracing::warn!(
                "config requests browser rendering; serving raw HTTP bodies \
                 (rendering is delegated to the fetch collaborator)"
            );
        }
        if config.scroll.enabled {
            tracing::debug!(
                times = config.scroll.times,
                delay = config.scroll.delay,
                "scroll simulation configured; ignored by the HTTP fetcher"
            );
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            headers: config.headers.clone(),
            delay_secs: config.anti_bot.delay,
        })
    }

    /// The configured inter-request delay in seconds.
    #[must_use]
    pub fn delay_secs(&self) -> u64 {
        self.delay_secs
    }

    /// Fetches one page. The returned page carries the final URL after
    /// redirects and the response status; callers must not assume 2xx.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Http`] on transport failures (DNS, TLS,
    /// timeout). HTTP-level failures are not errors here.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, EngineError> {
        let user_agent = self.headers.random_user_agent();
        tracing::info!(url, user_agent, "sending request");

        let mut request = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, user_agent)
            .header(
                reqwest::header::ACCEPT_LANGUAGE,
                self.headers.accept_language.as_str(),
            );
        if let Some(referer) = self.headers.referer.as_deref() {
            request = request.header(reqwest::header::REFERER, referer);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();

        tracing::debug!(url = %final_url, status, bytes = body.len(), "page fetched");
        Ok(FetchedPage::new(final_url, status, body))
    }
}
