//! The crawl loop: start URLs, pagination, and record emission.
//!
//! Pages share no mutable state, so a failure on one start URL never
//! poisons the others; transport errors are logged and the crawl moves on,
//! mirroring how the rest of the pipeline degrades instead of aborting.

use std::time::Duration;

use prodscrape_core::ScrapeConfig;

use crate::controller::{process_page, PageOutcome};
use crate::error::EngineError;
use crate::fetch::PageFetcher;
use crate::probe::UrlProber;

/// Maximum pages followed per start URL. Prevents infinite loops on
/// self-referencing pagination links.
pub const MAX_PAGES: usize = 200;

/// Counters for one crawl run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub pages_processed: usize,
    pub records_emitted: usize,
    pub records_dropped: usize,
}

/// Crawls every configured start URL, following pagination, and hands each
/// completed record to `emit`.
///
/// # Errors
///
/// Returns [`EngineError::PaginationLimit`] when one start URL's pagination
/// chain exceeds [`MAX_PAGES`]. Transport failures on individual pages are
/// logged and skipped, not propagated.
pub async fn crawl_site<P, F>(
    fetcher: &PageFetcher,
    config: &ScrapeConfig,
    prober: &P,
    mut emit: F,
) -> Result<CrawlSummary, EngineError>
where
    P: UrlProber,
    F: FnMut(serde_json::Value),
{
    let mut summary = CrawlSummary::default();
    let mut is_first_request = true;

    tracing::info!(count = config.base_urls.len(), "crawl starting");

    for start_url in &config.base_urls {
        let mut current = Some(start_url.clone());
        let mut page_count = 0usize;

        while let Some(url) = current.take() {
            page_count += 1;
            if page_count > MAX_PAGES {
                return Err(EngineError::PaginationLimit {
                    start_url: start_url.clone(),
                    max_pages: MAX_PAGES,
                });
            }

            if !is_first_request && fetcher.delay_secs() > 0 {
                tokio::time::sleep(Duration::from_secs(fetcher.delay_secs())).await;
            }
            is_first_request = false;

            let page = match fetcher.fetch(&url).await {
                Ok(page) => page,
                Err(error) => {
                    tracing::error!(url, error = %error, "request failed; skipping start URL");
                    break;
                }
            };

            summary.pages_processed += 1;
            match process_page(&page, config, prober).await {
                PageOutcome::Emitted { record, next_page } => {
                    summary.records_emitted += 1;
                    emit(record);
                    current = next_page;
                }
                PageOutcome::Dropped { next_page, .. } => {
                    summary.records_dropped += 1;
                    current = next_page;
                }
                PageOutcome::BotChallenge { .. } | PageOutcome::HttpFailure { .. } => {
                    // Already logged by the controller; this start URL ends here.
                }
            }
        }
    }

    tracing::info!(
        pages = summary.pages_processed,
        emitted = summary.records_emitted,
        dropped = summary.records_dropped,
        "crawl finished"
    );
    Ok(summary)
}
