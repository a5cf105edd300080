//! Per-page orchestration: the pipeline state machine.
//!
//! One rendered page runs through
//! `Fetched → Extracting → ComputingDerived → ResolvingFallback →
//! GateChecking → {Emitted | Dropped}`, optionally ending in
//! `PaginatingNext`. A bot-challenge status (403/429) aborts immediately
//! after `Fetched` and is reported distinctly from other HTTP failures;
//! neither produces a record or a pagination continuation.

use prodscrape_core::{CandidateRecord, FieldName, FieldValue, ScrapeConfig};

use crate::derive::{compute_discount_percentage, derive_gender};
use crate::fallback::{backfill_record, extract_product_payload, has_unfilled_fallback_field};
use crate::gate::{check_completeness, Verdict};
use crate::loader::load_record;
use crate::normalize::clean_price;
use crate::page::FetchedPage;
use crate::probe::UrlProber;

/// Pipeline states, logged as the page advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageState {
    Fetched,
    Extracting,
    ComputingDerived,
    ResolvingFallback,
    GateChecking,
    Emitted,
    Dropped,
    PaginatingNext,
}

fn enter(state: PageState, url: &str) {
    tracing::debug!(?state, url, "pipeline state");
}

/// Terminal result of processing one page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// The record passed the gate; `record` is the flat export object.
    Emitted {
        record: serde_json::Value,
        next_page: Option<String>,
    },
    /// The record failed the gate on `missing_field`. Pagination still
    /// continues — one incomplete product does not end the listing walk.
    Dropped {
        missing_field: FieldName,
        next_page: Option<String>,
    },
    /// 403/429: anti-bot protection. Nothing emitted, no pagination.
    BotChallenge { status: u16 },
    /// Any other non-2xx status. Nothing emitted, no pagination.
    HttpFailure { status: u16 },
}

/// Runs the full pipeline for one page.
pub async fn process_page<P: UrlProber>(
    page: &FetchedPage,
    config: &ScrapeConfig,
    prober: &P,
) -> PageOutcome {
    enter(PageState::Fetched, page.url());

    let status = page.status();
    if status == 403 || status == 429 {
        tracing::warn!(
            status,
            url = page.url(),
            "access denied - anti-bot protection detected"
        );
        return PageOutcome::BotChallenge { status };
    }
    if !(200..300).contains(&status) {
        tracing::error!(status, url = page.url(), "HTTP error; skipping page");
        return PageOutcome::HttpFailure { status };
    }

    enter(PageState::Extracting, page.url());
    let mut record = load_record(page, config, prober).await;

    enter(PageState::ComputingDerived, page.url());
    fill_derived_fields(&mut record, config, page.url());

    if has_unfilled_fallback_field(&record) {
        if let Some(payload) = extract_product_payload(page.body()) {
            enter(PageState::ResolvingFallback, page.url());
            backfill_record(&mut record, &payload, config.brand_url.as_deref(), prober).await;
        }
    }

    enter(PageState::GateChecking, page.url());
    let verdict = check_completeness(&record);

    let next_page = next_page_url(page, config);
    if next_page.is_some() {
        enter(PageState::PaginatingNext, page.url());
    }

    match verdict {
        Verdict::Complete => {
            enter(PageState::Emitted, page.url());
            tracing::info!(url = page.url(), "record complete; emitting");
            PageOutcome::Emitted {
                record: record.to_export(),
                next_page,
            }
        }
        Verdict::Incomplete(missing_field) => {
            enter(PageState::Dropped, page.url());
            tracing::info!(
                url = page.url(),
                field = %missing_field,
                "incomplete record skipped"
            );
            PageOutcome::Dropped {
                missing_field,
                next_page,
            }
        }
    }
}

/// Fills `discount_percentage` (when no selector claimed it) and `gender`.
fn fill_derived_fields(record: &mut CandidateRecord, config: &ScrapeConfig, page_url: &str) {
    if config.selectors.discount_percentage.is_none() {
        let computed = compute_discount_percentage(
            number_of(record, FieldName::OfferPrice),
            number_of(record, FieldName::DiscountPrice),
        );
        if let Some(percentage) = computed {
            record.set(FieldName::DiscountPercentage, FieldValue::Number(percentage));
        }
    }

    if let Some(gender) = derive_gender(config.gender.as_deref(), page_url) {
        record.set(FieldName::Gender, FieldValue::Text(gender));
    }
}

/// Reads a field as a number, parsing text values the way the price cleaner
/// does so selector-extracted strings still participate in derivation.
fn number_of(record: &CandidateRecord, field: FieldName) -> Option<f64> {
    match record.get(field)? {
        FieldValue::Number(n) => Some(*n),
        FieldValue::Text(s) => clean_price(s),
        FieldValue::List(_) => None,
    }
}

/// The next page to fetch, when pagination is enabled and the selector
/// matches. Always resolved to an absolute URL.
fn next_page_url(page: &FetchedPage, config: &ScrapeConfig) -> Option<String> {
    if !config.pagination.enabled {
        return None;
    }
    let selector = config.pagination.selector.as_deref()?;
    let raw = page.select(selector).into_iter().next()?;
    let target = page.urljoin(raw.trim());
    tracing::info!(url = page.url(), next = %target, "following pagination");
    Some(target)
}
