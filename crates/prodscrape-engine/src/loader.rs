//! The record loader: one page in, one candidate record out.
//!
//! Runs every entry of the field-specification table against the page,
//! applies the per-field normalization chain, and stores whatever survives.
//! A field whose selector matches nothing — or whose chain rejects every
//! raw value — simply stays missing; downstream steps (derivation, JSON-LD
//! backfill) get their chance before the completeness gate decides.

use prodscrape_core::{CandidateRecord, FieldName, FieldValue, ScrapeConfig};

use crate::fields::{field_specs, FieldSpec, Output, Source};
use crate::normalize::{apply_steps, clean_text, dedup_urls, Normalized};
use crate::page::FetchedPage;
use crate::probe::{verify_urls, UrlProber};

/// Builds the candidate record for one page.
///
/// Pure with respect to the page: all mutation is local to the returned
/// record. The only suspension points are the vendor-icon reachability
/// probes.
pub async fn load_record<P: UrlProber>(
    page: &FetchedPage,
    config: &ScrapeConfig,
    prober: &P,
) -> CandidateRecord {
    let mut record = CandidateRecord::new();

    for spec in field_specs(config) {
        if let Some(value) = extract_field(page, &spec) {
            record.set(spec.name, value);
        } else {
            tracing::debug!(field = %spec.name, "no value extracted; field stays at default");
        }
    }

    if let Some(value) = load_vendor_icon(page, config, prober).await {
        record.set(FieldName::VendorIconUrl, value);
    }

    if let Some(url) = clean_text(page.url()) {
        record.set(FieldName::OfferUrl, FieldValue::Text(url));
    }

    record
}

/// Extracts and normalizes one field per its spec.
fn extract_field(page: &FetchedPage, spec: &FieldSpec) -> Option<FieldValue> {
    let raw_values = match &spec.source {
        Source::Selector(selector) => page.select(selector),
        Source::Fixed(value) => vec![value.clone()],
    };
    tracing::trace!(field = %spec.name, count = raw_values.len(), "raw values extracted");

    let survivors: Vec<Normalized> = raw_values
        .into_iter()
        .map(|raw| {
            if spec.resolve_urls {
                page.urljoin(&raw)
            } else {
                raw
            }
        })
        .filter_map(|raw| apply_steps(&raw, spec.steps))
        .collect();

    collapse(survivors, spec.output)
}

/// Collapses the surviving normalized values per the spec's output stage.
fn collapse(survivors: Vec<Normalized>, output: Output) -> Option<FieldValue> {
    match output {
        Output::First => survivors.into_iter().next().map(|v| match v {
            Normalized::Text(s) => FieldValue::Text(s),
            Normalized::Number(n) => FieldValue::Number(n),
        }),
        Output::DedupList => {
            let texts = dedup_urls(texts_only(survivors));
            if texts.is_empty() {
                None
            } else {
                Some(FieldValue::List(texts))
            }
        }
        Output::List => {
            let texts = texts_only(survivors);
            if texts.is_empty() {
                None
            } else {
                Some(FieldValue::List(texts))
            }
        }
    }
}

fn texts_only(survivors: Vec<Normalized>) -> Vec<String> {
    survivors
        .into_iter()
        .filter_map(|v| match v {
            Normalized::Text(s) => Some(s),
            Normalized::Number(_) => None,
        })
        .collect()
}

/// Resolves the vendor icon URL.
///
/// Candidates come from the configured selector when one exists; otherwise
/// a conventional favicon URL is synthesized from the vendor URL. Either
/// way a candidate is only accepted once the reachability probe confirms
/// it, and the first confirmed candidate wins.
async fn load_vendor_icon<P: UrlProber>(
    page: &FetchedPage,
    config: &ScrapeConfig,
    prober: &P,
) -> Option<FieldValue> {
    let candidates: Vec<String> = match config.selectors.vendor_icon_url.as_deref() {
        Some(selector) => page
            .select(selector)
            .into_iter()
            .map(|raw| page.urljoin(&raw))
            .filter_map(|raw| clean_text(&raw))
            .collect(),
        None => {
            let vendor_url = config.vendor_url.as_deref()?;
            vec![format!("{}/favicon.ico", vendor_url.trim_end_matches('/'))]
        }
    };

    verify_urls(prober, candidates)
        .await
        .into_iter()
        .next()
        .map(FieldValue::Text)
}
