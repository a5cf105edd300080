//! JSON-LD structured-data fallback.
//!
//! Product pages commonly embed a schema.org `Product` object in a
//! `<script type="application/ld+json">` block. When direct selector
//! extraction left key fields unfilled, that block is a second chance:
//! each backfill rule fires independently and only for a field that is
//! still at its default, so a real extracted value is never overwritten.

use std::sync::LazyLock;

use prodscrape_core::{CandidateRecord, FieldName, FieldValue};
use regex::Regex;
use serde_json::Value;

use crate::normalize::{clean_text, strip_html};
use crate::page::resolve_url;
use crate::probe::{verify_urls, UrlProber};

static JSON_LD_SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid json-ld script regex")
});

/// The fields eligible for backfill; any of them unfilled makes the
/// resolver worth running.
const FALLBACK_CHECK_FIELDS: [FieldName; 5] = [
    FieldName::DiscountPrice,
    FieldName::OfferImageUrl,
    FieldName::OfferPrice,
    FieldName::ProductDescription,
    FieldName::ProductName,
];

/// `true` when at least one backfill-eligible field is still unfilled.
#[must_use]
pub fn has_unfilled_fallback_field(record: &CandidateRecord) -> bool {
    FALLBACK_CHECK_FIELDS
        .iter()
        .any(|&field| record.is_unfilled(field))
}

/// Scans the page for JSON-LD blocks and returns the first one whose
/// `@type` identifies a product (case-insensitively). Top-level arrays are
/// searched element by element, so `[{Organization}, {Product}]` payloads
/// resolve to the product object. Malformed blocks are skipped.
#[must_use]
pub fn extract_product_payload(html: &str) -> Option<Value> {
    for cap in JSON_LD_SCRIPT_RE.captures_iter(html) {
        let raw = cap.get(1).map_or("", |m| m.as_str()).trim();
        if raw.is_empty() {
            continue;
        }
        let Ok(value) = serde_json::from_str::<Value>(raw) else {
            tracing::debug!("skipping malformed JSON-LD block");
            continue;
        };

        match value {
            Value::Object(_) if is_product_node(&value) => return Some(value),
            Value::Array(items) => {
                if let Some(product) = items.into_iter().find(is_product_node) {
                    return Some(product);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_product_node(value: &Value) -> bool {
    value
        .get("@type")
        .and_then(Value::as_str)
        .is_some_and(|t| t.eq_ignore_ascii_case("product"))
}

/// Backfills unfilled record fields from a product payload.
///
/// Image candidates are normalized to a list, resolved against the brand
/// URL when relative, and filtered through the reachability probe; the
/// field is only written when at least one candidate survives.
pub async fn backfill_record<P: UrlProber>(
    record: &mut CandidateRecord,
    payload: &Value,
    brand_url: Option<&str>,
    prober: &P,
) {
    if record.is_unfilled(FieldName::ProductDescription) {
        if let Some(description) = payload.get("description").and_then(Value::as_str) {
            if let Some(cleaned) = clean_text(&strip_html(description)) {
                tracing::debug!("product_description backfilled from JSON-LD");
                record.set(FieldName::ProductDescription, FieldValue::Text(cleaned));
            }
        }
    }

    if record.is_unfilled(FieldName::ProductName) {
        if let Some(name) = payload.get("name").and_then(Value::as_str) {
            if let Some(cleaned) = clean_text(&strip_html(name)) {
                tracing::debug!("product_name backfilled from JSON-LD");
                record.set(FieldName::ProductName, FieldValue::Text(cleaned));
            }
        }
    }

    if record.is_unfilled(FieldName::OfferImageUrl) {
        let candidates = image_candidates(payload.get("image"), brand_url);
        if !candidates.is_empty() {
            let verified = verify_urls(prober, candidates).await;
            if verified.is_empty() {
                tracing::debug!("no JSON-LD image candidate survived verification");
            } else {
                record.set(FieldName::OfferImageUrl, FieldValue::List(verified));
            }
        }
    }
}

/// Normalizes the payload's `image` entry — scalar or list — into absolute
/// URL candidates. Relative entries need a brand URL to resolve against;
/// without one they are dropped.
fn image_candidates(image: Option<&Value>, brand_url: Option<&str>) -> Vec<String> {
    let raw_entries: Vec<&str> = match image {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };

    raw_entries
        .into_iter()
        .filter_map(|entry| {
            if entry.starts_with("http://") || entry.starts_with("https://") {
                return Some(entry.to_string());
            }
            let base = brand_url?;
            let resolved = resolve_url(base, entry);
            resolved.starts_with("http").then_some(resolved)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AcceptAll;
    struct RejectAll;

    impl UrlProber for AcceptAll {
        async fn probe(&self, url: &str) -> Option<String> {
            Some(url.to_string())
        }
    }

    impl UrlProber for RejectAll {
        async fn probe(&self, _url: &str) -> Option<String> {
            None
        }
    }

    fn html_with_jsonld(json: &str) -> String {
        format!(
            "<html><head><script type=\"application/ld+json\">{json}</script></head></html>"
        )
    }

    // -----------------------------------------------------------------------
    // extract_product_payload
    // -----------------------------------------------------------------------

    #[test]
    fn extracts_single_product_object() {
        let html = html_with_jsonld(r#"{"@type": "Product", "name": "Chemise"}"#);
        let payload = extract_product_payload(&html).expect("product payload");
        assert_eq!(payload["name"], "Chemise");
    }

    #[test]
    fn type_check_is_case_insensitive() {
        let html = html_with_jsonld(r#"{"@type": "PRODUCT", "name": "Chemise"}"#);
        assert!(extract_product_payload(&html).is_some());
    }

    #[test]
    fn finds_product_inside_top_level_array() {
        let html = html_with_jsonld(
            r#"[{"@type": "Organization", "name": "Shop"}, {"@type": "product", "name": "Chemise"}]"#,
        );
        let payload = extract_product_payload(&html).expect("product payload");
        assert_eq!(payload["name"], "Chemise");
    }

    #[test]
    fn skips_non_product_blocks() {
        let html = html_with_jsonld(r#"{"@type": "BreadcrumbList"}"#);
        assert!(extract_product_payload(&html).is_none());
    }

    #[test]
    fn skips_malformed_json_and_keeps_scanning() {
        let html = format!(
            "{}{}",
            html_with_jsonld("{not valid json"),
            html_with_jsonld(r#"{"@type": "Product", "name": "Chemise"}"#)
        );
        assert!(extract_product_payload(&html).is_some());
    }

    #[test]
    fn page_without_jsonld_yields_none() {
        assert!(extract_product_payload("<html><body>nothing</body></html>").is_none());
    }

    // -----------------------------------------------------------------------
    // has_unfilled_fallback_field
    // -----------------------------------------------------------------------

    #[test]
    fn fresh_record_has_unfilled_fields() {
        assert!(has_unfilled_fallback_field(&CandidateRecord::new()));
    }

    #[test]
    fn record_with_all_check_fields_filled_does_not_trigger() {
        let mut record = CandidateRecord::new();
        record.set(FieldName::DiscountPrice, FieldValue::Number(40.0));
        record.set(
            FieldName::OfferImageUrl,
            FieldValue::List(vec!["https://cdn.example.com/a.jpg".to_string()]),
        );
        record.set(FieldName::OfferPrice, FieldValue::Number(50.0));
        record.set(
            FieldName::ProductDescription,
            FieldValue::Text("desc".to_string()),
        );
        record.set(FieldName::ProductName, FieldValue::Text("name".to_string()));
        assert!(!has_unfilled_fallback_field(&record));
    }

    // -----------------------------------------------------------------------
    // backfill_record
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn backfills_description_with_html_stripped() {
        let mut record = CandidateRecord::new();
        let payload = serde_json::json!({
            "@type": "Product",
            "description": "<p>Nice shirt</p>"
        });
        backfill_record(&mut record, &payload, None, &RejectAll).await;
        assert_eq!(
            record.get(FieldName::ProductDescription),
            Some(&FieldValue::Text("Nice shirt".to_string()))
        );
    }

    #[tokio::test]
    async fn does_not_overwrite_a_real_product_name() {
        let mut record = CandidateRecord::new();
        record.set(FieldName::ProductName, FieldValue::Text("Real name".to_string()));
        let payload = serde_json::json!({ "@type": "Product", "name": "Payload name" });
        backfill_record(&mut record, &payload, None, &AcceptAll).await;
        assert_eq!(
            record.get(FieldName::ProductName),
            Some(&FieldValue::Text("Real name".to_string()))
        );
    }

    #[tokio::test]
    async fn overwrites_sentinel_equal_product_name() {
        let mut record = CandidateRecord::new();
        record.set(
            FieldName::ProductName,
            FieldValue::Text("Product name not found".to_string()),
        );
        let payload = serde_json::json!({ "@type": "Product", "name": "Chemise" });
        backfill_record(&mut record, &payload, None, &AcceptAll).await;
        assert_eq!(
            record.get(FieldName::ProductName),
            Some(&FieldValue::Text("Chemise".to_string()))
        );
    }

    #[tokio::test]
    async fn scalar_image_becomes_single_element_list() {
        let mut record = CandidateRecord::new();
        let payload = serde_json::json!({
            "@type": "Product",
            "image": "https://cdn.example.com/a.jpg"
        });
        backfill_record(&mut record, &payload, None, &AcceptAll).await;
        assert_eq!(
            record.get(FieldName::OfferImageUrl),
            Some(&FieldValue::List(vec![
                "https://cdn.example.com/a.jpg".to_string()
            ]))
        );
    }

    #[tokio::test]
    async fn relative_images_resolve_against_brand_url() {
        let mut record = CandidateRecord::new();
        let payload = serde_json::json!({
            "@type": "Product",
            "image": ["/media/a.jpg", "https://cdn.example.com/b.jpg"]
        });
        backfill_record(
            &mut record,
            &payload,
            Some("https://brand.example.com"),
            &AcceptAll,
        )
        .await;
        assert_eq!(
            record.get(FieldName::OfferImageUrl),
            Some(&FieldValue::List(vec![
                "https://brand.example.com/media/a.jpg".to_string(),
                "https://cdn.example.com/b.jpg".to_string()
            ]))
        );
    }

    #[tokio::test]
    async fn image_field_retained_when_no_candidate_survives() {
        let mut record = CandidateRecord::new();
        let payload = serde_json::json!({
            "@type": "Product",
            "image": ["https://cdn.example.com/dead.jpg"]
        });
        backfill_record(&mut record, &payload, None, &RejectAll).await;
        assert!(record.is_missing(FieldName::OfferImageUrl));
    }

    #[tokio::test]
    async fn relative_image_without_brand_url_is_dropped() {
        let mut record = CandidateRecord::new();
        let payload = serde_json::json!({ "@type": "Product", "image": "/media/a.jpg" });
        backfill_record(&mut record, &payload, None, &AcceptAll).await;
        assert!(record.is_missing(FieldName::OfferImageUrl));
    }
}
