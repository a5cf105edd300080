//! Field normalizers: pure cleaning functions composed into per-field chains.
//!
//! Every normalizer is total over `&str` and signals "not extractable via
//! this path" with `None`; a chain short-circuits on the first `None`. The
//! caller interprets `None` as "field stays missing" — it is never an error.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<[^>]+>").expect("valid tag regex"));

/// Gender-indicating URL tokens, scanned in order. Indexes at or below
/// [`FEMALE_MAX_INDEX`] map to `Female`, the rest to `Male`.
const GENDER_KEYWORDS: [&str; 10] = [
    "femme", "femmes", "women", "womens", "woman", "homme", "hommes", "men", "mens", "man",
];
const FEMALE_MAX_INDEX: usize = 4;

/// One step of a normalization chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Trim whitespace; reject empty input.
    CleanText,
    /// Parse a price/percentage string to a number.
    CleanPrice,
    /// Decode entities and strip markup.
    StripHtml,
    /// Map a gendered URL to `Female`/`Male`/`Unspecified`.
    ClassifyGender,
    /// Keep only absolute http(s) URLs.
    KeepUrl,
}

/// Result of a chain: cleaned text or a parsed number.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Text(String),
    Number(f64),
}

/// Runs `steps` over one raw value. `CleanPrice` is terminal: it converts
/// the running text into a number.
#[must_use]
pub fn apply_steps(raw: &str, steps: &[Step]) -> Option<Normalized> {
    let mut current = raw.to_string();
    for step in steps {
        match step {
            Step::CleanText => current = clean_text(&current)?,
            Step::CleanPrice => return clean_price(&current).map(Normalized::Number),
            Step::StripHtml => current = strip_html(&current),
            Step::ClassifyGender => current = classify_gender(&current),
            Step::KeepUrl => current = keep_url(&current)?,
        }
    }
    Some(Normalized::Text(current))
}

/// Cleans a price or percentage string and parses it as a number.
///
/// Strips `%`, `€`, `EUR`, and the minus sign that discount labels carry
/// (`"-20%"` means a 20 % discount, not a negative value), removes space
/// and no-break-space thousand separators, and converts a comma decimal
/// separator to a dot. When both separators appear, everything up to the
/// last one is treated as grouping (`"1.299,99"` → `1299.99`).
#[must_use]
pub fn clean_price(value: &str) -> Option<f64> {
    let mut cleaned = value.replace(',', ".");
    for token in ["%", "€", "EUR", "-", " ", "\u{a0}", "\u{202f}"] {
        cleaned = cleaned.replace(token, "");
    }

    if let Some(last_dot) = cleaned.rfind('.') {
        let (grouping, decimal) = cleaned.split_at(last_dot);
        cleaned = format!("{}{}", grouping.replace('.', ""), decimal);
    }

    cleaned.trim().parse::<f64>().ok()
}

/// Trims surrounding whitespace; empty input is not a value.
#[must_use]
pub fn clean_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Strips HTML markup from a description fragment.
///
/// Entities are decoded twice because CMS-exported descriptions are often
/// double-encoded (`&amp;eacute;`). Tags are replaced by a space so text
/// from adjacent block elements stays separated, then whitespace runs are
/// collapsed. Idempotent.
#[must_use]
pub fn strip_html(value: &str) -> String {
    let decoded = html_escape::decode_html_entities(value);
    let decoded = html_escape::decode_html_entities(&decoded).into_owned();
    let no_tags = TAG_RE.replace_all(&decoded, " ");
    no_tags.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Classifies gender from a URL. Non-URL input passes through unchanged so
/// fixed gender strings survive the chain verbatim.
#[must_use]
pub fn classify_gender(value: &str) -> String {
    let lower = value.to_lowercase();
    if !lower.starts_with("http") {
        return value.to_string();
    }

    for (idx, keyword) in GENDER_KEYWORDS.iter().enumerate() {
        if lower.contains(keyword) {
            return if idx <= FEMALE_MAX_INDEX {
                "Female"
            } else {
                "Male"
            }
            .to_string();
        }
    }
    "Unspecified".to_string()
}

/// Keeps only values that are already absolute http(s) URLs.
#[must_use]
pub fn keep_url(value: &str) -> Option<String> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Some(value.to_string())
    } else {
        None
    }
}

/// Removes exact duplicates, preserving first-seen order.
#[must_use]
pub fn dedup_urls(values: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(values.len());
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
