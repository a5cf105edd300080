//! Derived values: fields computed rather than extracted.
//!
//! Both functions return `None` for "no signal" — the candidate record keeps
//! its missing marker and the export layer renders the field's sentinel.

use crate::normalize::{classify_gender, clean_text};

/// Computes the discount percentage from the original and discounted price.
///
/// Returns `None` — the "no discount" marker, exported as the `No discount`
/// sentinel — when either input is absent or the original price is not
/// strictly positive. A numeric zero is never used for "no discount": a
/// genuine 0 % only arises from two equal, valid prices.
#[must_use]
pub fn compute_discount_percentage(
    offer_price: Option<f64>,
    discount_price: Option<f64>,
) -> Option<f64> {
    let offer = offer_price?;
    let discount = discount_price?;
    if offer > 0.0 {
        Some(((1.0 - discount / offer) * 1000.0).round() / 10.0)
    } else {
        None
    }
}

/// Resolves gender for a page.
///
/// A fixed configured value wins and is passed through the classifier, so
/// plain strings (`"Male"`) survive verbatim while URL-shaped values are
/// classified. Without a fixed value the page's own URL is the contextual
/// signal; a URL with no gender token yields `None`.
#[must_use]
pub fn derive_gender(fixed: Option<&str>, page_url: &str) -> Option<String> {
    if let Some(cleaned) = fixed.and_then(clean_text) {
        return Some(classify_gender(&cleaned));
    }

    match classify_gender(page_url).as_str() {
        "Unspecified" => None,
        classified => Some(classified.to_string()),
    }
}
