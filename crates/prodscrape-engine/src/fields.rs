//! The declarative field-specification table.
//!
//! One generic table replaces per-field extraction branches: each entry names
//! the field, where its raw values come from (a configured selector or a
//! fixed config value), the normalization chain to run, and how multiple
//! surviving values collapse into one field value.
//!
//! Three fields are deliberately absent from the table: `offer_url` (always
//! the page URL), `gender` (derived, see [`crate::derive`]), and
//! `vendor_icon_url` (needs the reachability probe and favicon synthesis,
//! handled by the loader directly).

use prodscrape_core::{FieldName, ScrapeConfig};

use crate::normalize::Step;

/// Where a field's raw values come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A CSS or XPath expression evaluated against the page.
    Selector(String),
    /// A site-wide fixed value from the config.
    Fixed(String),
}

/// How the surviving normalized values collapse into one field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// Keep the first surviving value.
    First,
    /// Keep all surviving values, deduplicated in first-seen order.
    DedupList,
    /// Keep all surviving values.
    List,
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: FieldName,
    pub source: Source,
    pub steps: &'static [Step],
    pub output: Output,
    /// Resolve each raw value to an absolute URL against the page before
    /// normalization (image fields).
    pub resolve_urls: bool,
}

impl FieldSpec {
    fn selector(name: FieldName, selector: &str, steps: &'static [Step], output: Output) -> Self {
        Self {
            name,
            source: Source::Selector(selector.to_string()),
            steps,
            output,
            resolve_urls: false,
        }
    }

    fn fixed(name: FieldName, value: &str, steps: &'static [Step]) -> Self {
        Self {
            name,
            source: Source::Fixed(value.to_string()),
            steps,
            output: Output::First,
            resolve_urls: false,
        }
    }
}

const TEXT: &[Step] = &[Step::CleanText];
const PRICE: &[Step] = &[Step::CleanPrice];
const DESCRIPTION: &[Step] = &[Step::StripHtml, Step::CleanText];
const IMAGE_URL: &[Step] = &[Step::CleanText, Step::KeepUrl];

/// Builds the extraction table for one site config. Entry order is fixed and
/// is the order fields are loaded in, so extraction is deterministic.
#[must_use]
pub fn field_specs(config: &ScrapeConfig) -> Vec<FieldSpec> {
    let selectors = &config.selectors;
    let mut specs = Vec::new();

    // Brand name prefers a selector; a fixed config value is the fallback.
    if let Some(selector) = selectors.brand_name.as_deref() {
        specs.push(FieldSpec::selector(
            FieldName::BrandName,
            selector,
            TEXT,
            Output::First,
        ));
    } else if let Some(value) = config.brand_name.as_deref() {
        specs.push(FieldSpec::fixed(FieldName::BrandName, value, TEXT));
    }

    // Only extract the discount percentage when a selector exists; otherwise
    // the derived-value step computes it after loading.
    if let Some(selector) = selectors.discount_percentage.as_deref() {
        specs.push(FieldSpec::selector(
            FieldName::DiscountPercentage,
            selector,
            PRICE,
            Output::First,
        ));
    }

    specs.push(FieldSpec::selector(
        FieldName::ProductName,
        &selectors.product_name,
        TEXT,
        Output::First,
    ));
    specs.push(FieldSpec::selector(
        FieldName::OfferPrice,
        &selectors.offer_price,
        PRICE,
        Output::First,
    ));

    if let Some(selector) = selectors.discount_price.as_deref() {
        specs.push(FieldSpec::selector(
            FieldName::DiscountPrice,
            selector,
            PRICE,
            Output::First,
        ));
    }
    if let Some(selector) = selectors.product_description.as_deref() {
        specs.push(FieldSpec::selector(
            FieldName::ProductDescription,
            selector,
            DESCRIPTION,
            Output::First,
        ));
    }
    if let Some(selector) = selectors.tags.as_deref() {
        specs.push(FieldSpec::selector(
            FieldName::Tags,
            selector,
            TEXT,
            Output::List,
        ));
    }

    if let Some(value) = config.brand_url.as_deref() {
        specs.push(FieldSpec::fixed(FieldName::BrandUrl, value, TEXT));
    }
    if let Some(value) = config.currency.as_deref() {
        specs.push(FieldSpec::fixed(FieldName::Currency, value, TEXT));
    }
    if let Some(value) = config.vendor_name.as_deref() {
        specs.push(FieldSpec::fixed(FieldName::VendorName, value, TEXT));
    }
    if let Some(value) = config.vendor_url.as_deref() {
        specs.push(FieldSpec::fixed(FieldName::VendorUrl, value, TEXT));
    }

    let mut image_spec = FieldSpec::selector(
        FieldName::OfferImageUrl,
        &selectors.offer_image_url,
        IMAGE_URL,
        Output::DedupList,
    );
    image_spec.resolve_urls = true;
    specs.push(image_spec);

    specs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(extra: serde_json::Value) -> ScrapeConfig {
        let mut base = serde_json::json!({
            "base_urls": ["https://shop.example.com"],
            "selectors": {
                "product_name": "h1::text",
                "offer_price": "span.price::text",
                "offer_image_url": "img::attr(src)"
            }
        });
        base.as_object_mut()
            .unwrap()
            .extend(extra.as_object().cloned().unwrap_or_default());
        serde_json::from_value(base).expect("valid test config")
    }

    fn spec_for(specs: &[FieldSpec], name: FieldName) -> Option<&FieldSpec> {
        specs.iter().find(|s| s.name == name)
    }

    #[test]
    fn minimal_config_builds_required_specs_plus_default_currency() {
        let specs = field_specs(&config(serde_json::json!({})));
        assert!(spec_for(&specs, FieldName::ProductName).is_some());
        assert!(spec_for(&specs, FieldName::OfferPrice).is_some());
        assert!(spec_for(&specs, FieldName::OfferImageUrl).is_some());
        // currency defaults to EUR in the config model
        assert_eq!(
            spec_for(&specs, FieldName::Currency).map(|s| &s.source),
            Some(&Source::Fixed("EUR".to_string()))
        );
        assert!(spec_for(&specs, FieldName::DiscountPercentage).is_none());
        assert!(spec_for(&specs, FieldName::Tags).is_none());
    }

    #[test]
    fn image_spec_resolves_urls_and_dedups() {
        let specs = field_specs(&config(serde_json::json!({})));
        let image = spec_for(&specs, FieldName::OfferImageUrl).unwrap();
        assert!(image.resolve_urls);
        assert_eq!(image.output, Output::DedupList);
        assert_eq!(image.steps, IMAGE_URL);
    }

    #[test]
    fn brand_name_selector_wins_over_fixed_value() {
        let specs = field_specs(&config(serde_json::json!({
            "brand_name": "Bonobo",
            "selectors": {
                "product_name": "h1::text",
                "offer_price": "span.price::text",
                "offer_image_url": "img::attr(src)",
                "brand_name": "span.brand::text"
            }
        })));
        let brand = spec_for(&specs, FieldName::BrandName).unwrap();
        assert_eq!(brand.source, Source::Selector("span.brand::text".to_string()));
    }

    #[test]
    fn brand_name_fixed_value_used_without_selector() {
        let specs = field_specs(&config(serde_json::json!({ "brand_name": "Bonobo" })));
        let brand = spec_for(&specs, FieldName::BrandName).unwrap();
        assert_eq!(brand.source, Source::Fixed("Bonobo".to_string()));
    }

    #[test]
    fn discount_percentage_spec_present_only_with_selector() {
        let specs = field_specs(&config(serde_json::json!({
            "selectors": {
                "product_name": "h1::text",
                "offer_price": "span.price::text",
                "offer_image_url": "img::attr(src)",
                "discount_percentage": "span.promo::text"
            }
        })));
        let discount = spec_for(&specs, FieldName::DiscountPercentage).unwrap();
        assert_eq!(discount.steps, PRICE);
    }

    #[test]
    fn table_order_is_stable() {
        let a = field_specs(&config(serde_json::json!({ "vendor_name": "Vendor" })));
        let b = field_specs(&config(serde_json::json!({ "vendor_name": "Vendor" })));
        let names_a: Vec<FieldName> = a.iter().map(|s| s.name).collect();
        let names_b: Vec<FieldName> = b.iter().map(|s| s.name).collect();
        assert_eq!(names_a, names_b);
    }
}
