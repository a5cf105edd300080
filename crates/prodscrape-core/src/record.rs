//! The record data model shared by the extraction engine and its consumers.
//!
//! A [`CandidateRecord`] is the page-scoped accumulation of extracted field
//! values. A field that could not be extracted has **no entry** — absence is
//! the canonical "missing" marker, and the human-readable default strings
//! (`"Product name not found"` etc.) exist only as display sentinels applied
//! at export time. Comparing live values against sentinel literals is how the
//! completeness check decides whether an extracted value is real, so the
//! sentinels are also part of the gate contract.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// Record fields, declared in the outbound field-order contract. The derived
/// `Ord` follows declaration order, which keeps map iteration and export
/// output in contract order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    BrandName,
    BrandUrl,
    Currency,
    DiscountPercentage,
    DiscountPrice,
    Gender,
    OfferImageUrl,
    OfferPrice,
    OfferUrl,
    ProductDescription,
    ProductName,
    Tags,
    VendorIconUrl,
    VendorName,
    VendorUrl,
}

/// Export default for a field that is still missing after the full pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayDefault {
    Text(&'static str),
    EmptyList,
    Null,
}

impl FieldName {
    /// All fields in contract order.
    pub const ALL: [FieldName; 15] = [
        FieldName::BrandName,
        FieldName::BrandUrl,
        FieldName::Currency,
        FieldName::DiscountPercentage,
        FieldName::DiscountPrice,
        FieldName::Gender,
        FieldName::OfferImageUrl,
        FieldName::OfferPrice,
        FieldName::OfferUrl,
        FieldName::ProductDescription,
        FieldName::ProductName,
        FieldName::Tags,
        FieldName::VendorIconUrl,
        FieldName::VendorName,
        FieldName::VendorUrl,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FieldName::BrandName => "brand_name",
            FieldName::BrandUrl => "brand_url",
            FieldName::Currency => "currency",
            FieldName::DiscountPercentage => "discount_percentage",
            FieldName::DiscountPrice => "discount_price",
            FieldName::Gender => "gender",
            FieldName::OfferImageUrl => "offer_image_url",
            FieldName::OfferPrice => "offer_price",
            FieldName::OfferUrl => "offer_url",
            FieldName::ProductDescription => "product_description",
            FieldName::ProductName => "product_name",
            FieldName::Tags => "tags",
            FieldName::VendorIconUrl => "vendor_icon_url",
            FieldName::VendorName => "vendor_name",
            FieldName::VendorUrl => "vendor_url",
        }
    }

    /// The value exported when the field is missing. `VendorIconUrl` has no
    /// sentinel (it exports as `null`), and `Tags` defaults to an empty list.
    #[must_use]
    pub fn display_default(self) -> DisplayDefault {
        match self {
            FieldName::BrandName => DisplayDefault::Text("Unknown brand"),
            FieldName::BrandUrl => DisplayDefault::Text("Unknown brand URL"),
            FieldName::Currency => DisplayDefault::Text("Unknown currency"),
            FieldName::DiscountPercentage | FieldName::DiscountPrice => {
                DisplayDefault::Text("No discount")
            }
            FieldName::Gender => DisplayDefault::Text("Unspecified"),
            FieldName::OfferImageUrl => DisplayDefault::Text("No image available"),
            FieldName::OfferPrice => DisplayDefault::Text("Price not available"),
            FieldName::OfferUrl => DisplayDefault::Text("No URL available"),
            FieldName::ProductDescription => DisplayDefault::Text("Description not found"),
            FieldName::ProductName => DisplayDefault::Text("Product name not found"),
            FieldName::Tags => DisplayDefault::EmptyList,
            FieldName::VendorIconUrl => DisplayDefault::Null,
            FieldName::VendorName => DisplayDefault::Text("Unknown vendor"),
            FieldName::VendorUrl => DisplayDefault::Text("Unknown vendor URL"),
        }
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single extracted field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    List(Vec<String>),
}

impl FieldValue {
    fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(Value::Null, Value::Number),
            FieldValue::List(items) => Value::Array(
                items.iter().map(|s| Value::String(s.clone())).collect(),
            ),
        }
    }
}

/// The in-progress record for one page.
///
/// Created empty by the record loader and owned by the page controller for
/// the lifetime of one page's processing; never shared across pages.
#[derive(Debug, Clone, Default)]
pub struct CandidateRecord {
    values: BTreeMap<FieldName, FieldValue>,
}

impl CandidateRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: FieldName, value: FieldValue) {
        self.values.insert(field, value);
    }

    #[must_use]
    pub fn get(&self, field: FieldName) -> Option<&FieldValue> {
        self.values.get(&field)
    }

    /// `true` when the field has no entry at all.
    #[must_use]
    pub fn is_missing(&self, field: FieldName) -> bool {
        !self.values.contains_key(&field)
    }

    /// `true` when the field is missing **or** its value is
    /// indistinguishable from the field's display default: an empty or
    /// sentinel-equal string (compared after trimming) or an empty list.
    /// Numbers are always real values.
    #[must_use]
    pub fn is_unfilled(&self, field: FieldName) -> bool {
        match self.values.get(&field) {
            None => true,
            Some(FieldValue::Text(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return true;
                }
                match field.display_default() {
                    DisplayDefault::Text(sentinel) => trimmed == sentinel,
                    DisplayDefault::EmptyList | DisplayDefault::Null => false,
                }
            }
            Some(FieldValue::Number(_)) => false,
            Some(FieldValue::List(items)) => items.is_empty(),
        }
    }

    /// Flattens the record into the outbound JSON object, substituting each
    /// field's display default for missing values. Keys are emitted in
    /// contract order.
    #[must_use]
    pub fn to_export(&self) -> Value {
        let mut out = Map::new();
        for field in FieldName::ALL {
            let value = match self.values.get(&field) {
                Some(v) => v.to_json(),
                None => match field.display_default() {
                    DisplayDefault::Text(sentinel) => Value::String(sentinel.to_string()),
                    DisplayDefault::EmptyList => Value::Array(Vec::new()),
                    DisplayDefault::Null => Value::Null,
                },
            };
            out.insert(field.as_str().to_string(), value);
        }
        Value::Object(out)
    }
}
