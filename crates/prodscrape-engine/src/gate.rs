//! The completeness gate: the final accept/reject decision for a record.
//!
//! Every required field must hold a real value — not missing, not empty,
//! not its display sentinel. The table is iterated in contract order and the
//! check short-circuits on the first failure so the caller can log exactly
//! which field killed the record.

use prodscrape_core::{CandidateRecord, FieldName};

/// Required fields in contract order. `tags` and `vendor_icon_url` are
/// optional and deliberately absent.
pub const REQUIRED_FIELDS: [FieldName; 13] = [
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
    FieldName::VendorName,
    FieldName::VendorUrl,
];

/// Outcome of the completeness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Complete,
    /// The first required field (in table order) that is still unfilled.
    Incomplete(FieldName),
}

/// Checks the record against the required-field table.
#[must_use]
pub fn check_completeness(record: &CandidateRecord) -> Verdict {
    for field in REQUIRED_FIELDS {
        if record.is_unfilled(field) {
            return Verdict::Incomplete(field);
        }
    }
    Verdict::Complete
}
