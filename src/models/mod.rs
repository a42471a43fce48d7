//! Data models for extracted marketplace product records

use std::fmt;

use serde::{Serialize, Serializer};

/// Display string for a value that could not be extracted.
pub const NOT_AVAILABLE: &str = "N/A";

/// A scraped text value, or the marker that extraction found nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Field {
    Found(String),
    #[default]
    Missing,
}

impl Field {
    /// Wraps a raw value, treating blank text as missing.
    pub fn from_text(value: Option<String>) -> Self {
        match value {
            Some(text) if !text.trim().is_empty() => Self::Found(text),
            _ => Self::Missing,
        }
    }

    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Self::Found(value) => Some(value),
            Self::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// The value as shown to people and written to exports.
    pub fn display(&self) -> &str {
        self.as_deref().unwrap_or(NOT_AVAILABLE)
    }
}

impl From<Option<String>> for Field {
    fn from(value: Option<String>) -> Self {
        Self::from_text(value)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.display())
    }
}

/// Whether a search result was paid placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ListingType {
    #[default]
    Organic,
    Sponsored,
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Organic => f.write_str("Organic"),
            Self::Sponsored => f.write_str("Sponsored"),
        }
    }
}

/// Availability as read from a product-detail page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum StockStatus {
    InStock,
    OutOfStock,
    #[default]
    Unknown,
}

impl StockStatus {
    /// Classifies the text of the availability element.
    pub fn from_status_text(text: Option<&str>) -> Self {
        match text {
            Some(t) if t.contains("In stock") => Self::InStock,
            Some(t) if t.contains("Currently unavailable") => Self::OutOfStock,
            _ => Self::Unknown,
        }
    }

    /// Spreadsheet-style label used in exports.
    pub fn export_label(self) -> &'static str {
        match self {
            Self::InStock => "Yes",
            Self::OutOfStock => "No",
            Self::Unknown => "Unknown",
        }
    }
}

/// A search-result item before it has been placed in the final ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductDraft {
    pub external_id: Option<String>,
    pub title: Field,
    pub price: Field,
    pub link: Field,
    pub rating: Field,
    pub review_count: Field,
    pub listing_type: ListingType,
}

/// One ranked row of a keyword search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRecord {
    pub rank: usize,
    pub external_id: Option<String>,
    pub title: Field,
    pub price: Field,
    pub link: Field,
    pub rating: Field,
    pub review_count: Field,
    pub listing_type: ListingType,
}

impl ProductRecord {
    pub fn from_draft(rank: usize, draft: ProductDraft) -> Self {
        Self {
            rank,
            external_id: draft.external_id,
            title: draft.title,
            price: draft.price,
            link: draft.link,
            rating: draft.rating,
            review_count: draft.review_count,
            listing_type: draft.listing_type,
        }
    }
}

/// Details scraped from a single product page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductDetailRecord {
    pub external_id: Option<String>,
    pub title: Field,
    pub price: Field,
    pub rating: Field,
    pub review_count: Field,
    pub link: Field,
    pub best_seller_ranks: Vec<String>,
    pub stock_status: StockStatus,
}

impl ProductDetailRecord {
    /// Best-seller ranks joined for display, or the sentinel when there are none.
    pub fn best_seller_display(&self) -> String {
        if self.best_seller_ranks.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            self.best_seller_ranks.join(" | ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_becomes_missing() {
        assert_eq!(Field::from_text(Some("   ".to_string())), Field::Missing);
        assert_eq!(Field::from_text(None), Field::Missing);
        assert_eq!(
            Field::from_text(Some("4.3".to_string())),
            Field::Found("4.3".to_string())
        );
    }

    #[test]
    fn missing_field_serializes_as_sentinel() {
        let json = serde_json::to_string(&Field::Missing).unwrap();
        assert_eq!(json, "\"N/A\"");
        assert_eq!(Field::Found("12".into()).to_string(), "12");
    }

    #[test]
    fn stock_status_from_text() {
        assert_eq!(StockStatus::from_status_text(Some(" In stock ")), StockStatus::InStock);
        assert_eq!(
            StockStatus::from_status_text(Some("Currently unavailable.")),
            StockStatus::OutOfStock
        );
        assert_eq!(StockStatus::from_status_text(Some("Only 2 left")), StockStatus::Unknown);
        assert_eq!(StockStatus::from_status_text(None), StockStatus::Unknown);
    }

    #[test]
    fn best_seller_display_joins_or_falls_back() {
        let mut record = ProductDetailRecord::default();
        assert_eq!(record.best_seller_display(), "N/A");
        record.best_seller_ranks = vec!["#1234 in Beauty".into(), "#56 in Perfumes".into()];
        assert_eq!(record.best_seller_display(), "#1234 in Beauty | #56 in Perfumes");
    }
}
