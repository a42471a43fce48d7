//! CSV and JSON export of rank and product results.
//!
//! Every row of one export shares a single timestamp. Missing fields are
//! written as `N/A`.

use std::io::Write;

use chrono::Local;
use csv::Writer;
use serde::Serialize;

use crate::error::ExportError;
use crate::models::{ProductDetailRecord, ProductRecord};
use crate::rank_fetcher::KeywordResult;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time in export format.
pub fn export_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Column layout for one marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportLayout {
    pub id_header: &'static str,
    /// Listing type for searches; best-seller ranks and stock for products.
    pub extended: bool,
}

impl ExportLayout {
    pub const AMAZON: Self = Self {
        id_header: "ASIN",
        extended: true,
    };
    pub const FLIPKART: Self = Self {
        id_header: "Product ID",
        extended: false,
    };

    pub fn for_marketplace(name: &str) -> Self {
        if name.eq_ignore_ascii_case("amazon") {
            Self::AMAZON
        } else {
            Self::FLIPKART
        }
    }

    fn rank_headers(&self) -> Vec<&'static str> {
        let mut headers = vec![
            "Keyword",
            "Rank",
            self.id_header,
            "Link",
            "Title",
            "Price",
            "Rating",
            "Reviews",
        ];
        if self.extended {
            headers.push("Type");
        }
        headers.push("Timestamp");
        headers
    }

    fn product_headers(&self) -> Vec<&'static str> {
        let mut headers = vec![
            "S.No",
            self.id_header,
            "Link",
            "Title",
            "Price",
            "Rating",
            "Reviews",
        ];
        if self.extended {
            headers.extend(["BestSeller", "In Stock"]);
        }
        headers.push("Timestamp");
        headers
    }
}

fn id_or_sentinel(id: Option<&String>) -> String {
    id.map_or_else(|| crate::models::NOT_AVAILABLE.to_string(), Clone::clone)
}

/// Writes keyword search results, one row per ranked product.
///
/// A keyword that failed gets a single row carrying the error message in
/// the title column. Returns the number of data rows written.
///
/// # Errors
///
/// Returns [`ExportError`] if writing to `out` fails.
pub fn write_rank_csv<W: Write>(
    out: W,
    layout: ExportLayout,
    results: &[KeywordResult],
    timestamp: &str,
) -> Result<usize, ExportError> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(layout.rank_headers())?;
    let mut rows = 0;

    for result in results {
        match &result.outcome {
            Ok(records) => {
                for record in records {
                    let mut row = vec![
                        result.keyword.clone(),
                        record.rank.to_string(),
                        id_or_sentinel(record.external_id.as_ref()),
                        record.link.to_string(),
                        record.title.to_string(),
                        record.price.to_string(),
                        record.rating.to_string(),
                        record.review_count.to_string(),
                    ];
                    if layout.extended {
                        row.push(record.listing_type.to_string());
                    }
                    row.push(timestamp.to_string());
                    writer.write_record(&row)?;
                    rows += 1;
                }
            }
            Err(e) => {
                let na = crate::models::NOT_AVAILABLE.to_string();
                let mut row = vec![
                    result.keyword.clone(),
                    na.clone(),
                    na.clone(),
                    na.clone(),
                    e.to_string(),
                    na.clone(),
                    na.clone(),
                    na.clone(),
                ];
                if layout.extended {
                    row.push(na);
                }
                row.push(timestamp.to_string());
                writer.write_record(&row)?;
                rows += 1;
            }
        }
    }

    writer.flush()?;
    Ok(rows)
}

/// Writes product details, numbered from 1 in input order.
///
/// # Errors
///
/// Returns [`ExportError`] if writing to `out` fails.
pub fn write_product_csv<W: Write>(
    out: W,
    layout: ExportLayout,
    products: &[ProductDetailRecord],
    timestamp: &str,
) -> Result<usize, ExportError> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(layout.product_headers())?;

    for (index, product) in products.iter().enumerate() {
        let mut row = vec![
            (index + 1).to_string(),
            id_or_sentinel(product.external_id.as_ref()),
            product.link.to_string(),
            product.title.to_string(),
            product.price.to_string(),
            product.rating.to_string(),
            product.review_count.to_string(),
        ];
        if layout.extended {
            row.push(product.best_seller_display());
            row.push(product.stock_status.export_label().to_string());
        }
        row.push(timestamp.to_string());
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(products.len())
}

#[derive(Serialize)]
struct KeywordExport<'a> {
    keyword: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    results: &'a [ProductRecord],
}

#[derive(Serialize)]
struct RankExport<'a> {
    marketplace: &'a str,
    timestamp: &'a str,
    keywords: Vec<KeywordExport<'a>>,
}

#[derive(Serialize)]
struct ProductExport<'a> {
    marketplace: &'a str,
    timestamp: &'a str,
    products: &'a [ProductDetailRecord],
}

/// Pretty-printed JSON equivalent of [`write_rank_csv`].
///
/// # Errors
///
/// Returns [`ExportError`] if serialization or writing fails.
pub fn write_rank_json<W: Write>(
    mut out: W,
    marketplace: &str,
    results: &[KeywordResult],
    timestamp: &str,
) -> Result<usize, ExportError> {
    let keywords = results
        .iter()
        .map(|result| match &result.outcome {
            Ok(records) => KeywordExport {
                keyword: &result.keyword,
                error: None,
                results: records,
            },
            Err(e) => KeywordExport {
                keyword: &result.keyword,
                error: Some(e.to_string()),
                results: &[],
            },
        })
        .collect::<Vec<_>>();
    let rows = keywords.iter().map(|k| k.results.len()).sum();

    serde_json::to_writer_pretty(
        &mut out,
        &RankExport {
            marketplace,
            timestamp,
            keywords,
        },
    )?;
    writeln!(out)?;
    Ok(rows)
}

/// Pretty-printed JSON equivalent of [`write_product_csv`].
///
/// # Errors
///
/// Returns [`ExportError`] if serialization or writing fails.
pub fn write_product_json<W: Write>(
    mut out: W,
    marketplace: &str,
    products: &[ProductDetailRecord],
    timestamp: &str,
) -> Result<usize, ExportError> {
    serde_json::to_writer_pretty(
        &mut out,
        &ProductExport {
            marketplace,
            timestamp,
            products,
        },
    )?;
    writeln!(out)?;
    Ok(products.len())
}
