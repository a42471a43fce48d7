//! Amazon.in search and product-page scraper

use scraper::{ElementRef, Html, Selector};

use crate::error::{ExtractError, LookupError, SelectorError};
use crate::models::{Field, ListingType, ProductDetailRecord, ProductDraft, StockStatus};
use crate::normalize::{
    asin_from_url, first_token, is_asin, parse_best_seller_ranks, sanitize_price,
    strip_review_parens,
};
use crate::selectors::{FieldSelector, SelectorChain, compile, element_text};
use crate::traits::{DelayRange, Marketplace, MarketplaceConfig, ProductTarget, SiteSelectors};

use super::{CompiledSelectors, attr_value, require_children};

const BEST_SELLERS_MARKER: &str = "Best Sellers Rank";

const TITLE: &[FieldSelector] = &[
    FieldSelector::text("h2.a-size-mini"),
    FieldSelector::text("h2 a span"),
];
const PRICE: &[FieldSelector] = &[
    FieldSelector::text("span.a-price-whole"),
    FieldSelector::text("span.a-color-base"),
];
const RATING: &[FieldSelector] = &[FieldSelector::text("span.a-icon-alt")];
const REVIEW_COUNT: &[FieldSelector] = &[FieldSelector::text("span.a-size-base.s-underline-text")];
const NEXT_PAGE: &[FieldSelector] = &[FieldSelector::attr("a.s-pagination-next", "href")];
const DETAIL_TITLE: &[FieldSelector] = &[FieldSelector::text("span#productTitle")];
const DETAIL_PRICE: &[FieldSelector] = &[FieldSelector::text("span.a-price-whole")];
const DETAIL_REVIEW_COUNT: &[FieldSelector] = &[FieldSelector::text("span#acrCustomerReviewText")];
const STOCK_STATUS: &[FieldSelector] = &[
    FieldSelector::text("span.a-size-medium.a-color-success"),
    FieldSelector::text("div#availability span"),
];

impl MarketplaceConfig {
    /// Amazon India defaults.
    pub fn amazon() -> Self {
        Self {
            name: "Amazon".to_string(),
            base_url: "https://www.amazon.in".to_string(),
            domain: "amazon.in".to_string(),
            search_path: "/s?k={query}".to_string(),
            headers: vec![
                (
                    "User-Agent",
                    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
                ),
                ("Accept-Language", "en-US,en;q=0.9"),
                ("Connection", "keep-alive"),
            ],
            items_per_page: 16,
            page_delay: DelayRange::from_secs(2, 5),
            selectors: SiteSelectors {
                product_container: r#"div[data-component-type="s-search-result"]"#,
                external_id_attr: "data-asin",
                title: TITLE,
                price: PRICE,
                link: &[],
                rating: RATING,
                review_count: REVIEW_COUNT,
                sponsored_class: Some("AdHolder"),
                next_page: NEXT_PAGE,
                detail_title: DETAIL_TITLE,
                detail_price: DETAIL_PRICE,
                detail_rating: RATING,
                detail_review_count: DETAIL_REVIEW_COUNT,
                captcha: Some("form[action*='validateCaptcha']"),
            },
        }
    }
}

/// Selectors only the Amazon product page needs.
#[derive(Debug, Clone)]
struct DetailSelectors {
    stock_status: SelectorChain,
    rank_panel: Selector,
    rank_item: Selector,
    rank_table: Selector,
    table_row: Selector,
    rank_cell: Selector,
}

impl DetailSelectors {
    fn compile() -> Result<Self, SelectorError> {
        Ok(Self {
            stock_status: SelectorChain::parse(STOCK_STATUS)?,
            rank_panel: compile("div#detailBulletsWrapper_feature_div")?,
            rank_item: compile("span.a-list-item")?,
            rank_table: compile("table#productDetails_detailBullets_sections1")?,
            table_row: compile("tr")?,
            rank_cell: compile("td.a-size-base")?,
        })
    }
}

/// Scraper implementation for Amazon.in
#[derive(Debug, Clone)]
pub struct AmazonScraper {
    config: MarketplaceConfig,
    selectors: CompiledSelectors,
    detail: DetailSelectors,
}

impl AmazonScraper {
    /// Create a new Amazon scraper with default configuration
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] if a built-in selector fails to compile.
    pub fn new() -> Result<Self, SelectorError> {
        Self::with_config(MarketplaceConfig::amazon())
    }

    /// # Errors
    ///
    /// Returns [`SelectorError`] if a selector in `config` fails to compile.
    pub fn with_config(config: MarketplaceConfig) -> Result<Self, SelectorError> {
        Ok(Self {
            selectors: CompiledSelectors::compile(&config.selectors)?,
            detail: DetailSelectors::compile()?,
            config,
        })
    }

    fn product_url(&self, asin: &str) -> String {
        format!("{}/dp/{}", self.config.base_url, asin)
    }

    /// Reads best-seller ranks from the detail bullets, falling back to the
    /// product-details table.
    fn best_seller_ranks(&self, root: ElementRef<'_>) -> Vec<String> {
        let mut ranks = Vec::new();

        if let Some(panel) = root.select(&self.detail.rank_panel).next() {
            for item in panel.select(&self.detail.rank_item) {
                let text = element_text(item);
                if text.contains(BEST_SELLERS_MARKER) {
                    ranks.extend(parse_best_seller_ranks(&text));
                }
            }
        }

        if ranks.is_empty()
            && let Some(table) = root.select(&self.detail.rank_table).next()
        {
            for row in table.select(&self.detail.table_row) {
                let row_text = element_text(row);
                if !row_text.contains(BEST_SELLERS_MARKER) {
                    continue;
                }
                let text = row
                    .select(&self.detail.rank_cell)
                    .next()
                    .map_or(row_text, element_text);
                ranks.extend(parse_best_seller_ranks(&text));
            }
        }

        ranks
    }
}

impl Marketplace for AmazonScraper {
    fn config(&self) -> &MarketplaceConfig {
        &self.config
    }

    fn selectors(&self) -> &CompiledSelectors {
        &self.selectors
    }

    fn extract_search_item(&self, container: ElementRef<'_>) -> Result<ProductDraft, ExtractError> {
        require_children(container)?;
        let s = &self.selectors;

        let external_id = attr_value(container, self.config.selectors.external_id_attr);
        let link = Field::from(external_id.as_deref().map(|asin| self.product_url(asin)));

        let listing_type = match self.config.selectors.sponsored_class {
            Some(marker) if container.value().classes().any(|c| c == marker) => {
                ListingType::Sponsored
            }
            _ => ListingType::Organic,
        };

        Ok(ProductDraft {
            title: Field::from(s.title.first_match(container)),
            price: Field::from(sanitize_price(s.price.first_match(container).as_deref())),
            link,
            rating: Field::from(s.rating.first_match(container).and_then(|t| first_token(&t))),
            review_count: Field::from(
                s.review_count
                    .first_match(container)
                    .map(|t| strip_review_parens(&t)),
            ),
            external_id,
            listing_type,
        })
    }

    fn resolve_product(&self, input: &str) -> Result<ProductTarget, LookupError> {
        let input = input.trim();
        if is_asin(input) {
            return Ok(ProductTarget {
                url: self.product_url(input),
                external_id: Some(input.to_string()),
            });
        }

        if input.contains(&self.config.domain)
            && let Some(asin) = asin_from_url(input)
        {
            return Ok(ProductTarget {
                url: input.to_string(),
                external_id: Some(asin),
            });
        }

        Err(LookupError::InvalidIdentifier {
            marketplace: self.config.name.clone(),
            input: input.to_string(),
        })
    }

    fn extract_product_detail(
        &self,
        document: &Html,
        target: &ProductTarget,
    ) -> Result<ProductDetailRecord, ExtractError> {
        if self.selectors.is_blocked(document) {
            return Err(ExtractError::Blocked);
        }
        let root = document.root_element();
        let s = &self.selectors;

        let link = target
            .external_id
            .as_deref()
            .map_or_else(|| target.url.clone(), |asin| self.product_url(asin));

        Ok(ProductDetailRecord {
            external_id: target.external_id.clone(),
            title: Field::from(s.detail_title.first_match(root)),
            price: Field::from(sanitize_price(s.detail_price.first_match(root).as_deref())),
            rating: Field::from(s.detail_rating.first_match(root).and_then(|t| first_token(&t))),
            review_count: Field::from(
                s.detail_review_count
                    .first_match(root)
                    .and_then(|t| first_token(&t)),
            ),
            link: Field::Found(link),
            best_seller_ranks: self.best_seller_ranks(root),
            stock_status: StockStatus::from_status_text(
                self.detail.stock_status.first_match(root).as_deref(),
            ),
        })
    }
}
