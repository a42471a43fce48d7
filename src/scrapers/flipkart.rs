//! Flipkart search and product-page scraper

use scraper::{ElementRef, Html};

use crate::error::{ExtractError, LookupError, SelectorError};
use crate::models::{Field, ListingType, ProductDetailRecord, ProductDraft, StockStatus};
use crate::normalize::{first_token, query_param, sanitize_price, strip_currency, strip_review_parens};
use crate::selectors::FieldSelector;
use crate::traits::{DelayRange, Marketplace, MarketplaceConfig, ProductTarget, SiteSelectors};

use super::{CompiledSelectors, attr_value, require_children};

const TITLE: &[FieldSelector] = &[
    FieldSelector::attr_or_text("a.wjcEIp", "title"),
    FieldSelector::attr_or_text("div.KzDlHZ", "title"),
];
const PRICE: &[FieldSelector] = &[FieldSelector::text("div.Nx9bqj")];
const LINK: &[FieldSelector] = &[
    FieldSelector::attr("a.wjcEIp", "href"),
    FieldSelector::attr("a.CGtC98", "href"),
];
const RATING: &[FieldSelector] = &[FieldSelector::text("div.XQDdHH")];
const REVIEW_COUNT: &[FieldSelector] = &[FieldSelector::text("span.Wphh3N")];
// Previous and Next share a class; only the anchor labelled Next counts.
const NEXT_PAGE: &[FieldSelector] = &[FieldSelector::attr("a._9QVEpD", "href").containing("Next")];
const DETAIL_TITLE: &[FieldSelector] = &[FieldSelector::text("span.VU-ZEz")];
const DETAIL_PRICE: &[FieldSelector] = &[
    FieldSelector::text("div.Nx9bqj.CxhGGd"),
    FieldSelector::text("div.Nx9bqj"),
];

impl MarketplaceConfig {
    /// Flipkart defaults.
    pub fn flipkart() -> Self {
        Self {
            name: "Flipkart".to_string(),
            base_url: "https://www.flipkart.com".to_string(),
            domain: "flipkart.com".to_string(),
            search_path: "/search?q={query}&otracker=search&otracker1=search&marketplace=FLIPKART&as-show=off&as=off".to_string(),
            headers: vec![
                (
                    "User-Agent",
                    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3",
                ),
                ("Accept-Language", "en-US,en;q=0.5"),
                ("Connection", "keep-alive"),
                ("Upgrade-Insecure-Requests", "1"),
            ],
            items_per_page: 24,
            page_delay: DelayRange::from_secs(4, 6),
            selectors: SiteSelectors {
                product_container: "div[data-id]",
                external_id_attr: "data-id",
                title: TITLE,
                price: PRICE,
                link: LINK,
                rating: RATING,
                review_count: REVIEW_COUNT,
                sponsored_class: None,
                next_page: NEXT_PAGE,
                detail_title: DETAIL_TITLE,
                detail_price: DETAIL_PRICE,
                detail_rating: RATING,
                detail_review_count: REVIEW_COUNT,
                captcha: None,
            },
        }
    }
}

/// Scraper implementation for Flipkart
#[derive(Debug, Clone)]
pub struct FlipkartScraper {
    config: MarketplaceConfig,
    selectors: CompiledSelectors,
}

impl FlipkartScraper {
    /// Create a new Flipkart scraper with default configuration
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] if a built-in selector fails to compile.
    pub fn new() -> Result<Self, SelectorError> {
        Self::with_config(MarketplaceConfig::flipkart())
    }

    /// # Errors
    ///
    /// Returns [`SelectorError`] if a selector in `config` fails to compile.
    pub fn with_config(config: MarketplaceConfig) -> Result<Self, SelectorError> {
        Ok(Self {
            selectors: CompiledSelectors::compile(&config.selectors)?,
            config,
        })
    }
}

/// `"₹1,299"` -> `"1,299"`, rejected unless numeric.
fn displayed_price(text: Option<String>) -> Option<String> {
    sanitize_price(text.as_deref().map(strip_currency))
}

impl Marketplace for FlipkartScraper {
    fn config(&self) -> &MarketplaceConfig {
        &self.config
    }

    fn selectors(&self) -> &CompiledSelectors {
        &self.selectors
    }

    fn extract_search_item(&self, container: ElementRef<'_>) -> Result<ProductDraft, ExtractError> {
        require_children(container)?;
        let attribute = self.config.selectors.external_id_attr;
        let product_id =
            attr_value(container, attribute).ok_or(ExtractError::MissingAttribute { attribute })?;
        let s = &self.selectors;

        // Review text reads like "(2,315 Ratings & 180 Reviews)"; keep the ratings count.
        let review_count = s
            .review_count
            .first_match(container)
            .map(|t| strip_review_parens(&t))
            .and_then(|t| first_token(&t));

        Ok(ProductDraft {
            external_id: Some(product_id),
            title: Field::from(s.title.first_match(container)),
            price: Field::from(displayed_price(s.price.first_match(container))),
            link: Field::from(
                s.link
                    .first_match(container)
                    .and_then(|href| self.config.absolute_url(&href)),
            ),
            rating: Field::from(s.rating.first_match(container).and_then(|t| first_token(&t))),
            review_count: Field::from(review_count),
            listing_type: ListingType::Organic,
        })
    }

    fn resolve_product(&self, input: &str) -> Result<ProductTarget, LookupError> {
        let input = input.trim();
        let url = if input.starts_with('/') {
            self.config.absolute_url(input)
        } else if input.starts_with("http://") || input.starts_with("https://") {
            Some(input.to_string())
        } else {
            None
        };

        let Some(url) = url else {
            return Err(LookupError::InvalidIdentifier {
                marketplace: self.config.name.clone(),
                input: input.to_string(),
            });
        };

        Ok(ProductTarget {
            external_id: query_param(&url, "pid"),
            url,
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

        Ok(ProductDetailRecord {
            external_id: target.external_id.clone(),
            title: Field::from(s.detail_title.first_match(root)),
            price: Field::from(displayed_price(s.detail_price.first_match(root))),
            rating: Field::from(s.detail_rating.first_match(root).and_then(|t| first_token(&t))),
            review_count: Field::from(
                s.detail_review_count
                    .first_match(root)
                    .and_then(|t| first_token(&t)),
            ),
            link: Field::Found(target.url.clone()),
            best_seller_ranks: Vec::new(),
            stock_status: StockStatus::Unknown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scraper() -> FlipkartScraper {
        FlipkartScraper::new().unwrap()
    }

    fn items(html: &str) -> Vec<Result<ProductDraft, ExtractError>> {
        let scraper = scraper();
        let doc = Html::parse_document(html);
        doc.select(&scraper.selectors.container)
            .map(|c| scraper.extract_search_item(c))
            .collect()
    }

    #[test]
    fn extracts_grid_result() {
        let results = items(
            r#"<div data-id="MOBGTAGPTB3VS24W">
                <a class="wjcEIp" title="Apple iPhone 15 (Black, 128 GB)" href="/apple-iphone-15/p/itm6ac6485515ae4?pid=MOBGTAGPTB3VS24W">Apple iPhone 15 (Bl...</a>
                <div class="Nx9bqj">₹65,999</div>
                <div class="XQDdHH">4.6</div>
                <span class="Wphh3N">(2,315 Ratings &amp; 180 Reviews)</span>
            </div>"#,
        );
        let item = results[0].as_ref().unwrap();
        assert_eq!(item.external_id.as_deref(), Some("MOBGTAGPTB3VS24W"));
        assert_eq!(item.title.as_deref(), Some("Apple iPhone 15 (Black, 128 GB)"));
        assert_eq!(item.price.as_deref(), Some("65,999"));
        assert_eq!(
            item.link.as_deref(),
            Some("https://www.flipkart.com/apple-iphone-15/p/itm6ac6485515ae4?pid=MOBGTAGPTB3VS24W")
        );
        assert_eq!(item.rating.as_deref(), Some("4.6"));
        assert_eq!(item.review_count.as_deref(), Some("2,315"));
        assert_eq!(item.listing_type, ListingType::Organic);
    }

    #[test]
    fn list_layout_uses_fallback_selectors() {
        let results = items(
            r#"<div data-id="ACCFZGAQJGYCYDCM">
                <a class="CGtC98" href="/boat-rockerz/p/itm1?pid=ACCFZGAQJGYCYDCM"><div class="KzDlHZ">boAt Rockerz 450</div></a>
            </div>"#,
        );
        let item = results[0].as_ref().unwrap();
        assert_eq!(item.title.as_deref(), Some("boAt Rockerz 450"));
        assert_eq!(
            item.link.as_deref(),
            Some("https://www.flipkart.com/boat-rockerz/p/itm1?pid=ACCFZGAQJGYCYDCM")
        );
        assert!(item.price.is_missing());
        assert!(item.review_count.is_missing());
    }

    #[test]
    fn blank_product_id_is_a_missing_attribute() {
        let results = items(r#"<div data-id=" "><a class="wjcEIp" href="/x">Thing</a></div>"#);
        assert_eq!(
            results[0],
            Err(ExtractError::MissingAttribute { attribute: "data-id" })
        );
    }

    #[test]
    fn product_url_resolution() {
        let scraper = scraper();
        let target = scraper
            .resolve_product("https://www.flipkart.com/boat/p/itm1?pid=ACCFZGAQJGYCYDCM")
            .unwrap();
        assert_eq!(target.external_id.as_deref(), Some("ACCFZGAQJGYCYDCM"));

        let relative = scraper.resolve_product("/boat/p/itm1").unwrap();
        assert_eq!(relative.url, "https://www.flipkart.com/boat/p/itm1");
        assert_eq!(relative.external_id, None);

        assert!(matches!(
            scraper.resolve_product("boat rockerz"),
            Err(LookupError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn detail_page_fields() {
        let scraper = scraper();
        let doc = Html::parse_document(
            r#"<html><body>
            <h1><span class="VU-ZEz">boAt Rockerz 450 Bluetooth Headset</span></h1>
            <div class="Nx9bqj CxhGGd">₹1,499</div>
            <div class="XQDdHH">4.1</div>
            <span class="Wphh3N">4,12,345 Ratings &amp; 28,110 Reviews</span>
            </body></html>"#,
        );
        let target = scraper
            .resolve_product("https://www.flipkart.com/boat/p/itm1?pid=ACCFZGAQJGYCYDCM")
            .unwrap();
        let record = scraper.extract_product_detail(&doc, &target).unwrap();
        assert_eq!(record.title.as_deref(), Some("boAt Rockerz 450 Bluetooth Headset"));
        assert_eq!(record.price.as_deref(), Some("1,499"));
        assert_eq!(record.rating.as_deref(), Some("4.1"));
        assert_eq!(record.review_count.as_deref(), Some("4,12,345"));
        assert_eq!(record.stock_status, StockStatus::Unknown);
        assert!(record.best_seller_ranks.is_empty());
    }

    #[test]
    fn next_link_prefers_the_next_anchor() {
        let scraper = scraper();
        let chain = crate::selectors::SelectorChain::parse(scraper.config.selectors.next_page).unwrap();
        let doc = Html::parse_document(
            r#"<nav><a class="_9QVEpD" href="/search?q=x&page=1">Previous</a>
                   <a class="_9QVEpD" href="/search?q=x&page=3"><span>Next</span></a></nav>"#,
        );
        assert_eq!(
            chain.first_match(doc.root_element()).as_deref(),
            Some("/search?q=x&page=3")
        );
    }

    #[test]
    fn previous_anchor_alone_is_not_a_next_link() {
        let scraper = scraper();
        let chain = crate::selectors::SelectorChain::parse(scraper.config.selectors.next_page).unwrap();
        let doc = Html::parse_document(
            r#"<nav><a class="_9QVEpD" href="/search?q=x&page=1"><span>Previous</span></a></nav>"#,
        );
        assert_eq!(chain.first_match(doc.root_element()), None);
    }
}
