//! Marketplace scrapers and the shared search-page extraction loop

pub mod amazon;
pub mod flipkart;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use crate::error::{ExtractError, SelectorError};
use crate::models::ProductDraft;
use crate::pagination::FetchedPage;
use crate::selectors::{SelectorChain, compile};
use crate::traits::{Marketplace, SiteSelectors};

pub use amazon::AmazonScraper;
pub use flipkart::FlipkartScraper;

/// [`SiteSelectors`] compiled once per scraper.
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub container: Selector,
    pub title: SelectorChain,
    pub price: SelectorChain,
    pub link: SelectorChain,
    pub rating: SelectorChain,
    pub review_count: SelectorChain,
    pub detail_title: SelectorChain,
    pub detail_price: SelectorChain,
    pub detail_rating: SelectorChain,
    pub detail_review_count: SelectorChain,
    pub captcha: Option<Selector>,
}

impl CompiledSelectors {
    /// # Errors
    ///
    /// Returns [`SelectorError`] for the first selector that does not compile.
    pub fn compile(site: &SiteSelectors) -> Result<Self, SelectorError> {
        Ok(Self {
            container: compile(site.product_container)?,
            title: SelectorChain::parse(site.title)?,
            price: SelectorChain::parse(site.price)?,
            link: SelectorChain::parse(site.link)?,
            rating: SelectorChain::parse(site.rating)?,
            review_count: SelectorChain::parse(site.review_count)?,
            detail_title: SelectorChain::parse(site.detail_title)?,
            detail_price: SelectorChain::parse(site.detail_price)?,
            detail_rating: SelectorChain::parse(site.detail_rating)?,
            detail_review_count: SelectorChain::parse(site.detail_review_count)?,
            captcha: site.captcha.map(compile).transpose()?,
        })
    }

    /// `true` if the document is a bot-check page rather than real content.
    pub fn is_blocked(&self, document: &Html) -> bool {
        self.captcha
            .as_ref()
            .is_some_and(|captcha| document.select(captcha).next().is_some())
    }
}

/// A search-result container that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub page: usize,
    /// 1-based position of the container on its page.
    pub position: usize,
    pub reason: ExtractError,
}

/// Everything pulled out of one search page.
#[derive(Debug, Clone, Default)]
pub struct SearchPageExtraction {
    pub items: Vec<ProductDraft>,
    pub skipped: Vec<SkippedItem>,
    pub blocked: bool,
}

/// Extracts every result container on a fetched search page, in document order.
///
/// A container that fails extraction is logged under `keyword` and recorded in
/// [`SearchPageExtraction::skipped`]; it never aborts the page.
pub fn extract_search_page(
    marketplace: &dyn Marketplace,
    page: &FetchedPage,
    keyword: &str,
) -> SearchPageExtraction {
    let document = Html::parse_document(&page.body);
    let selectors = marketplace.selectors();
    let mut extraction = SearchPageExtraction {
        blocked: selectors.is_blocked(&document),
        ..SearchPageExtraction::default()
    };

    if extraction.blocked {
        warn!(
            "{} served a bot-check page instead of results for '{}' on page {} ({})",
            marketplace.name(),
            keyword,
            page.number,
            page.url
        );
    }

    let containers: Vec<ElementRef<'_>> = document.select(&selectors.container).collect();
    info!(
        "Found {} search results for '{}' on page {}",
        containers.len(),
        keyword,
        page.number
    );

    for (index, container) in containers.into_iter().enumerate() {
        match marketplace.extract_search_item(container) {
            Ok(item) => {
                debug!("Processed product {:?}: {}", item.external_id, item.title);
                extraction.items.push(item);
            }
            Err(reason) => {
                warn!(
                    "Skipping {} result {} for '{}' on page {}: {}",
                    marketplace.name(),
                    index + 1,
                    keyword,
                    page.number,
                    reason
                );
                extraction.skipped.push(SkippedItem {
                    page: page.number,
                    position: index + 1,
                    reason,
                });
            }
        }
    }

    extraction
}

/// Rejects containers with no child elements, e.g. empty ad or layout slots.
///
/// # Errors
///
/// Returns [`ExtractError::MalformedNode`] when `container` has no element children.
pub fn require_children(container: ElementRef<'_>) -> Result<(), ExtractError> {
    if container.children().any(|child| child.value().is_element()) {
        Ok(())
    } else {
        Err(ExtractError::MalformedNode {
            reason: format!("<{}> container has no child elements", container.value().name()),
        })
    }
}

/// Non-empty, trimmed value of an attribute.
pub fn attr_value(element: ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
