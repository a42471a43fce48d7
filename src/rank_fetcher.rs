use std::sync::Arc;
use std::time::Duration;

use scraper::Html;
use tracing::{error, info, warn};

use crate::assemble::assemble;
use crate::error::{ExtractError, LookupError};
use crate::fetcher::{Fetcher, PageSource};
use crate::models::{ProductDetailRecord, ProductRecord};
use crate::pagination::{WalkRequest, walk};
use crate::scrapers::extract_search_page;
use crate::traits::{Marketplace, ProductTarget};

/// Outcome of one keyword in a batch search.
#[derive(Debug)]
pub struct KeywordResult {
    pub keyword: String,
    pub outcome: Result<Vec<ProductRecord>, LookupError>,
}

/// Keyword rank search and product lookup for one marketplace.
#[derive(Clone)]
pub struct RankFetcher<S = Fetcher> {
    marketplace: Arc<dyn Marketplace>,
    source: S,
}

impl RankFetcher<Fetcher> {
    /// Builds a fetcher using the marketplace's request headers.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Client`] if the HTTP client cannot be built.
    pub fn new(marketplace: Arc<dyn Marketplace>, timeout: Duration) -> Result<Self, LookupError> {
        let source = Fetcher::for_marketplace(marketplace.as_ref(), timeout)?;
        Ok(Self { marketplace, source })
    }
}

impl<S: PageSource> RankFetcher<S> {
    pub fn with_source(marketplace: Arc<dyn Marketplace>, source: S) -> Self {
        Self { marketplace, source }
    }

    pub fn marketplace(&self) -> &dyn Marketplace {
        self.marketplace.as_ref()
    }

    /// Returns the top `target_count` search results for `keyword`, ranked 1..=N.
    ///
    /// Transport failures end pagination early; whatever pages were fetched
    /// before the failure are still extracted.
    ///
    /// # Errors
    ///
    /// - [`LookupError::NoResults`] if no product could be extracted.
    /// - [`LookupError::Selector`] if the marketplace's next-page selectors are invalid.
    pub async fn search_rank(
        &self,
        keyword: &str,
        target_count: usize,
    ) -> Result<Vec<ProductRecord>, LookupError> {
        let marketplace = self.marketplace.as_ref();
        info!(
            "Searching {} for '{}' (top {})",
            marketplace.name(),
            keyword,
            target_count
        );

        let request = WalkRequest::for_search(
            marketplace.config(),
            marketplace.build_search_url(keyword),
            target_count,
            keyword,
        )?;
        let outcome = walk(&self.source, request).await;

        let drafts = outcome
            .pages
            .iter()
            .flat_map(|page| extract_search_page(marketplace, page, keyword).items);
        let records = assemble(drafts, target_count);

        info!(
            "Processed {} products for '{}' on {} across {} pages ({:?})",
            records.len(),
            keyword,
            marketplace.name(),
            outcome.pages.len(),
            outcome.stop_reason
        );

        if records.is_empty() {
            error!("No products found for '{}' on {}", keyword, marketplace.name());
            return Err(LookupError::NoResults {
                marketplace: marketplace.name().to_string(),
                keyword: keyword.to_string(),
            });
        }

        Ok(records)
    }

    /// Looks up a single product by identifier or URL.
    ///
    /// Returns `Ok(None)` when the page could not be fetched or read; callers
    /// processing a batch should skip it.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::InvalidIdentifier`] if the marketplace cannot
    /// interpret `identifier`.
    pub async fn fetch_product_info(
        &self,
        identifier: &str,
    ) -> Result<Option<ProductDetailRecord>, LookupError> {
        let marketplace = self.marketplace.as_ref();
        let target = marketplace.resolve_product(identifier).inspect_err(|e| {
            error!("Error fetching {} product info: {}", marketplace.name(), e);
        })?;

        info!("Fetching {} product {}", marketplace.name(), target.url);
        let body = match self.source.fetch_page(&target.url).await {
            Ok(body) => body,
            Err(e) => {
                error!(
                    "Error fetching {} product data for '{}': {}",
                    marketplace.name(),
                    identifier,
                    e
                );
                return Ok(None);
            }
        };

        match extract_detail(marketplace, &body, &target) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                error!(
                    "Error processing {} product data for '{}': {}",
                    marketplace.name(),
                    identifier,
                    e
                );
                Ok(None)
            }
        }
    }

    /// Runs [`Self::search_rank`] for each keyword in order.
    ///
    /// Blank keywords are ignored. A failing keyword is recorded and the
    /// batch moves on.
    pub async fn search_keywords(&self, keywords: &[String], target_count: usize) -> Vec<KeywordResult> {
        let keywords: Vec<&str> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect();
        let total = keywords.len();
        let mut results = Vec::with_capacity(total);

        for (i, keyword) in keywords.into_iter().enumerate() {
            let outcome = self.search_rank(keyword, target_count).await;
            if let Err(e) = &outcome {
                warn!("Keyword '{}' failed: {}", keyword, e);
            }
            info!("Status: Processing ({}/{})", i + 1, total);
            results.push(KeywordResult {
                keyword: keyword.to_string(),
                outcome,
            });
        }

        results
    }

    /// Runs [`Self::fetch_product_info`] for each identifier, keeping only
    /// the products that produced a record.
    pub async fn fetch_products(&self, identifiers: &[String]) -> Vec<ProductDetailRecord> {
        let identifiers: Vec<&str> = identifiers
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect();
        let total = identifiers.len();
        let mut records = Vec::new();

        for (i, identifier) in identifiers.into_iter().enumerate() {
            match self.fetch_product_info(identifier).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => warn!("Skipping '{}': no product information", identifier),
                Err(e) => warn!("Skipping '{}': {}", identifier, e),
            }
            info!("Status: Processing ({}/{})", i + 1, total);
        }

        info!("Fetched {} of {} products", records.len(), total);
        records
    }
}

fn extract_detail(
    marketplace: &dyn Marketplace,
    body: &str,
    target: &ProductTarget,
) -> Result<ProductDetailRecord, ExtractError> {
    let document = Html::parse_document(body);
    marketplace.extract_product_detail(&document, target)
}
