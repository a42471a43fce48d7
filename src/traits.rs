//! Traits and configuration for marketplace-specific extraction

use std::time::Duration;

use rand::Rng;
use scraper::{ElementRef, Html};

use crate::error::{ExtractError, LookupError};
use crate::models::{ProductDetailRecord, ProductDraft};
use crate::scrapers::CompiledSelectors;
use crate::selectors::FieldSelector;

/// Inclusive range for the randomized pause between page fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn from_secs(min: u64, max: u64) -> Self {
        Self {
            min_ms: min * 1000,
            max_ms: max * 1000,
        }
    }

    /// No pause at all.
    pub const fn none() -> Self {
        Self { min_ms: 0, max_ms: 0 }
    }

    /// Multiplies both bounds, e.g. `0.0` disables the delay.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn scaled(self, factor: f64) -> Self {
        let scale = |ms: u64| (ms as f64 * factor.max(0.0)).round() as u64;
        Self {
            min_ms: scale(self.min_ms),
            max_ms: scale(self.max_ms),
        }
    }

    /// Draws a random duration from the range.
    pub fn sample(&self) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rand::rng().random_range(self.min_ms..=self.max_ms))
    }
}

/// Selector descriptors for both page types of a marketplace
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    /// One element per search result.
    pub product_container: &'static str,
    /// Attribute on the container carrying the marketplace item id.
    pub external_id_attr: &'static str,
    pub title: &'static [FieldSelector],
    pub price: &'static [FieldSelector],
    pub link: &'static [FieldSelector],
    pub rating: &'static [FieldSelector],
    pub review_count: &'static [FieldSelector],
    /// Container class marking paid placement, if the marketplace exposes one.
    pub sponsored_class: Option<&'static str>,
    pub next_page: &'static [FieldSelector],
    pub detail_title: &'static [FieldSelector],
    pub detail_price: &'static [FieldSelector],
    pub detail_rating: &'static [FieldSelector],
    pub detail_review_count: &'static [FieldSelector],
    /// Present on bot-check pages served in place of content.
    pub captcha: Option<&'static str>,
}

/// Configuration for one marketplace
#[derive(Debug, Clone)]
pub struct MarketplaceConfig {
    /// Display name for the marketplace
    pub name: String,
    /// Scheme and host every relative link is resolved against
    pub base_url: String,
    /// Host fragment a product URL must contain to be accepted
    pub domain: String,
    /// Path and query of the search page with a `{query}` placeholder
    pub search_path: String,
    /// Request headers sent with every fetch
    pub headers: Vec<(&'static str, &'static str)>,
    /// Rough number of results per search page, used to decide how many pages to walk
    pub items_per_page: usize,
    /// Pause between consecutive page fetches
    pub page_delay: DelayRange,
    pub selectors: SiteSelectors,
}

impl MarketplaceConfig {
    /// Points the config at another origin, keeping paths and selectors.
    ///
    /// The accepted product-URL domain follows the new host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        if let Some(host) = reqwest::Url::parse(&base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
        {
            self.domain = host;
        }
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub fn with_page_delay(mut self, delay: DelayRange) -> Self {
        self.page_delay = delay;
        self
    }

    /// Resolves a possibly relative href against the marketplace origin.
    pub fn absolute_url(&self, href: &str) -> Option<String> {
        crate::normalize::absolute_url(&self.base_url, href)
    }
}

/// A resolved product-detail request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductTarget {
    pub url: String,
    pub external_id: Option<String>,
}

/// Marketplace-specific extraction rules
pub trait Marketplace: Send + Sync {
    /// Site constants: origin, headers, paging and selector descriptors.
    fn config(&self) -> &MarketplaceConfig;

    /// The config's selectors, compiled.
    fn selectors(&self) -> &CompiledSelectors;

    /// Extracts one search result from its container element.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] when the container cannot produce a record at all;
    /// missing individual fields become sentinels instead.
    fn extract_search_item(&self, container: ElementRef<'_>) -> Result<ProductDraft, ExtractError>;

    /// Turns a user-supplied identifier or URL into the page to fetch.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::InvalidIdentifier`] for input this marketplace cannot look up.
    fn resolve_product(&self, input: &str) -> Result<ProductTarget, LookupError>;

    /// Extracts the detail record from a fetched product page.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] when the page cannot be read as a product page.
    fn extract_product_detail(
        &self,
        document: &Html,
        target: &ProductTarget,
    ) -> Result<ProductDetailRecord, ExtractError>;

    /// Display name, used in logs and errors.
    fn name(&self) -> &str {
        &self.config().name
    }

    /// Builds the first search page URL for a keyword.
    fn build_search_url(&self, keyword: &str) -> String {
        let encoded = urlencoding::encode(keyword.trim());
        let config = self.config();
        format!(
            "{}{}",
            config.base_url,
            config.search_path.replace("{query}", &encoded)
        )
    }

    /// `User-Agent` from the configured headers, or a generic desktop browser string.
    fn user_agent(&self) -> &'static str {
        self.config()
            .headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("user-agent"))
            .map_or(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
                |(_, value)| *value,
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_sample_stays_in_range() {
        let range = DelayRange { min_ms: 10, max_ms: 20 };
        for _ in 0..50 {
            let d = range.sample();
            assert!(d >= Duration::from_millis(10) && d <= Duration::from_millis(20));
        }
        assert_eq!(DelayRange::none().sample(), Duration::ZERO);
    }

    #[test]
    fn delay_scaling() {
        let range = DelayRange::from_secs(2, 5);
        assert_eq!(range.scaled(0.0), DelayRange::none());
        assert_eq!(range.scaled(0.5), DelayRange { min_ms: 1000, max_ms: 2500 });
    }
}
