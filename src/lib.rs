//! Keyword rank and product-detail scraping for Amazon.in and Flipkart.

pub mod assemble;
pub mod config;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod models;
pub mod normalize;
pub mod pagination;
pub mod rank_fetcher;
pub mod scrapers;
pub mod selectors;
pub mod traits;

pub use config::{AppConfig, load_app_config};
pub use error::{ConfigError, ExportError, ExtractError, FetchError, LookupError, SelectorError};
pub use models::{Field, ListingType, ProductDetailRecord, ProductRecord, StockStatus};
pub use rank_fetcher::{KeywordResult, RankFetcher};
pub use scrapers::{AmazonScraper, FlipkartScraper};
pub use traits::{DelayRange, Marketplace, MarketplaceConfig};
