//! Error taxonomy for fetching, extraction, and lookups

use thiserror::Error;

/// A single HTTP fetch that did not produce a usable page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("invalid request URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid request header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
}

impl FetchError {
    /// `true` when the request hit its per-call deadline.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}

/// Why a search-result container or a product page could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("malformed node: {reason}")]
    MalformedNode { reason: String },

    #[error("missing required attribute `{attribute}`")]
    MissingAttribute { attribute: &'static str },

    #[error("bot-check page served instead of content")]
    Blocked,
}

/// A CSS selector literal that `scraper` refused to compile.
#[derive(Debug, Clone, Error)]
#[error("invalid CSS selector \"{css}\": {reason}")]
pub struct SelectorError {
    pub css: String,
    pub reason: String,
}

/// Failures surfaced to callers of `search_rank` / `fetch_product_info`.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("invalid {marketplace} URL or identifier: {input}")]
    InvalidIdentifier { marketplace: String, input: String },

    #[error("no products found for '{keyword}' on {marketplace}")]
    NoResults { marketplace: String, keyword: String },

    #[error("could not build HTTP client: {0}")]
    Client(#[from] FetchError),

    #[error(transparent)]
    Selector(#[from] SelectorError),
}

/// Invalid runtime configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Writing results out as CSV or JSON failed.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
