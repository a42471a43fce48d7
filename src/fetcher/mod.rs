//! Single-attempt HTTP page fetching

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use crate::error::FetchError;
use crate::traits::Marketplace;

/// Anything that can hand back the body of a page by URL.
///
/// The pagination walker and product lookups only depend on this, so tests
/// can substitute an in-memory source for the network.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches `url` once.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on network failure, timeout, or a non-2xx status.
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTP fetcher carrying one marketplace's headers and a per-request deadline
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Builds a client with the given headers and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidHeader`] for a header that cannot be encoded and
    /// [`FetchError::Http`] if the client cannot be constructed.
    pub fn new(
        user_agent: &str,
        headers: &[(&'static str, &'static str)],
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in headers {
            if name.eq_ignore_ascii_case("user-agent") {
                continue;
            }
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| FetchError::InvalidHeader {
                    name: (*name).to_string(),
                    reason: e.to_string(),
                })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| FetchError::InvalidHeader {
                    name: (*name).to_string(),
                    reason: e.to_string(),
                })?;
            default_headers.insert(header_name, header_value);
        }

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(default_headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    /// Builds a fetcher with the marketplace's request profile.
    ///
    /// # Errors
    ///
    /// See [`Fetcher::new`].
    pub fn for_marketplace(
        marketplace: &dyn Marketplace,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        Self::new(
            marketplace.user_agent(),
            &marketplace.config().headers,
            timeout,
        )
    }

    /// Issues one GET and returns the body decoded with the charset from its
    /// `Content-Type` (UTF-8 when absent); non-2xx is an error.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] if `url` does not parse.
    /// - [`FetchError::Http`] on connection failure or timeout.
    /// - [`FetchError::Status`] on any non-2xx status.
    pub async fn get(&self, url: &str) -> Result<String, FetchError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let response = self.client.get(parsed).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        debug!("Fetched {} ({} bytes, status {})", url, body.len(), status);

        Ok(body)
    }
}

#[async_trait]
impl PageSource for Fetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        self.get(url).await
    }
}
