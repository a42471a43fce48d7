//! Next-link pagination over marketplace search pages.
//!
//! A walk starts at a seed URL and keeps fetching while
//! `pages * items_per_page < target_count`. Each fetched page is kept, then
//! its "next page" anchor decides whether there is anywhere left to go.
//!
//! ## States
//!
//! ```text
//! Fetching(url) --ok--> ExtractingNextLink(page) --> Accumulating(page, next)
//!      |                                                  |
//!      +--error--> Stopped(FetchFailed)                   +--no next--> Stopped(NoNextPage)
//!                                                         +--count met--> Stopped(TargetReached)
//!                                                         +--otherwise--> Fetching(next)
//! ```
//!
//! Every transition either stops or moves forward one page, and fetch
//! errors are never retried, so a walk always terminates.

use scraper::Html;
use tracing::{error, info};

use crate::error::{FetchError, SelectorError};
use crate::fetcher::PageSource;
use crate::normalize::absolute_url;
use crate::selectors::{FieldSelector, SelectorChain};
use crate::traits::{DelayRange, MarketplaceConfig};

/// Raw body of one search page, kept in navigation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// 1-based position in the walk.
    pub number: usize,
    pub url: String,
    pub body: String,
}

/// Why a walk ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Enough pages were collected to cover the target count.
    TargetReached,
    /// The last page had no usable next-page link.
    NoNextPage,
    /// A fetch failed; pages collected before it are kept.
    FetchFailed { page: usize, error: String },
}

/// Current position of a walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkState {
    Fetching { url: String, page: usize },
    ExtractingNextLink { page: FetchedPage },
    Accumulating { page: FetchedPage, next_url: Option<String> },
    Stopped(StopReason),
}

/// Everything a walk needs besides the page source.
#[derive(Debug, Clone)]
pub struct WalkRequest {
    pub seed_url: String,
    pub target_count: usize,
    pub items_per_page: usize,
    pub base_url: String,
    pub next_link: SelectorChain,
    pub delay: DelayRange,
    /// Context for log lines, e.g. `"Amazon 'wireless mouse'"`.
    pub label: String,
}

impl WalkRequest {
    /// Builds a walk for a marketplace search.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] if the marketplace's next-page selectors do not compile.
    pub fn for_search(
        config: &MarketplaceConfig,
        seed_url: String,
        target_count: usize,
        keyword: &str,
    ) -> Result<Self, SelectorError> {
        Ok(Self {
            seed_url,
            target_count,
            items_per_page: config.items_per_page,
            base_url: config.base_url.clone(),
            next_link: SelectorChain::parse(config.selectors.next_page)?,
            delay: config.page_delay,
            label: format!("{} '{}'", config.name, keyword),
        })
    }

    /// Convenience for tests and ad-hoc walks with a single next-link selector.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] if `next_link` does not compile.
    pub fn with_next_link(
        seed_url: &str,
        base_url: &str,
        target_count: usize,
        items_per_page: usize,
        next_link: &[FieldSelector],
    ) -> Result<Self, SelectorError> {
        Ok(Self {
            seed_url: seed_url.to_string(),
            target_count,
            items_per_page,
            base_url: base_url.to_string(),
            next_link: SelectorChain::parse(next_link)?,
            delay: DelayRange::none(),
            label: seed_url.to_string(),
        })
    }

    fn covered(&self, pages: usize) -> bool {
        pages.saturating_mul(self.items_per_page.max(1)) >= self.target_count
    }
}

/// Result of a finished walk.
#[derive(Debug, Clone)]
pub struct WalkOutcome {
    pub pages: Vec<FetchedPage>,
    pub stop_reason: StopReason,
}

/// Drives one walk through its states.
///
/// The walker performs no I/O itself; [`walk`] feeds it fetch results.
#[derive(Debug)]
pub struct PaginationWalker {
    request: WalkRequest,
    pages: Vec<FetchedPage>,
    state: WalkState,
}

impl PaginationWalker {
    pub fn new(request: WalkRequest) -> Self {
        let state = if request.covered(0) {
            WalkState::Stopped(StopReason::TargetReached)
        } else {
            WalkState::Fetching {
                url: request.seed_url.clone(),
                page: 1,
            }
        };
        Self {
            request,
            pages: Vec::new(),
            state,
        }
    }

    pub fn state(&self) -> &WalkState {
        &self.state
    }

    pub fn pages(&self) -> &[FetchedPage] {
        &self.pages
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.state, WalkState::Stopped(_))
    }

    /// `Fetching` -> `ExtractingNextLink` on success, `Stopped` on failure.
    pub fn on_fetched(&mut self, result: Result<String, FetchError>) {
        let WalkState::Fetching { url, page } = &self.state else {
            return;
        };
        let (url, page) = (url.clone(), *page);

        self.state = match result {
            Ok(body) => {
                info!("Fetched page {} for {}", page, self.request.label);
                WalkState::ExtractingNextLink {
                    page: FetchedPage {
                        number: page,
                        url,
                        body,
                    },
                }
            }
            Err(e) => {
                error!(
                    "An error occurred while fetching results for {} on page {}: {}",
                    self.request.label, page, e
                );
                WalkState::Stopped(StopReason::FetchFailed {
                    page,
                    error: e.to_string(),
                })
            }
        };
    }

    /// `ExtractingNextLink` -> `Accumulating`, resolving the next-page href.
    pub fn extract_next_link(&mut self) {
        let state = std::mem::replace(&mut self.state, WalkState::Stopped(StopReason::NoNextPage));
        let WalkState::ExtractingNextLink { page } = state else {
            self.state = state;
            return;
        };

        let next_url = {
            let document = Html::parse_document(&page.body);
            self.request
                .next_link
                .first_match(document.root_element())
                .and_then(|href| absolute_url(&self.request.base_url, &href))
        };

        self.state = WalkState::Accumulating { page, next_url };
    }

    /// `Accumulating` -> `Fetching` or `Stopped`.
    ///
    /// Returns `true` when the walk continues and the caller should pause
    /// before the next fetch.
    pub fn accumulate(&mut self) -> bool {
        let state = std::mem::replace(&mut self.state, WalkState::Stopped(StopReason::NoNextPage));
        let WalkState::Accumulating { page, next_url } = state else {
            self.state = state;
            return false;
        };

        let number = page.number;
        self.pages.push(page);

        self.state = match next_url {
            None => {
                info!("No more pages found for {}", self.request.label);
                WalkState::Stopped(StopReason::NoNextPage)
            }
            Some(_) if self.request.covered(self.pages.len()) => {
                WalkState::Stopped(StopReason::TargetReached)
            }
            Some(url) => {
                info!("Fetched page {}, moving to next page...", number);
                WalkState::Fetching {
                    url,
                    page: number + 1,
                }
            }
        };

        matches!(self.state, WalkState::Fetching { .. })
    }

    pub fn into_outcome(self) -> WalkOutcome {
        let stop_reason = match self.state {
            WalkState::Stopped(reason) => reason,
            // Only reachable if a caller abandons the walk mid-way.
            _ => StopReason::NoNextPage,
        };
        WalkOutcome {
            pages: self.pages,
            stop_reason,
        }
    }
}

/// Runs a walk to completion against `source`.
pub async fn walk<S: PageSource + ?Sized>(source: &S, request: WalkRequest) -> WalkOutcome {
    let delay = request.delay;
    let mut walker = PaginationWalker::new(request);

    loop {
        match walker.state() {
            WalkState::Fetching { url, .. } => {
                let url = url.clone();
                let result = source.fetch_page(&url).await;
                walker.on_fetched(result);
            }
            WalkState::ExtractingNextLink { .. } => walker.extract_next_link(),
            WalkState::Accumulating { .. } => {
                if walker.accumulate() {
                    tokio::time::sleep(delay.sample()).await;
                }
            }
            WalkState::Stopped(_) => break,
        }
    }

    walker.into_outcome()
}
