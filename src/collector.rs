#![forbid(unsafe_code)]

//! Follows continuation tokens through every page of one window.

use crate::error::PageFetchError;
use crate::window::DateRange;

/// Pages allowed per window unless configured otherwise. The search endpoint
/// stops at 500 results (10 pages of 50), so this leaves ample headroom.
pub const DEFAULT_MAX_PAGES: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    pub video_id: String,
}

impl VideoRecord {
    pub fn new(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
        }
    }
}

/// One decoded response from the search endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<VideoRecord>,
    pub next_token: Option<String>,
}

/// Anything able to fetch one page of a channel's uploads for a window.
/// `token` is empty for the first page.
pub trait PageFetcher {
    fn fetch_page(
        &self,
        channel_id: &str,
        window: &DateRange,
        token: &str,
    ) -> Result<Page, PageFetchError>;
}

impl<T: PageFetcher + ?Sized> PageFetcher for &T {
    fn fetch_page(
        &self,
        channel_id: &str,
        window: &DateRange,
        token: &str,
    ) -> Result<Page, PageFetchError> {
        (**self).fetch_page(channel_id, window, token)
    }
}

/// Outcome of paginating one window. A failure keeps what was gathered
/// before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collected {
    Complete(Vec<VideoRecord>),
    Partial {
        items: Vec<VideoRecord>,
        error: PageFetchError,
    },
}

impl Collected {
    pub fn items(&self) -> &[VideoRecord] {
        match self {
            Collected::Complete(items) | Collected::Partial { items, .. } => items.as_slice(),
        }
    }

    pub fn into_items(self) -> Vec<VideoRecord> {
        match self {
            Collected::Complete(items) | Collected::Partial { items, .. } => items,
        }
    }

    pub fn error(&self) -> Option<&PageFetchError> {
        match self {
            Collected::Complete(_) => None,
            Collected::Partial { error, .. } => Some(error),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaginatedCollector<F> {
    fetcher: F,
    max_pages: usize,
}

impl<F: PageFetcher> PaginatedCollector<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// A ceiling of zero is raised to one so every window gets at least one
    /// request.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Fetches pages for `window` until the service stops handing out
    /// continuation tokens. Errors are logged and turned into
    /// [`Collected::Partial`]; nothing is retried.
    pub fn collect(&self, channel_id: &str, window: &DateRange) -> Collected {
        tracing::info!(
            "Getting videos published before {} and after {}",
            window.start(),
            window.end()
        );

        let mut items = Vec::new();
        let mut token = String::new();
        let mut pages = 0usize;

        loop {
            if pages == self.max_pages {
                let error = PageFetchError::PageLimitExceeded {
                    limit: self.max_pages,
                };
                tracing::error!(%window, %error, "stopping search in this time interval");
                return Collected::Partial { items, error };
            }

            let page = match self.fetcher.fetch_page(channel_id, window, &token) {
                Ok(page) => page,
                Err(error) => {
                    tracing::error!(
                        %window,
                        %error,
                        "failed to retrieve a subset of the channel videos, stopping search in this time interval"
                    );
                    return Collected::Partial { items, error };
                }
            };
            pages += 1;
            tracing::debug!(page = pages, received = page.items.len(), "page received");
            items.extend(page.items);

            match page.next_token {
                Some(next) if !next.is_empty() => {
                    tracing::info!("More videos to load, continuing");
                    token = next;
                }
                _ => {
                    tracing::info!(
                        "No more videos to load, found {} video(s) in this time interval",
                        items.len()
                    );
                    return Collected::Complete(items);
                }
            }
        }
    }
}
