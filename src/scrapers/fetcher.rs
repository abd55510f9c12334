//! The page-fetch seam shared by discovery, replay and crawl.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("timed out after {secs}s fetching {url}")]
    Timeout { url: String, secs: u64 },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("empty response from {0}")]
    Empty(String),

    #[error("browser support not compiled; rebuild with --features browser")]
    BrowserUnavailable,
}

/// How a page should be rendered and what to capture.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Scroll to the bottom so lazy content loads.
    pub scan_full_page: bool,
    /// Pause between scroll steps.
    pub scroll_delay: Duration,
    /// Remove modal dialogs and cookie banners before capture.
    pub remove_overlays: bool,
    /// Capture a full-page PNG screenshot.
    pub screenshot: bool,
    /// Print the page to PDF.
    pub pdf: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scan_full_page: true,
            scroll_delay: Duration::from_millis(500),
            remove_overlays: true,
            screenshot: false,
            pdf: false,
        }
    }
}

impl RenderOptions {
    /// Default rendering plus the requested binary captures.
    pub fn with_captures(screenshot: bool, pdf: bool) -> Self {
        Self {
            screenshot,
            pdf,
            ..Self::default()
        }
    }
}

/// A fetched page.
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    /// URL that was requested.
    pub url: String,
    /// URL after redirects.
    pub final_url: String,
    pub status: u16,
    pub html: String,
    pub screenshot: Option<Vec<u8>>,
    pub pdf: Option<Vec<u8>>,
}

/// Retrieves rendered HTML for a URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, options: &RenderOptions) -> Result<FetchedPage, FetchError>;

    /// Release long-lived resources such as a browser process.
    async fn close(&self) {}
}
