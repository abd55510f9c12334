//! Page fetching: the `PageFetcher` seam, its browser and plain-HTTP
//! implementations, and raw/clean HTML collection.

pub mod browser;
mod clean;
mod collector;
mod fetcher;
mod http_client;

pub use browser::{BrowserEngineConfig, BrowserEngineType, BrowserFetcher};
pub use clean::{clean_html, EXCLUDED_TAGS};
pub use collector::{CollectedPage, HtmlCollector};
pub use fetcher::{FetchError, FetchedPage, PageFetcher, RenderOptions};
pub use http_client::{resolve_user_agent, HttpClient, USER_AGENT};

use std::time::Duration;

use tracing::info;

/// Build the fetcher selected by the engine config.
///
/// The `http` engine, and builds without the `browser` feature, fall back to
/// plain HTTP requests.
pub fn create_fetcher(
    config: &BrowserEngineConfig,
    user_agent: &str,
    timeout: Duration,
) -> Result<Box<dyn PageFetcher>, FetchError> {
    if config.engine == BrowserEngineType::Http || !cfg!(feature = "browser") {
        info!("Using plain HTTP fetcher");
        return Ok(Box::new(HttpClient::new(Some(user_agent), timeout)?));
    }
    Ok(Box::new(BrowserFetcher::new(config.clone())))
}
