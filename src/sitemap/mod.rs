//! Sitemap input: fetch, parse, flatten one level of index, pick samples.

mod parse;
mod picker;

pub use parse::{parse_sitemap, SitemapDocument};
pub use picker::{PickerEvent, PickerState, SamplePicker};

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::scrapers::{FetchError, HttpClient};

#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("could not fetch sitemap {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("invalid sitemap XML at {url}: {source}")]
    Xml {
        url: String,
        #[source]
        source: quick_xml::Error,
    },

    #[error("{0} is neither a <urlset> nor a <sitemapindex>")]
    NotASitemap(String),

    #[error("sitemap {0} lists no URLs")]
    Empty(String),
}

/// Anything that can return sitemap XML for a URL.
#[async_trait]
pub trait SitemapFetcher: Send + Sync {
    async fn fetch_xml(&self, url: &str) -> Result<String, SitemapError>;
}

/// Plain HTTP sitemap fetcher with its own request timeout.
pub struct SitemapSource {
    client: HttpClient,
}

impl SitemapSource {
    pub fn new(user_agent: Option<&str>, timeout_secs: u64) -> Result<Self, FetchError> {
        Ok(Self {
            client: HttpClient::new(user_agent, Duration::from_secs(timeout_secs))?,
        })
    }
}

#[async_trait]
impl SitemapFetcher for SitemapSource {
    async fn fetch_xml(&self, url: &str) -> Result<String, SitemapError> {
        let (_, _, body) = self
            .client
            .get_text(url)
            .await
            .map_err(|source| SitemapError::Fetch {
                url: url.to_string(),
                source,
            })?;
        Ok(body)
    }
}

async fn load(fetcher: &dyn SitemapFetcher, url: &str) -> Result<SitemapDocument, SitemapError> {
    debug!("Fetching sitemap: {}", url);
    let xml = fetcher.fetch_xml(url).await?;
    parse_sitemap(&xml).map_err(|source| SitemapError::Xml {
        url: url.to_string(),
        source,
    })
}

/// Every page URL listed by a sitemap, in document order.
///
/// A sitemap index is followed one level deep: each child `<urlset>`
/// contributes its entries in turn. A child that fails to load, or is itself
/// an index, is logged and skipped. Failing to load the root is an error.
pub async fn sitemap_urls(
    fetcher: &dyn SitemapFetcher,
    sitemap_url: &str,
) -> Result<Vec<String>, SitemapError> {
    let urls = match load(fetcher, sitemap_url).await? {
        SitemapDocument::UrlSet(urls) => urls,
        SitemapDocument::Index(children) => {
            let mut urls = Vec::new();
            for child in children {
                match load(fetcher, &child).await {
                    Ok(SitemapDocument::UrlSet(entries)) => urls.extend(entries),
                    Ok(SitemapDocument::Index(_)) => {
                        warn!("Skipping nested sitemap index {}", child);
                    }
                    Ok(SitemapDocument::Unknown) => {
                        warn!("Skipping {}: not a sitemap", child);
                    }
                    Err(e) => warn!("Skipping child sitemap: {}", e),
                }
            }
            urls
        }
        SitemapDocument::Unknown => {
            return Err(SitemapError::NotASitemap(sitemap_url.to_string()))
        }
    };

    info!("Sitemap {} lists {} URLs", sitemap_url, urls.len());
    Ok(urls)
}
