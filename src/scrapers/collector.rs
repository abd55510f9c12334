//! Fetch a page once and keep both the raw and the clean HTML on disk.

use std::path::PathBuf;

use tracing::{info, warn};

use super::clean::clean_html;
use super::fetcher::{FetchError, PageFetcher, RenderOptions};
use crate::storage::{ArtifactKind, ArtifactStore};
use crate::utils::{domain_of, page_slug};

/// Result of collecting one page.
#[derive(Debug, Clone)]
pub struct CollectedPage {
    pub url: String,
    pub final_url: String,
    pub raw_html: String,
    pub clean_html: String,
    pub raw_path: Option<PathBuf>,
    pub clean_path: Option<PathBuf>,
}

impl CollectedPage {
    /// HTML handed to discovery and replay: clean when available, raw otherwise.
    pub fn html(&self) -> &str {
        if self.clean_html.trim().is_empty() {
            &self.raw_html
        } else {
            &self.clean_html
        }
    }
}

/// Fetches pages and persists `raw/` and `clean_html/` copies.
pub struct HtmlCollector<'a> {
    fetcher: &'a dyn PageFetcher,
    store: ArtifactStore,
    options: RenderOptions,
}

impl<'a> HtmlCollector<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, store: ArtifactStore) -> Self {
        Self {
            fetcher,
            store,
            options: RenderOptions::default(),
        }
    }

    /// Fetch `url`, derive the clean variant and write both.
    ///
    /// Failing to persist a copy is logged; the HTML is still returned.
    pub async fn collect(&self, url: &str) -> Result<CollectedPage, FetchError> {
        let domain = domain_of(url).ok_or_else(|| FetchError::InvalidUrl(url.to_string()))?;
        let page = self.fetcher.fetch(url, &self.options).await?;
        if page.html.trim().is_empty() {
            return Err(FetchError::Empty(url.to_string()));
        }

        let clean = clean_html(&page.html);
        let slug = page_slug(url);

        let raw_path = match self
            .store
            .write(ArtifactKind::RawHtml, &domain, &slug, &page.html)
            .await
        {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Could not save raw HTML for {}: {}", url, e);
                None
            }
        };
        let clean_path = match self
            .store
            .write(ArtifactKind::CleanHtml, &domain, &slug, &clean)
            .await
        {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Could not save clean HTML for {}: {}", url, e);
                None
            }
        };
        if raw_path.is_some() && clean_path.is_some() {
            info!("HTML saved (raw + clean) for {}", url);
        }

        Ok(CollectedPage {
            url: url.to_string(),
            final_url: page.final_url,
            raw_html: page.html,
            clean_html: clean,
            raw_path,
            clean_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::FetchedPage;
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct StaticFetcher(&'static str);

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str, _: &RenderOptions) -> Result<FetchedPage, FetchError> {
            Ok(FetchedPage {
                url: url.to_string(),
                final_url: url.to_string(),
                status: 200,
                html: self.0.to_string(),
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn test_collect_writes_raw_and_clean() {
        let dir = tempdir().unwrap();
        let fetcher = StaticFetcher("<html><body><script>x()</script><h1>Shoe</h1></body></html>");
        let collector = HtmlCollector::new(&fetcher, ArtifactStore::new(dir.path()));

        let page = collector.collect("https://shop.com/p/shoe").await.unwrap();
        assert!(page.html().contains("<h1>Shoe</h1>"));
        assert!(!page.html().contains("<script"));

        let raw_path = page.raw_path.unwrap();
        let clean_path = page.clean_path.unwrap();
        assert!(raw_path.ends_with("shop.com/html/p_shoe.html"));
        assert!(raw_path.starts_with(dir.path().join("raw")));
        assert!(clean_path.starts_with(dir.path().join("clean_html")));
        assert!(std::fs::read_to_string(raw_path).unwrap().contains("x()"));
    }

    #[tokio::test]
    async fn test_collect_rejects_empty_pages() {
        let dir = tempdir().unwrap();
        let fetcher = StaticFetcher("   ");
        let collector = HtmlCollector::new(&fetcher, ArtifactStore::new(dir.path()));
        assert!(matches!(
            collector.collect("https://shop.com/").await,
            Err(FetchError::Empty(_))
        ));
    }

    #[tokio::test]
    async fn test_collect_rejects_relative_urls() {
        let dir = tempdir().unwrap();
        let fetcher = StaticFetcher("<p>x</p>");
        let collector = HtmlCollector::new(&fetcher, ArtifactStore::new(dir.path()));
        assert!(matches!(
            collector.collect("/p/1").await,
            Err(FetchError::InvalidUrl(_))
        ));
    }
}
