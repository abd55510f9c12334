//! Site crawling: breadth-first, depth-first and keyword-scored best-first.
//!
//! Pages are fetched one at a time through the same [`PageFetcher`] the
//! selector pipeline uses. Best-first crawls export every page's HTML,
//! markdown, metadata, JSON record, PDF and screenshot by default.

mod frontier;
mod page;
mod scorer;

pub use page::{export_page, extract_links, read_metadata, CrawledPage, PageMetadata};
pub use scorer::KeywordRelevanceScorer;

use std::collections::HashSet;

use scraper::Html;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use self::frontier::{Frontier, PendingPage};
use crate::scrapers::{clean_html, FetchError, PageFetcher, RenderOptions};
use crate::storage::ArtifactStore;
use crate::utils::domain_of;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid start URL: {0}")]
    InvalidUrl(String),

    #[error("could not fetch start page {url}: {source}")]
    StartPage {
        url: String,
        #[source]
        source: FetchError,
    },
}

/// Traversal order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlMode {
    Breadth,
    Depth,
    /// Highest keyword relevance first.
    BestFirst { keywords: Vec<String> },
}

impl CrawlMode {
    pub fn name(&self) -> &'static str {
        match self {
            CrawlMode::Breadth => "breadth-first",
            CrawlMode::Depth => "depth-first",
            CrawlMode::BestFirst { .. } => "best-first",
        }
    }
}

/// Crawl limits from the config file or command line; unset values fall
/// back to the per-mode defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_external: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf: Option<bool>,
    /// Write per-page artifacts under `Data/`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<bool>,
}

/// Resolved crawl parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSettings {
    pub mode: CrawlMode,
    pub max_depth: usize,
    pub max_pages: usize,
    pub include_external: bool,
    pub keyword_weight: f64,
    pub screenshot: bool,
    pub pdf: bool,
    pub export: bool,
}

impl CrawlSettings {
    /// Defaults for a traversal mode.
    pub fn for_mode(mode: CrawlMode) -> Self {
        let (max_depth, max_pages, include_external, captures, export) = match mode {
            CrawlMode::Breadth => (20, 2, false, true, false),
            CrawlMode::Depth => (10, 50, false, false, false),
            CrawlMode::BestFirst { .. } => (3, 25, true, true, true),
        };
        Self {
            mode,
            max_depth,
            max_pages,
            include_external,
            keyword_weight: 0.7,
            screenshot: captures,
            pdf: captures,
            export,
        }
    }

    /// Replace defaults with whatever `config` sets.
    pub fn with_overrides(mut self, config: &CrawlConfig) -> Self {
        if let Some(v) = config.max_depth {
            self.max_depth = v;
        }
        if let Some(v) = config.max_pages {
            self.max_pages = v;
        }
        if let Some(v) = config.include_external {
            self.include_external = v;
        }
        if let Some(v) = config.keyword_weight {
            self.keyword_weight = v;
        }
        if let Some(v) = config.screenshot {
            self.screenshot = v;
        }
        if let Some(v) = config.pdf {
            self.pdf = v;
        }
        if let Some(v) = config.export {
            self.export = v;
        }
        self
    }
}

/// Outcome of a crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub pages: usize,
    pub failed: usize,
    /// Artifact files written.
    pub exported: usize,
}

pub struct Crawler<'a> {
    fetcher: &'a dyn PageFetcher,
    store: ArtifactStore,
    settings: CrawlSettings,
}

impl<'a> Crawler<'a> {
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        store: ArtifactStore,
        settings: CrawlSettings,
    ) -> Self {
        Self {
            fetcher,
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    /// Crawl from `start_url` until the frontier empties or `max_pages`
    /// pages have been fetched. Pages beyond `max_depth` are never queued.
    ///
    /// A failing start page is an error; later failures are skipped.
    pub async fn run<F>(
        &self,
        start_url: &str,
        mut on_page: F,
    ) -> Result<CrawlSummary, CrawlError>
    where
        F: FnMut(&CrawledPage),
    {
        let start = Url::parse(start_url)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .ok_or_else(|| CrawlError::InvalidUrl(start_url.to_string()))?;
        let root_domain = domain_of(start.as_str())
            .ok_or_else(|| CrawlError::InvalidUrl(start_url.to_string()))?;

        let settings = &self.settings;
        let scorer = match &settings.mode {
            CrawlMode::BestFirst { keywords } => {
                Some(KeywordRelevanceScorer::new(keywords, settings.keyword_weight))
            }
            _ => None,
        };
        let score = |url: &str| scorer.as_ref().map_or(0.0, |s| s.score(url));

        let mut frontier = match settings.mode {
            CrawlMode::Breadth => Frontier::breadth(),
            CrawlMode::Depth => Frontier::depth(),
            CrawlMode::BestFirst { .. } => Frontier::best_first(),
        };
        let mut visited = HashSet::from([start.to_string()]);
        frontier.extend(vec![PendingPage {
            url: start.to_string(),
            depth: 0,
            score: score(start.as_str()),
        }]);

        info!(
            "Starting {} crawl of {} (max depth {}, max pages {})",
            settings.mode.name(),
            start,
            settings.max_depth,
            settings.max_pages
        );

        let options = RenderOptions::with_captures(settings.screenshot, settings.pdf);
        let mut summary = CrawlSummary::default();

        while summary.pages < settings.max_pages {
            let Some(pending) = frontier.pop() else {
                break;
            };

            let fetched = match self.fetcher.fetch(&pending.url, &options).await {
                Ok(fetched) => fetched,
                Err(source) if summary.pages == 0 && pending.depth == 0 => {
                    return Err(CrawlError::StartPage {
                        url: pending.url,
                        source,
                    });
                }
                Err(e) => {
                    warn!("Skipping {}: {}", pending.url, e);
                    summary.failed += 1;
                    continue;
                }
            };

            let page = {
                let document = Html::parse_document(&fetched.html);
                let base = Url::parse(&fetched.final_url).unwrap_or_else(|_| start.clone());
                let links =
                    extract_links(&document, &base, &root_domain, settings.include_external);
                let metadata = PageMetadata {
                    status: fetched.status,
                    depth: pending.depth,
                    score: pending.score,
                    final_url: fetched.final_url.clone(),
                    ..read_metadata(&document)
                };
                let html = clean_html(&fetched.html);
                let markdown = htmd::convert(&html).unwrap_or_else(|e| {
                    warn!("Markdown conversion failed for {}: {}", pending.url, e);
                    String::new()
                });
                CrawledPage {
                    url: pending.url.clone(),
                    depth: pending.depth,
                    score: pending.score,
                    metadata,
                    links,
                    html,
                    markdown,
                    screenshot: fetched.screenshot,
                    pdf: fetched.pdf,
                }
            };

            if pending.depth < settings.max_depth {
                let children: Vec<PendingPage> = page
                    .links
                    .iter()
                    .filter(|link| visited.insert(link.to_string()))
                    .map(|link| PendingPage {
                        url: link.clone(),
                        depth: pending.depth + 1,
                        score: score(link.as_str()),
                    })
                    .collect();
                debug!("{} queued {} new links", page.url, children.len());
                frontier.extend(children);
            }

            if settings.export {
                summary.exported += export_page(&self.store, &page).await.len();
            }
            summary.pages += 1;
            on_page(&page);
        }

        info!(
            "Crawled {} pages ({} failed, {} files exported)",
            summary.pages, summary.failed, summary.exported
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::FetchedPage;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tempfile::tempdir;

    /// A tiny site: every page links to the pages listed for it.
    struct Site(HashMap<&'static str, Vec<&'static str>>);

    #[async_trait]
    impl PageFetcher for Site {
        async fn fetch(
            &self,
            url: &str,
            options: &RenderOptions,
        ) -> Result<FetchedPage, FetchError> {
            let links = self.0.get(url).ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })?;
            let anchors: String = links
                .iter()
                .map(|l| format!(r#"<a href="{}">{}</a>"#, l, l))
                .collect();
            Ok(FetchedPage {
                url: url.to_string(),
                final_url: url.to_string(),
                status: 200,
                html: format!(
                    "<html><head><title>{}</title></head><body>{}</body></html>",
                    url, anchors
                ),
                screenshot: options.screenshot.then(|| vec![1, 2, 3]),
                pdf: None,
            })
        }
    }

    fn site() -> Site {
        Site(HashMap::from([
            ("https://shop.com/", vec!["/a", "/b", "https://other.com/x"]),
            ("https://shop.com/a", vec!["/a/1", "/"]),
            ("https://shop.com/b", vec!["/phones"]),
            ("https://shop.com/a/1", vec![]),
            ("https://shop.com/phones", vec![]),
            ("https://other.com/x", vec![]),
        ]))
    }

    async fn crawl_order(settings: CrawlSettings) -> (Vec<String>, CrawlSummary) {
        let dir = tempdir().unwrap();
        let site = site();
        let crawler = Crawler::new(&site, ArtifactStore::new(dir.path()), settings);
        let mut order = Vec::new();
        let summary = crawler
            .run("https://shop.com/", |page| order.push(page.url.clone()))
            .await
            .unwrap();
        (order, summary)
    }

    fn unlimited(mode: CrawlMode) -> CrawlSettings {
        CrawlSettings::for_mode(mode).with_overrides(&CrawlConfig {
            max_pages: Some(100),
            export: Some(false),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_breadth_first_order() {
        let (order, summary) = crawl_order(unlimited(CrawlMode::Breadth)).await;
        assert_eq!(
            order,
            [
                "https://shop.com/",
                "https://shop.com/a",
                "https://shop.com/b",
                "https://shop.com/a/1",
                "https://shop.com/phones",
            ]
        );
        assert_eq!(summary.pages, 5);
    }

    #[tokio::test]
    async fn test_depth_first_order() {
        let (order, _) = crawl_order(unlimited(CrawlMode::Depth)).await;
        assert_eq!(
            order,
            [
                "https://shop.com/",
                "https://shop.com/a",
                "https://shop.com/a/1",
                "https://shop.com/b",
                "https://shop.com/phones",
            ]
        );
    }

    #[tokio::test]
    async fn test_best_first_follows_keywords_and_external_links() {
        let settings = CrawlSettings::for_mode(CrawlMode::BestFirst {
            keywords: vec!["phones".to_string()],
        })
        .with_overrides(&CrawlConfig {
            max_pages: Some(5),
            export: Some(false),
            ..Default::default()
        });
        let (order, _) = crawl_order(settings).await;
        assert_eq!(
            order,
            [
                "https://shop.com/",
                "https://shop.com/a",
                "https://shop.com/b",
                "https://shop.com/phones",
                "https://other.com/x",
            ]
        );
    }

    #[tokio::test]
    async fn test_limits() {
        let (order, _) = crawl_order(CrawlSettings::for_mode(CrawlMode::Breadth)).await;
        assert_eq!(order.len(), 2);

        let shallow = unlimited(CrawlMode::Breadth).with_overrides(&CrawlConfig {
            max_depth: Some(0),
            ..Default::default()
        });
        let (order, _) = crawl_order(shallow).await;
        assert_eq!(order, ["https://shop.com/"]);
    }

    #[tokio::test]
    async fn test_best_first_exports_artifacts() {
        let dir = tempdir().unwrap();
        let site = site();
        let settings = CrawlSettings::for_mode(CrawlMode::BestFirst { keywords: vec![] })
            .with_overrides(&CrawlConfig {
                max_pages: Some(1),
                ..Default::default()
            });
        let crawler = Crawler::new(&site, ArtifactStore::new(dir.path()), settings);
        let summary = crawler.run("https://shop.com/", |_| {}).await.unwrap();
        // html, markdown, metadata, JSON, screenshot
        assert_eq!(summary.exported, 5);
        assert!(dir.path().join("Data").is_dir());
    }

    #[tokio::test]
    async fn test_start_page_failure_is_an_error() {
        let dir = tempdir().unwrap();
        let site = site();
        let crawler = Crawler::new(
            &site,
            ArtifactStore::new(dir.path()),
            CrawlSettings::for_mode(CrawlMode::Depth),
        );
        let err = crawler
            .run("https://shop.com/missing", |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::StartPage { .. }));

        let err = crawler.run("ftp://shop.com/", |_| {}).await.unwrap_err();
        assert!(matches!(err, CrawlError::InvalidUrl(_)));
    }

    #[test]
    fn test_config_overrides_defaults() {
        let settings = CrawlSettings::for_mode(CrawlMode::Depth).with_overrides(&CrawlConfig {
            max_pages: Some(7),
            include_external: Some(true),
            ..Default::default()
        });
        assert_eq!(settings.max_pages, 7);
        assert_eq!(settings.max_depth, 10);
        assert!(settings.include_external);
    }
}
