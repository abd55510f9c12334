//! Replay persisted selector sets over many pages.
//!
//! Targets come from a listing page's product cards or from a sitemap.
//! Pages are fetched strictly one after another; a page that fails to fetch
//! is logged and skipped, never aborting the batch.

mod extract;
mod targets;

pub use extract::{extract_row, URL_FIELD};
pub use targets::listing_targets;

use thiserror::Error;
use tracing::{info, warn};

use crate::dataset::Dataset;
use crate::scrapers::{FetchError, HtmlCollector};
use crate::selectors::{
    ListingSelectors, ProductSelectors, SelectorSchema, SelectorStore, StoreError,
};
use crate::sitemap::{sitemap_urls, SitemapError, SitemapFetcher};
use crate::utils::domain_of;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error(transparent)]
    Selectors(#[from] StoreError),

    #[error("could not fetch listing page {url}: {source}")]
    ListingFetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error(
        "listing selectors for {0} lack product_card or product_link; \
         run `selectorkit discover listing <url>` again"
    )]
    UnusableListing(String),

    #[error(transparent)]
    Sitemap(#[from] SitemapError),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// One finished step of a replay batch.
#[derive(Debug, Clone, Copy)]
pub struct ReplayStep<'u> {
    /// Zero-based position in the target list.
    pub index: usize,
    pub total: usize,
    pub url: &'u str,
    /// False when the page was skipped.
    pub scraped: bool,
}

/// Dataset produced for one domain.
#[derive(Debug)]
pub struct ReplayRun {
    pub domain: String,
    pub targets: usize,
    pub dataset: Dataset,
}

/// Fetches target pages and extracts one row per page.
pub struct ReplayEngine<'c, 'f> {
    collector: &'c HtmlCollector<'f>,
}

impl<'c, 'f> ReplayEngine<'c, 'f> {
    pub fn new(collector: &'c HtmlCollector<'f>) -> Self {
        Self { collector }
    }

    /// Replay `selectors` over `targets`, reporting each finished step.
    pub async fn replay_with_progress<S, F>(
        &self,
        targets: &[String],
        selectors: &S,
        mut on_step: F,
    ) -> Dataset
    where
        S: SelectorSchema,
        F: FnMut(ReplayStep<'_>),
    {
        let mut dataset = Dataset::new();
        let total = targets.len();
        for (index, url) in targets.iter().enumerate() {
            let scraped = match self.collector.collect(url).await {
                Ok(page) => {
                    dataset.push(extract_row(page.html(), url, selectors));
                    true
                }
                Err(e) => {
                    warn!("Skipping {}: {}", url, e);
                    false
                }
            };
            on_step(ReplayStep {
                index,
                total,
                url,
                scraped,
            });
        }
        info!("Scraped {} of {} pages", dataset.len(), total);
        dataset
    }
}

/// Replay persisted selectors over the product cards of a listing page.
///
/// Both selector files must already exist for the listing's domain.
pub async fn replay_listing<F>(
    collector: &HtmlCollector<'_>,
    store: &SelectorStore,
    listing_url: &str,
    on_step: F,
) -> Result<ReplayRun, ReplayError>
where
    F: FnMut(ReplayStep<'_>),
{
    let domain =
        domain_of(listing_url).ok_or_else(|| ReplayError::InvalidUrl(listing_url.to_string()))?;
    let listing: ListingSelectors = store.load(&domain)?;
    let product: ProductSelectors = store.load(&domain)?;
    if !listing.can_locate_products() {
        return Err(ReplayError::UnusableListing(domain));
    }

    let page = collector
        .collect(listing_url)
        .await
        .map_err(|source| ReplayError::ListingFetch {
            url: listing_url.to_string(),
            source,
        })?;
    let targets = listing_targets(page.html(), listing_url, &listing);
    info!("Listing {} links to {} products", listing_url, targets.len());

    let dataset = ReplayEngine::new(collector)
        .replay_with_progress(&targets, &product, on_step)
        .await;
    Ok(ReplayRun {
        domain,
        targets: targets.len(),
        dataset,
    })
}

/// Replay persisted product selectors over every URL of a sitemap.
///
/// Selectors and the dataset are keyed by the sitemap's domain.
pub async fn replay_sitemap<F>(
    collector: &HtmlCollector<'_>,
    store: &SelectorStore,
    sitemaps: &dyn SitemapFetcher,
    sitemap_url: &str,
    on_step: F,
) -> Result<ReplayRun, ReplayError>
where
    F: FnMut(ReplayStep<'_>),
{
    let domain =
        domain_of(sitemap_url).ok_or_else(|| ReplayError::InvalidUrl(sitemap_url.to_string()))?;
    let product: ProductSelectors = store.load(&domain)?;
    let targets = sitemap_urls(sitemaps, sitemap_url).await?;

    let dataset = ReplayEngine::new(collector)
        .replay_with_progress(&targets, &product, on_step)
        .await;
    Ok(ReplayRun {
        domain,
        targets: targets.len(),
        dataset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::{FetchedPage, PageFetcher, RenderOptions};
    use crate::selectors::PageKind;
    use crate::sitemap::tests::MemorySitemaps;
    use crate::storage::ArtifactStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Serves pages from memory and records the fetch order.
    struct MemoryFetcher {
        pages: HashMap<String, String>,
        fetched: Mutex<Vec<String>>,
    }

    impl MemoryFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(u, h)| (u.to_string(), h.to_string()))
                    .collect(),
                fetched: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for MemoryFetcher {
        async fn fetch(&self, url: &str, _: &RenderOptions) -> Result<FetchedPage, FetchError> {
            self.fetched.lock().unwrap().push(url.to_string());
            let html = self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })?;
            Ok(FetchedPage {
                url: url.to_string(),
                final_url: url.to_string(),
                status: 200,
                html,
                ..Default::default()
            })
        }
    }

    const LISTING: &str = r#"<html><body>
        <div class="card"><a href="/p/1">One</a></div>
        <div class="card"><a href="/p/2">Two</a></div>
        <div class="card"><a href="/p/1">One again</a></div>
        <div class="card"><a href="/p/missing">Gone</a></div>
    </body></html>"#;

    fn product_page(name: &str) -> String {
        format!(
            r#"<html><body><h1>{}</h1><span class="price">$10</span></body></html>"#,
            name
        )
    }

    fn save_selectors(store: &SelectorStore) {
        store
            .save(
                "shop.com",
                &ListingSelectors {
                    product_card: ".card".to_string(),
                    product_link: "a".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();
        store
            .save(
                "shop.com",
                &ProductSelectors {
                    name: "h1".to_string(),
                    price: ".price".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    #[tokio::test]
    async fn test_listing_replay_skips_failures_in_order() {
        let dir = tempdir().unwrap();
        let one = product_page("One");
        let two = product_page("Two");
        let fetcher = MemoryFetcher::new(&[
            ("https://shop.com/list", LISTING),
            ("https://shop.com/p/1", one.as_str()),
            ("https://shop.com/p/2", two.as_str()),
        ]);
        let collector = HtmlCollector::new(&fetcher, ArtifactStore::new(dir.path()));
        let store = SelectorStore::new(dir.path());
        save_selectors(&store);

        let mut steps = Vec::new();
        let run = replay_listing(&collector, &store, "https://shop.com/list", |step| {
            steps.push((step.index, step.scraped))
        })
        .await
        .unwrap();

        assert_eq!(run.domain, "shop.com");
        assert_eq!(run.targets, 3);
        assert_eq!(steps, vec![(0, true), (1, true), (2, false)]);
        assert_eq!(
            *fetcher.fetched.lock().unwrap(),
            vec![
                "https://shop.com/list",
                "https://shop.com/p/1",
                "https://shop.com/p/2",
                "https://shop.com/p/missing",
            ]
        );

        let rows = run.dataset.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("name"), Some("One"));
        assert_eq!(rows[1].get("name"), Some("Two"));
        assert_eq!(rows[1].get("price"), Some("$10"));
        assert_eq!(rows[1].get(URL_FIELD), Some("https://shop.com/p/2"));
    }

    #[tokio::test]
    async fn test_missing_selector_file_is_a_precondition_error() {
        let dir = tempdir().unwrap();
        let fetcher = MemoryFetcher::new(&[("https://shop.com/list", LISTING)]);
        let collector = HtmlCollector::new(&fetcher, ArtifactStore::new(dir.path()));
        let store = SelectorStore::new(dir.path());

        let err = replay_listing(&collector, &store, "https://shop.com/list", |_| {})
            .await
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("run `selectorkit discover listing <url>` once first"));
        match err {
            ReplayError::Selectors(StoreError::Missing { kind, .. }) => {
                assert_eq!(kind, PageKind::Listing)
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(fetcher.fetched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sitemap_replay_with_no_reachable_pages_is_empty() {
        let dir = tempdir().unwrap();
        let fetcher = MemoryFetcher::new(&[]);
        let collector = HtmlCollector::new(&fetcher, ArtifactStore::new(dir.path()));
        let store = SelectorStore::new(dir.path());
        save_selectors(&store);
        let sitemaps = MemorySitemaps(HashMap::from([(
            "https://shop.com/sitemap.xml".to_string(),
            r#"<urlset><url><loc>https://shop.com/p/9</loc></url></urlset>"#.to_string(),
        )]));

        let run = replay_sitemap(
            &collector,
            &store,
            &sitemaps,
            "https://shop.com/sitemap.xml",
            |_| {},
        )
        .await
        .unwrap();
        assert_eq!(run.targets, 1);
        assert!(run.dataset.is_empty());
    }
}
