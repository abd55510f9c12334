//! Command dispatch: one explicit [`Command`] value drives every flow.
//!
//! The flags-based subcommands and the interactive prompts both build a
//! `Command`; [`Pipeline::run`] wires the collector, selector store, LLM,
//! replay engine and dataset writer together for it. Anything that needs a
//! human (classifying sitemap samples) or shows progress goes through
//! [`PipelineHooks`].

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{info, warn};

use crate::audit::{audit, AuditError, AuditReport};
use crate::crawl::{
    CrawlConfig, CrawlError, CrawlMode, CrawlSettings, CrawlSummary, CrawledPage, Crawler,
};
use crate::dataset::{write_dataset, Dataset, DatasetError, WriteOutcome};
use crate::llm::CompletionBackend;
use crate::replay::{
    listing_targets, replay_listing, replay_sitemap, ReplayEngine, ReplayError, ReplayRun,
    ReplayStep,
};
use crate::scrapers::{CollectedPage, FetchError, HtmlCollector, PageFetcher};
use crate::selectors::{
    bootstrap_product_selectors, BootstrapError, BootstrapOutcome, Discovered, DiscoveryError,
    ListingSelectors, PageKind, ProductSelectors, SelectorDiscovery, SelectorStore, StoreError,
};
use crate::sitemap::{
    sitemap_urls, PickerEvent, PickerState, SamplePicker, SitemapError, SitemapFetcher,
};
use crate::storage::ArtifactStore;
use crate::utils::domain_of;

/// What discovery starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoverTarget {
    Product,
    Listing,
    Sitemap,
}

/// Where replay takes its target URLs from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaySource {
    Listing,
    Sitemap,
}

/// One unit of work.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Fetch a page and store its raw and clean HTML.
    Collect { url: String },
    /// LLM selector discovery, followed by bootstrap and replay where the
    /// target calls for it.
    Discover { target: DiscoverTarget, url: String },
    /// Replay persisted selectors without the LLM.
    Replay { source: ReplaySource, url: String },
    Crawl {
        url: String,
        mode: CrawlMode,
        limits: CrawlConfig,
    },
    Audit { url: String },
}

impl Command {
    /// Whether running this command needs an LLM backend.
    pub fn needs_llm(&self) -> bool {
        matches!(self, Command::Discover { .. })
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("selector discovery needs an LLM; configure a provider or use `selectorkit replay`")]
    LlmRequired,

    #[error("could not fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("no usable sample page in {0}; every URL was skipped")]
    NoSample(String),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Replay(#[from] ReplayError),

    #[error(transparent)]
    Sitemap(#[from] SitemapError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Crawl(#[from] CrawlError),

    #[error(transparent)]
    Audit(#[from] AuditError),
}

/// Rows scraped by a replay and where they went.
#[derive(Debug, Clone)]
pub struct DatasetReport {
    pub domain: String,
    pub targets: usize,
    pub rows: usize,
    pub written: WriteOutcome,
}

/// What a command produced.
#[derive(Debug, Clone)]
pub enum Outcome {
    Collected(CollectedPage),
    Product(Discovered<ProductSelectors>),
    Listing {
        listing: Discovered<ListingSelectors>,
        bootstrap: BootstrapOutcome,
        dataset: DatasetReport,
    },
    Sitemap {
        sample: String,
        kind: PageKind,
        dataset: DatasetReport,
    },
    Replayed(DatasetReport),
    Crawled(CrawlSummary),
    Audited(AuditReport),
}

/// Callbacks for the parts of a run that involve the user.
pub trait PipelineHooks {
    /// Verdict on a randomly drawn sitemap URL.
    fn classify_sample(&mut self, url: &str) -> PickerEvent;

    fn replay_step(&mut self, _step: ReplayStep<'_>) {}

    fn page_crawled(&mut self, _page: &CrawledPage) {}
}

/// Hooks for unattended runs: sitemap samples are always product pages.
pub struct Unattended;

impl PipelineHooks for Unattended {
    fn classify_sample(&mut self, _url: &str) -> PickerEvent {
        PickerEvent::Classify(PageKind::Product)
    }
}

pub struct Pipeline<'a> {
    fetcher: &'a dyn PageFetcher,
    sitemaps: &'a dyn SitemapFetcher,
    llm: Option<&'a dyn CompletionBackend>,
    base_dir: PathBuf,
    crawl_defaults: CrawlConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        sitemaps: &'a dyn SitemapFetcher,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            sitemaps,
            llm: None,
            base_dir: base_dir.into(),
            crawl_defaults: CrawlConfig::default(),
        }
    }

    pub fn with_llm(mut self, llm: &'a dyn CompletionBackend) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Crawl limits from the config file, applied under per-command limits.
    pub fn with_crawl_defaults(mut self, defaults: CrawlConfig) -> Self {
        self.crawl_defaults = defaults;
        self
    }

    pub async fn run(
        &self,
        command: Command,
        hooks: &mut dyn PipelineHooks,
    ) -> Result<Outcome, PipelineError> {
        let store = SelectorStore::new(&self.base_dir);
        let collector = HtmlCollector::new(self.fetcher, ArtifactStore::new(&self.base_dir));

        match command {
            Command::Collect { url } => Ok(Outcome::Collected(collect(&collector, &url).await?)),
            Command::Discover { target, url } => {
                let llm = self.llm.ok_or(PipelineError::LlmRequired)?;
                let discovery = SelectorDiscovery::new(llm, &store);
                match target {
                    DiscoverTarget::Product => {
                        let page = collect(&collector, &url).await?;
                        let discovered = discovery
                            .discover::<ProductSelectors>(page.html(), &url)
                            .await?;
                        Ok(Outcome::Product(discovered))
                    }
                    DiscoverTarget::Listing => {
                        self.discover_listing(&collector, &discovery, &url, hooks)
                            .await
                    }
                    DiscoverTarget::Sitemap => {
                        self.discover_sitemap(&collector, &discovery, &url, hooks)
                            .await
                    }
                }
            }
            Command::Replay { source, url } => {
                let run = match source {
                    ReplaySource::Listing => {
                        replay_listing(&collector, &store, &url, |step| hooks.replay_step(step))
                            .await?
                    }
                    ReplaySource::Sitemap => {
                        replay_sitemap(&collector, &store, self.sitemaps, &url, |step| {
                            hooks.replay_step(step)
                        })
                        .await?
                    }
                };
                Ok(Outcome::Replayed(self.write(run)?))
            }
            Command::Crawl { url, mode, limits } => {
                let settings = CrawlSettings::for_mode(mode)
                    .with_overrides(&self.crawl_defaults)
                    .with_overrides(&limits);
                let crawler =
                    Crawler::new(self.fetcher, ArtifactStore::new(&self.base_dir), settings);
                let summary = crawler.run(&url, |page| hooks.page_crawled(page)).await?;
                Ok(Outcome::Crawled(summary))
            }
            Command::Audit { url } => Ok(Outcome::Audited(audit(&url, &self.base_dir).await?)),
        }
    }

    /// Listing discovery, then product bootstrap, then a replay of the
    /// listing's product links into the dataset.
    async fn discover_listing(
        &self,
        collector: &HtmlCollector<'_>,
        discovery: &SelectorDiscovery<'_>,
        url: &str,
        hooks: &mut dyn PipelineHooks,
    ) -> Result<Outcome, PipelineError> {
        let page = collect(collector, url).await?;
        let listing = discovery
            .discover::<ListingSelectors>(page.html(), url)
            .await?;
        let bootstrap = bootstrap_product_selectors(
            &listing.selectors,
            page.html(),
            url,
            &listing.domain,
            collector,
            discovery,
        )
        .await?;

        let product: ProductSelectors = discovery.store().load(&listing.domain)?;
        let targets = listing_targets(page.html(), url, &listing.selectors);
        let dataset = self
            .replay_targets(collector, &targets, &product, hooks)
            .await;
        let dataset = self.write(ReplayRun {
            domain: listing.domain.clone(),
            targets: targets.len(),
            dataset,
        })?;

        Ok(Outcome::Listing {
            listing,
            bootstrap,
            dataset,
        })
    }

    /// Pick one sample page from the sitemap, discover selectors from it and
    /// replay the product selectors over every sitemap URL.
    async fn discover_sitemap(
        &self,
        collector: &HtmlCollector<'_>,
        discovery: &SelectorDiscovery<'_>,
        sitemap_url: &str,
        hooks: &mut dyn PipelineHooks,
    ) -> Result<Outcome, PipelineError> {
        let domain = domain_of(sitemap_url)
            .ok_or_else(|| DiscoveryError::InvalidUrl(sitemap_url.to_string()))?;
        let urls = sitemap_urls(self.sitemaps, sitemap_url).await?;
        if urls.is_empty() {
            return Err(SitemapError::Empty(sitemap_url.to_string()).into());
        }

        let (sample, kind, page) = pick_sample(collector, &urls, sitemap_url, hooks).await?;
        info!("Using {} as a {} sample", sample, kind);
        match kind {
            PageKind::Product => {
                discovery
                    .discover_for_domain::<ProductSelectors>(page.html(), &sample, &domain)
                    .await?;
            }
            PageKind::Listing => {
                let listing = discovery
                    .discover_for_domain::<ListingSelectors>(page.html(), &sample, &domain)
                    .await?;
                bootstrap_product_selectors(
                    &listing.selectors,
                    page.html(),
                    &sample,
                    &domain,
                    collector,
                    discovery,
                )
                .await?;
            }
        }

        let product: ProductSelectors = discovery.store().load(&domain)?;
        let dataset = self.replay_targets(collector, &urls, &product, hooks).await;
        let dataset = self.write(ReplayRun {
            domain,
            targets: urls.len(),
            dataset,
        })?;
        Ok(Outcome::Sitemap {
            sample,
            kind,
            dataset,
        })
    }

    async fn replay_targets(
        &self,
        collector: &HtmlCollector<'_>,
        targets: &[String],
        product: &ProductSelectors,
        hooks: &mut dyn PipelineHooks,
    ) -> Dataset {
        ReplayEngine::new(collector)
            .replay_with_progress(targets, product, |step| hooks.replay_step(step))
            .await
    }

    fn write(&self, run: ReplayRun) -> Result<DatasetReport, PipelineError> {
        let written = write_dataset(&run.dataset, &run.domain, &self.base_dir)?;
        Ok(DatasetReport {
            domain: run.domain,
            targets: run.targets,
            rows: run.dataset.len(),
            written,
        })
    }
}

async fn collect(
    collector: &HtmlCollector<'_>,
    url: &str,
) -> Result<CollectedPage, PipelineError> {
    collector
        .collect(url)
        .await
        .map_err(|source| PipelineError::Fetch {
            url: url.to_string(),
            source,
        })
}

/// Drive the sample picker until a classified page has been fetched.
async fn pick_sample(
    collector: &HtmlCollector<'_>,
    urls: &[String],
    sitemap_url: &str,
    hooks: &mut dyn PipelineHooks,
) -> Result<(String, PageKind, CollectedPage), PipelineError> {
    let mut picker = SamplePicker::new(urls.to_vec(), StdRng::from_os_rng());
    loop {
        let candidate = match picker.state() {
            PickerState::Selecting { candidate } => candidate.clone(),
            PickerState::Confirmed { .. } | PickerState::Exhausted => {
                return Err(PipelineError::NoSample(sitemap_url.to_string()));
            }
        };

        let event = hooks.classify_sample(&candidate);
        let PickerEvent::Classify(kind) = event else {
            picker.apply(event);
            continue;
        };

        match collector.collect(&candidate).await {
            Ok(page) => {
                picker.apply(event);
                return Ok((candidate, kind, page));
            }
            Err(e) => {
                warn!("Sample {} could not be fetched: {}", candidate, e);
                picker.apply(PickerEvent::FetchFailed);
            }
        }
    }
}
