//! Per-page crawl results: links, metadata and exported artifacts.

use std::collections::HashSet;
use std::path::PathBuf;

use scraper::{Html, Selector};
use serde::Serialize;
use tracing::warn;
use url::Url;

use crate::storage::{ArtifactKind, ArtifactStore, CrawlArtifact};
use crate::utils::{artifact_slug, domain_of, resolve_href};

/// Document-level metadata recorded for every crawled page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub canonical: Option<String>,
    pub language: Option<String>,
    pub status: u16,
    pub depth: usize,
    pub score: f64,
    pub final_url: String,
}

/// One crawled page.
#[derive(Debug, Clone, Serialize)]
pub struct CrawledPage {
    pub url: String,
    pub depth: usize,
    pub score: f64,
    pub metadata: PageMetadata,
    pub links: Vec<String>,
    /// Cleaned HTML.
    pub html: String,
    pub markdown: String,
    #[serde(skip)]
    pub screenshot: Option<Vec<u8>>,
    #[serde(skip)]
    pub pdf: Option<Vec<u8>>,
}

fn first_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Title, description, canonical link and language of a document.
pub fn read_metadata(document: &Html) -> PageMetadata {
    let title = Selector::parse("title").ok().and_then(|selector| {
        document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    });

    PageMetadata {
        title,
        description: first_attr(document, r#"meta[name="description"]"#, "content")
            .or_else(|| first_attr(document, r#"meta[property="og:description"]"#, "content")),
        canonical: first_attr(document, r#"link[rel="canonical"]"#, "href"),
        language: first_attr(document, "html[lang]", "lang"),
        ..Default::default()
    }
}

/// Crawlable links of a page in document order, without duplicates.
///
/// Unless `include_external` is set, only links on `root_domain` are kept.
pub fn extract_links(
    document: &Html,
    base: &Url,
    root_domain: &str,
    include_external: bool,
) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| resolve_href(base, href))
        .map(|url| url.to_string())
        .filter(|url| include_external || domain_of(url).as_deref() == Some(root_domain))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Write every artifact of a crawled page under `Data/{date}/{domain}/`.
///
/// Failed writes are logged and skipped.
pub async fn export_page(store: &ArtifactStore, page: &CrawledPage) -> Vec<PathBuf> {
    let Some(domain) = domain_of(&page.url) else {
        return Vec::new();
    };
    let slug = artifact_slug(&page.url);

    let mut outputs: Vec<(CrawlArtifact, Vec<u8>)> = vec![
        (CrawlArtifact::Html, page.html.clone().into_bytes()),
        (CrawlArtifact::Markdown, page.markdown.clone().into_bytes()),
    ];
    match serde_json::to_vec_pretty(&page.metadata) {
        Ok(json) => outputs.push((CrawlArtifact::Metadata, json)),
        Err(e) => warn!("Could not serialize metadata for {}: {}", page.url, e),
    }
    match serde_json::to_vec_pretty(page) {
        Ok(json) => outputs.push((CrawlArtifact::Json, json)),
        Err(e) => warn!("Could not serialize page record for {}: {}", page.url, e),
    }
    if let Some(ref pdf) = page.pdf {
        outputs.push((CrawlArtifact::Pdf, pdf.clone()));
    }
    if let Some(ref screenshot) = page.screenshot {
        outputs.push((CrawlArtifact::Screenshot, screenshot.clone()));
    }

    let mut written = Vec::new();
    for (artifact, contents) in outputs {
        if contents.is_empty() {
            continue;
        }
        match store
            .write(ArtifactKind::Crawl(artifact), &domain, &slug, contents)
            .await
        {
            Ok(path) => written.push(path),
            Err(e) => warn!("Could not save {:?} for {}: {}", artifact, page.url, e),
        }
    }
    written
}
