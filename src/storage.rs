//! On-disk layout for every artifact the toolkit writes.
//!
//! All paths are derived from a single resolver so that the directory layout
//! under the base directory is defined in one place:
//!
//! ```text
//! {base}/raw/{date}/{domain}/html/{slug}.html
//! {base}/clean_html/{date}/{domain}/html/{slug}.html
//! {base}/selectors/{domain}/{product|listing}_selector.json
//! {base}/CSV/{domain}/products.csv
//! {base}/Data/{date}/{domain_with_underscores}/{html|markdown|metadata|JSON|PDF|screenshots}/{slug}.{ext}
//! {base}/Light_House/{domain}
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::selectors::PageKind;

/// Artifacts exported per crawled page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlArtifact {
    Html,
    Markdown,
    Metadata,
    Json,
    Pdf,
    Screenshot,
}

impl CrawlArtifact {
    fn dir_name(self) -> &'static str {
        match self {
            CrawlArtifact::Html => "html",
            CrawlArtifact::Markdown => "markdown",
            CrawlArtifact::Metadata => "metadata",
            CrawlArtifact::Json => "JSON",
            CrawlArtifact::Pdf => "PDF",
            CrawlArtifact::Screenshot => "screenshots",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            CrawlArtifact::Html => "html",
            CrawlArtifact::Markdown => "md",
            CrawlArtifact::Metadata | CrawlArtifact::Json => "json",
            CrawlArtifact::Pdf => "pdf",
            CrawlArtifact::Screenshot => "png",
        }
    }
}

/// Kind of artifact being located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Page HTML as rendered.
    RawHtml,
    /// Page HTML with non-content tags stripped.
    CleanHtml,
    /// Persisted selector set for one page kind.
    Selectors(PageKind),
    /// Tabular dataset produced by replay.
    Dataset,
    /// Per-page crawl export.
    Crawl(CrawlArtifact),
    /// Output prefix handed to the lighthouse CLI.
    LighthouseReport,
}

/// Resolve where an artifact lives.
///
/// `date` and `slug` are ignored by kinds that are not partitioned by them
/// (selector files, datasets and lighthouse reports).
pub fn artifact_path(
    base_dir: &Path,
    kind: ArtifactKind,
    domain: &str,
    date: NaiveDate,
    slug: &str,
) -> PathBuf {
    let date = date.format("%Y-%m-%d").to_string();
    match kind {
        ArtifactKind::RawHtml => base_dir
            .join("raw")
            .join(date)
            .join(domain)
            .join("html")
            .join(format!("{}.html", slug)),
        ArtifactKind::CleanHtml => base_dir
            .join("clean_html")
            .join(date)
            .join(domain)
            .join("html")
            .join(format!("{}.html", slug)),
        ArtifactKind::Selectors(page_kind) => base_dir
            .join("selectors")
            .join(domain)
            .join(page_kind.file_name()),
        ArtifactKind::Dataset => base_dir.join("CSV").join(domain).join("products.csv"),
        ArtifactKind::Crawl(artifact) => base_dir
            .join("Data")
            .join(date)
            .join(domain.replace('.', "_"))
            .join(artifact.dir_name())
            .join(format!("{}.{}", slug, artifact.extension())),
        ArtifactKind::LighthouseReport => base_dir.join("Light_House").join(domain),
    }
}

/// Artifact writer bound to a base directory and today's date.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    base_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Path for an artifact dated today.
    pub fn path(&self, kind: ArtifactKind, domain: &str, slug: &str) -> PathBuf {
        artifact_path(
            &self.base_dir,
            kind,
            domain,
            chrono::Local::now().date_naive(),
            slug,
        )
    }

    /// Write an artifact dated today, creating parent directories.
    pub async fn write(
        &self,
        kind: ArtifactKind,
        domain: &str,
        slug: &str,
        contents: impl AsRef<[u8]>,
    ) -> std::io::Result<PathBuf> {
        let path = self.path(kind, domain, slug);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, contents).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn test_html_paths_are_dated() {
        let base = Path::new("/data");
        assert_eq!(
            artifact_path(base, ArtifactKind::RawHtml, "shop.com", date(), "p_1"),
            PathBuf::from("/data/raw/2024-03-09/shop.com/html/p_1.html")
        );
        assert_eq!(
            artifact_path(base, ArtifactKind::CleanHtml, "shop.com", date(), "root"),
            PathBuf::from("/data/clean_html/2024-03-09/shop.com/html/root.html")
        );
    }

    #[test]
    fn test_selector_and_dataset_paths_ignore_date() {
        let base = Path::new("/data");
        let other = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        for d in [date(), other] {
            assert_eq!(
                artifact_path(
                    base,
                    ArtifactKind::Selectors(PageKind::Product),
                    "shop.com",
                    d,
                    "ignored"
                ),
                PathBuf::from("/data/selectors/shop.com/product_selector.json")
            );
            assert_eq!(
                artifact_path(base, ArtifactKind::Dataset, "shop.com", d, ""),
                PathBuf::from("/data/CSV/shop.com/products.csv")
            );
        }
        assert_eq!(
            artifact_path(
                base,
                ArtifactKind::Selectors(PageKind::Listing),
                "shop.com",
                date(),
                ""
            ),
            PathBuf::from("/data/selectors/shop.com/listing_selector.json")
        );
    }

    #[test]
    fn test_crawl_paths() {
        let base = Path::new("/data");
        assert_eq!(
            artifact_path(
                base,
                ArtifactKind::Crawl(CrawlArtifact::Screenshot),
                "docs.example.com",
                date(),
                "https_docs.example.com_a"
            ),
            PathBuf::from(
                "/data/Data/2024-03-09/docs_example_com/screenshots/https_docs.example.com_a.png"
            )
        );
        assert_eq!(
            artifact_path(
                base,
                ArtifactKind::Crawl(CrawlArtifact::Json),
                "a.b",
                date(),
                "x"
            ),
            PathBuf::from("/data/Data/2024-03-09/a_b/JSON/x.json")
        );
    }

    #[tokio::test]
    async fn test_store_write_creates_parents() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let path = store
            .write(ArtifactKind::RawHtml, "shop.com", "root", "<html></html>")
            .await
            .unwrap();
        assert!(path.starts_with(dir.path().join("raw")));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<html></html>");
    }
}
