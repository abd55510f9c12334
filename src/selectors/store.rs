//! Per-domain selector files.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use super::{PageKind, SelectorSchema};
use crate::storage::{artifact_path, ArtifactKind};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no {kind} selectors for {domain}; run `selectorkit discover {kind} <url>` once first")]
    Missing { domain: String, kind: PageKind },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("selector file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads and writes `{base}/selectors/{domain}/{kind}_selector.json`.
#[derive(Debug, Clone)]
pub struct SelectorStore {
    base_dir: PathBuf,
}

impl SelectorStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn path(&self, domain: &str, kind: PageKind) -> PathBuf {
        artifact_path(
            &self.base_dir,
            ArtifactKind::Selectors(kind),
            domain,
            chrono::Local::now().date_naive(),
            "",
        )
    }

    pub fn exists(&self, domain: &str, kind: PageKind) -> bool {
        self.path(domain, kind).is_file()
    }

    /// Load a selector set, projecting the file through the schema so that
    /// hand-edited files with missing or extra keys still load.
    pub fn load<S: SelectorSchema>(&self, domain: &str) -> Result<S, StoreError> {
        let path = self.path(domain, S::KIND);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::Missing {
                    domain: domain.to_string(),
                    kind: S::KIND,
                })
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        let value: Value =
            serde_json::from_str(&contents).map_err(|source| StoreError::Json {
                path: path.clone(),
                source,
            })?;
        Ok(S::repair(&value))
    }

    /// Write a selector set as indented JSON, replacing any previous file.
    ///
    /// The file is written to a temporary sibling and renamed into place, so
    /// readers never observe a partially written set.
    pub fn save<S: SelectorSchema>(
        &self,
        domain: &str,
        selectors: &S,
    ) -> Result<PathBuf, StoreError> {
        let path = self.path(domain, S::KIND);
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.base_dir.clone());
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(&dir).map_err(io_err)?;
        let json = serde_json::to_string_pretty(selectors).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.write_all(b"\n").map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;

        info!("Saved {} selectors for {} at {}", S::KIND, domain, path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::{ListingSelectors, ProductSelectors};
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_reports_hint() {
        let dir = tempdir().unwrap();
        let store = SelectorStore::new(dir.path());
        let err = store.load::<ProductSelectors>("shop.com").unwrap_err();
        assert!(matches!(err, StoreError::Missing { kind: PageKind::Product, .. }));
        assert!(err.to_string().contains("discover product"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = SelectorStore::new(dir.path());
        let listing = ListingSelectors {
            product_card: "li.card".into(),
            product_link: "a".into(),
            ..Default::default()
        };

        let path = store.save("shop.com", &listing).unwrap();
        assert_eq!(
            path,
            dir.path().join("selectors/shop.com/listing_selector.json")
        );
        assert!(store.exists("shop.com", PageKind::Listing));
        assert!(!store.exists("shop.com", PageKind::Product));
        assert_eq!(store.load::<ListingSelectors>("shop.com").unwrap(), listing);
    }

    #[test]
    fn test_save_overwrites_and_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let store = SelectorStore::new(dir.path());
        store
            .save("shop.com", &ProductSelectors { name: "h1".into(), ..Default::default() })
            .unwrap();
        store
            .save("shop.com", &ProductSelectors { name: "h2".into(), ..Default::default() })
            .unwrap();

        let loaded: ProductSelectors = store.load("shop.com").unwrap();
        assert_eq!(loaded.name, "h2");
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("selectors/shop.com"))
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_load_repairs_hand_edited_file() {
        let dir = tempdir().unwrap();
        let store = SelectorStore::new(dir.path());
        let path = store.path("shop.com", PageKind::Product);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"name": "h1", "price": 5, "extra": ".x"}"#).unwrap();

        let loaded: ProductSelectors = store.load("shop.com").unwrap();
        assert_eq!(loaded.name, "h1");
        assert_eq!(loaded.price, "");
    }

    #[test]
    fn test_corrupt_file_is_json_error() {
        let dir = tempdir().unwrap();
        let store = SelectorStore::new(dir.path());
        let path = store.path("shop.com", PageKind::Listing);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{").unwrap();
        assert!(matches!(
            store.load::<ListingSelectors>("shop.com"),
            Err(StoreError::Json { .. })
        ));
    }
}
