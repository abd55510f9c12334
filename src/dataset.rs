//! Scraped rows and the CSV dataset writer.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::storage::{artifact_path, ArtifactKind};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("CSV error writing {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One scraped page: field name to extracted text, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapedRow {
    fields: Vec<(String, String)>,
}

impl ScrapedRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing an earlier value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Rows accumulated by one replay run.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<ScrapedRow>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: ScrapedRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[ScrapedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column set: the keys of the first row.
    pub fn columns(&self) -> Vec<&str> {
        self.rows
            .first()
            .map(|row| row.keys().collect())
            .unwrap_or_default()
    }
}

/// What the writer did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The dataset was empty; nothing was written.
    NoRows,
    Written { path: PathBuf, rows: usize },
}

/// Write `{base_dir}/CSV/{domain}/products.csv`, replacing any earlier file.
///
/// The header is taken from the first row; later rows are written in that
/// column order, with missing keys left empty.
pub fn write_dataset(
    dataset: &Dataset,
    domain: &str,
    base_dir: &Path,
) -> Result<WriteOutcome, DatasetError> {
    if dataset.is_empty() {
        info!("No rows scraped for {}; skipping CSV", domain);
        return Ok(WriteOutcome::NoRows);
    }

    let path = artifact_path(
        base_dir,
        ArtifactKind::Dataset,
        domain,
        chrono::Local::now().date_naive(),
        "",
    );
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| DatasetError::Io {
            path: path.clone(),
            source,
        })?;
    }

    let csv_err = |source| DatasetError::Csv {
        path: path.clone(),
        source,
    };
    let columns = dataset.columns();
    let mut writer = csv::Writer::from_path(&path).map_err(csv_err)?;
    writer.write_record(&columns).map_err(csv_err)?;
    for row in dataset.rows() {
        writer
            .write_record(columns.iter().map(|col| row.get(col).unwrap_or_default()))
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|source| DatasetError::Io {
        path: path.clone(),
        source,
    })?;

    info!("Wrote {} rows to {}", dataset.len(), path.display());
    Ok(WriteOutcome::Written {
        path,
        rows: dataset.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(name: &str, price: &str, url: &str) -> ScrapedRow {
        let mut row = ScrapedRow::new();
        row.insert("name", name);
        row.insert("price", price);
        row.insert("url", url);
        row
    }

    #[test]
    fn test_empty_dataset_writes_nothing() {
        let dir = tempdir().unwrap();
        let outcome = write_dataset(&Dataset::new(), "shop.com", dir.path()).unwrap();
        assert_eq!(outcome, WriteOutcome::NoRows);
        assert!(!dir.path().join("CSV").exists());
    }

    #[test]
    fn test_writes_header_from_first_row() {
        let dir = tempdir().unwrap();
        let mut dataset = Dataset::new();
        dataset.push(row("Trail, \"Pro\"", "$99", "https://shop.com/p/1"));
        dataset.push(row("Road", "", "https://shop.com/p/2"));

        let outcome = write_dataset(&dataset, "shop.com", dir.path()).unwrap();
        let path = dir.path().join("CSV/shop.com/products.csv");
        assert_eq!(outcome, WriteOutcome::Written { path: path.clone(), rows: 2 });

        let contents = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "name,price,url");
        assert_eq!(lines[1], "\"Trail, \"\"Pro\"\"\",$99,https://shop.com/p/1");
        assert_eq!(lines[2], "Road,,https://shop.com/p/2");
    }

    #[test]
    fn test_rerun_overwrites() {
        let dir = tempdir().unwrap();
        let mut first = Dataset::new();
        first.push(row("A", "1", "u1"));
        first.push(row("B", "2", "u2"));
        write_dataset(&first, "shop.com", dir.path()).unwrap();

        let mut second = Dataset::new();
        second.push(row("C", "3", "u3"));
        write_dataset(&second, "shop.com", dir.path()).unwrap();

        let contents =
            std::fs::read_to_string(dir.path().join("CSV/shop.com/products.csv")).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("C,3,u3"));
    }

    #[test]
    fn test_row_insert_replaces_existing_key() {
        let mut r = row("A", "1", "u");
        r.insert("price", "2");
        assert_eq!(r.get("price"), Some("2"));
        assert_eq!(r.keys().collect::<Vec<_>>(), vec!["name", "price", "url"]);
    }
}
