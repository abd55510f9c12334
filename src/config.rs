//! Configuration management for selectorkit using the prefer crate.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crawl::CrawlConfig;
use crate::llm::LlmConfig;
use crate::scrapers::BrowserEngineConfig;

/// Default sitemap request timeout in seconds.
pub const DEFAULT_SITEMAP_TIMEOUT_SECS: u64 = 20;

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root of every artifact written by the toolkit.
    pub base_dir: PathBuf,
    /// User agent for plain HTTP requests.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Sitemap request timeout in seconds.
    pub sitemap_timeout: u64,
}

impl Default for Settings {
    fn default() -> Self {
        // Documents dir -> Home dir -> Current dir
        let base_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("selectorkit");

        Self {
            base_dir,
            user_agent: crate::scrapers::USER_AGENT.to_string(),
            request_timeout: 30,
            sitemap_timeout: DEFAULT_SITEMAP_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Create settings rooted at a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            ..Default::default()
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Base directory for artifacts.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "data_dir")]
    pub base_dir: Option<String>,
    /// User agent string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Sitemap request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sitemap_timeout: Option<u64>,
    /// LLM provider used for selector discovery.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Page fetcher settings.
    #[serde(default)]
    pub browser: BrowserEngineConfig,
    /// Crawl defaults.
    #[serde(default)]
    pub crawl: CrawlConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers selectorkit config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("selectorkit").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config {}: {}", path.display(), e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        // File values are the baseline; LLM_* env vars still win.
        config.llm = config.llm.with_env_overrides();
        Ok(config)
    }

    /// Directory of the config file, used to resolve relative paths.
    pub fn config_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    pub fn resolve_path(&self, path_str: &str, relative_to: &Path) -> PathBuf {
        let path = match path_str.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(path_str)),
            None => PathBuf::from(path_str),
        };

        if path.is_absolute() {
            path
        } else {
            relative_to.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, relative_to: &Path) {
        if let Some(ref base_dir) = self.base_dir {
            settings.base_dir = self.resolve_path(base_dir, relative_to);
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(timeout) = self.sitemap_timeout {
            settings.sitemap_timeout = timeout;
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Base directory override (--base-dir flag).
    pub base_dir: Option<PathBuf>,
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let config = match options.config_path {
        Some(ref config_path) => match Config::load_from_path(config_path).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}; falling back to defaults", e);
                Config::default()
            }
        },
        None => Config::load().await,
    };

    let mut settings = Settings::default();
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let relative_to = config.config_dir().unwrap_or_else(|| cwd.clone());
    config.apply_to_settings(&mut settings, &relative_to);

    // --base-dir takes precedence over the config file
    if let Some(base_dir) = options.base_dir {
        settings.base_dir = if base_dir.is_absolute() {
            base_dir
        } else {
            cwd.join(base_dir)
        };
    }

    tracing::debug!("Using base directory: {}", settings.base_dir.display());
    (settings, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_toml_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("selectorkit.toml");
        std::fs::write(
            &path,
            "base_dir = \"out\"\nsitemap_timeout = 5\n\n[crawl]\nmax_pages = 7\n",
        )
        .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.base_dir.as_deref(), Some("out"));
        assert_eq!(config.sitemap_timeout, Some(5));
        assert_eq!(config.crawl.max_pages, Some(7));
        assert_eq!(config.config_dir().as_deref(), Some(dir.path()));
    }

    #[tokio::test]
    async fn test_load_yaml_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("selectorkit.yaml");
        std::fs::write(&path, "user_agent: test-agent\nrequest_timeout: 12\n").unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.user_agent.as_deref(), Some("test-agent"));
        assert_eq!(config.request_timeout, Some(12));
    }

    #[tokio::test]
    async fn test_invalid_config_reports_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("selectorkit.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from_path(&path).await.unwrap_err();
        assert!(err.contains("JSON"));
    }

    #[test]
    fn test_relative_base_dir_resolves_against_config_dir() {
        let config = Config {
            base_dir: Some("data".to_string()),
            ..Default::default()
        };
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, Path::new("/etc/selectorkit"));
        assert_eq!(settings.base_dir, PathBuf::from("/etc/selectorkit/data"));
    }

    #[tokio::test]
    async fn test_base_dir_flag_wins() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("selectorkit.json");
        std::fs::write(&path, r#"{"base_dir": "/from/config"}"#).unwrap();

        let (settings, _) = load_settings_with_options(LoadOptions {
            config_path: Some(path),
            base_dir: Some(PathBuf::from("/from/flag")),
        })
        .await;
        assert_eq!(settings.base_dir, PathBuf::from("/from/flag"));
    }
}
