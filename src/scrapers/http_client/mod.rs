//! Plain HTTP client for sitemaps and non-rendered page fetches.

mod user_agent;

pub use user_agent::{resolve_user_agent, USER_AGENT};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::fetcher::{FetchError, FetchedPage, PageFetcher, RenderOptions};

/// HTTP client with a fixed user agent and per-request timeout.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client.
    /// - None: default selectorkit user agent
    /// - Some("impersonate"): random real browser user agent
    /// - Some(custom): custom user agent string
    pub fn new(user_agent_config: Option<&str>, timeout: Duration) -> Result<Self, FetchError> {
        let user_agent = resolve_user_agent(user_agent_config);
        let client = Client::builder()
            .user_agent(&user_agent)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client, timeout })
    }

    /// GET a URL and return (final URL, status, body). Non-2xx is an error.
    pub async fn get_text(&self, url: &str) -> Result<(String, u16, String), FetchError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    secs: self.timeout.as_secs(),
                }
            } else {
                FetchError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let body = response.text().await?;
        Ok((final_url, status.as_u16(), body))
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &str, options: &RenderOptions) -> Result<FetchedPage, FetchError> {
        if options.screenshot || options.pdf {
            debug!("Plain HTTP fetch cannot capture screenshots or PDFs for {}", url);
        }

        let (final_url, status, html) = self.get_text(url).await?;
        if html.trim().is_empty() {
            return Err(FetchError::Empty(url.to_string()));
        }

        Ok(FetchedPage {
            url: url.to_string(),
            final_url,
            status,
            html,
            screenshot: None,
            pdf: None,
        })
    }
}
