//! Page rendering and capture.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, SetUserAgentOverrideParams};
use chromiumoxide::cdp::browser_protocol::page::{NavigateParams, PrintToPdfParams};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use tracing::{debug, info, warn};

use super::stealth::{
    REMOVE_OVERLAYS_SCRIPT, SCROLL_SCRIPT, STEALTH_SCRIPTS, WAIT_FOR_READY_SCRIPT,
};
use super::{BrowserEngineType, BrowserFetcher};
use crate::scrapers::fetcher::{FetchedPage, RenderOptions};
use crate::scrapers::http_client::resolve_user_agent;

impl BrowserFetcher {
    /// Open a tab, render `url` and capture what `options` asks for.
    pub(super) async fn render(&self, url: &str, options: &RenderOptions) -> Result<FetchedPage> {
        let mut guard = self.browser.lock().await;
        if guard.is_none() {
            *guard = Some(self.start_browser().await?);
        }
        let browser = guard
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("browser not running"))?;

        let page = browser.new_page("about:blank").await?;
        let result = self.render_in(&page, url, options).await;

        // Close the tab to prevent accumulation
        let _ = page.close().await;
        result
    }

    async fn render_in(&self, page: &Page, url: &str, options: &RenderOptions) -> Result<FetchedPage> {
        let user_agent = match self.config.user_agent.as_deref() {
            Some(ua) => resolve_user_agent(Some(ua)),
            None => resolve_user_agent(Some("impersonate")),
        };
        page.execute(SetUserAgentOverrideParams::new(user_agent))
            .await?;

        if let Some(ref cookies_file) = self.config.cookies_file {
            if cookies_file.exists() {
                self.load_cookies(page, cookies_file).await?;
            }
        }

        info!("Navigating to {}", url);
        let nav_params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|e| anyhow::anyhow!("Invalid URL: {}", e))?;
        page.execute(nav_params).await?;

        let ready_timeout = Duration::from_secs(self.config.timeout);
        match tokio::time::timeout(
            ready_timeout,
            page.evaluate(WAIT_FOR_READY_SCRIPT.to_string()),
        )
        .await
        {
            Ok(Ok(result)) => {
                let state: String = result
                    .into_value()
                    .unwrap_or_else(|_| "unknown".to_string());
                debug!("Page ready state: {}", state);
            }
            Ok(Err(e)) => debug!("Could not check ready state: {}", e),
            Err(_) => warn!("Timeout waiting for page ready state"),
        }

        if self.config.engine == BrowserEngineType::Stealth {
            for script in STEALTH_SCRIPTS {
                if let Err(e) = page.evaluate(script.to_string()).await {
                    debug!("Stealth script injection skipped: {}", e);
                }
            }
        }

        if options.scan_full_page {
            let script = SCROLL_SCRIPT.replace(
                "{delay}",
                &options.scroll_delay.as_millis().to_string(),
            );
            if let Err(e) = page.evaluate(script).await {
                debug!("Full-page scroll failed: {}", e);
            }
        }

        if options.remove_overlays {
            match page.evaluate(REMOVE_OVERLAYS_SCRIPT.to_string()).await {
                Ok(result) => {
                    let removed: u64 = result.into_value().unwrap_or(0);
                    debug!("Removed {} overlay elements", removed);
                }
                Err(e) => debug!("Overlay removal failed: {}", e),
            }
        }

        if let Some(ref selector) = self.config.wait_for_selector {
            debug!("Waiting for selector: {}", selector);
            match tokio::time::timeout(ready_timeout, page.find_element(selector.as_str())).await {
                Ok(Ok(_)) => debug!("Selector found"),
                Ok(Err(e)) => warn!("Selector not found: {}", e),
                Err(_) => warn!("Timeout waiting for selector"),
            }
        }

        let final_url = page
            .url()
            .await?
            .map(|u| u.to_string())
            .unwrap_or_else(|| url.to_string());
        let html = page.content().await?;

        let screenshot = if options.screenshot {
            match page
                .screenshot(ScreenshotParams::builder().full_page(true).build())
                .await
            {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!("Screenshot failed for {}: {}", url, e);
                    None
                }
            }
        } else {
            None
        };

        let pdf = if options.pdf {
            match page.pdf(PrintToPdfParams::default()).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!("PDF capture failed for {}: {}", url, e);
                    None
                }
            }
        } else {
            None
        };

        Ok(FetchedPage {
            url: url.to_string(),
            final_url,
            // CDP doesn't give us status codes easily
            status: 200,
            html,
            screenshot,
            pdf,
        })
    }

    /// Load cookies from a JSON array of `{name, value, domain}` objects.
    async fn load_cookies(&self, page: &Page, path: &Path) -> Result<()> {
        debug!("Loading cookies from {:?}", path);

        let content = tokio::fs::read_to_string(path).await?;
        let cookies: Vec<serde_json::Value> = serde_json::from_str(&content)?;

        for cookie in cookies {
            let field = |key: &str| {
                cookie
                    .get(key)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string()
            };
            let (name, value, domain) = (field("name"), field("value"), field("domain"));
            if name.is_empty() || domain.is_empty() {
                continue;
            }

            match CookieParam::builder()
                .name(name.clone())
                .value(value)
                .domain(domain)
                .build()
            {
                Ok(param) => {
                    if let Err(e) = page.set_cookie(param).await {
                        warn!("Failed to set cookie {}: {}", name, e);
                    }
                }
                Err(e) => warn!("Failed to build cookie {}: {}", name, e),
            }
        }

        Ok(())
    }
}
