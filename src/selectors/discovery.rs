//! LLM-assisted selector discovery from a single sample page.

use std::path::PathBuf;

use scraper::Html;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use super::{validate_selectors, SelectorSchema, SelectorStore, StoreError};
use crate::llm::{CompletionBackend, CompletionRequest, LlmError};
use crate::utils::domain_of;

/// Minimum number of elements a listing `product_card` selector must match.
pub const MIN_LISTING_CARDS: usize = 2;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("no HTML to discover selectors from for {0}")]
    EmptyHtml(String),

    #[error("cannot derive a domain from {0}")]
    InvalidUrl(String),

    #[error("LLM call failed for {url}: {source}")]
    Llm {
        url: String,
        #[source]
        source: LlmError,
    },

    #[error("LLM returned no selectors for {0}")]
    EmptyExtraction(String),

    #[error("LLM response for {0} is not a JSON object")]
    NotAnObject(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A persisted selector set.
#[derive(Debug, Clone)]
pub struct Discovered<S> {
    pub domain: String,
    pub selectors: S,
    pub path: PathBuf,
}

/// Sends sample pages to the LLM and persists the validated selector sets.
pub struct SelectorDiscovery<'a> {
    llm: &'a dyn CompletionBackend,
    store: &'a SelectorStore,
}

impl<'a> SelectorDiscovery<'a> {
    pub fn new(llm: &'a dyn CompletionBackend, store: &'a SelectorStore) -> Self {
        Self { llm, store }
    }

    pub fn store(&self) -> &'a SelectorStore {
        self.store
    }

    /// Discover, repair, validate and persist a selector set for the page
    /// kind `S` describes. Nothing is written unless every step succeeds.
    pub async fn discover<S: SelectorSchema>(
        &self,
        html: &str,
        source_url: &str,
    ) -> Result<Discovered<S>, DiscoveryError> {
        let domain = domain_of(source_url)
            .ok_or_else(|| DiscoveryError::InvalidUrl(source_url.to_string()))?;
        self.discover_for_domain(html, source_url, &domain).await
    }

    /// Like [`discover`](Self::discover), but files the result under
    /// `domain` instead of the sample page's own host.
    pub async fn discover_for_domain<S: SelectorSchema>(
        &self,
        html: &str,
        source_url: &str,
        domain: &str,
    ) -> Result<Discovered<S>, DiscoveryError> {
        if html.trim().is_empty() {
            return Err(DiscoveryError::EmptyHtml(source_url.to_string()));
        }

        info!("Discovering {} selectors for {}", S::KIND, source_url);
        let schema = S::template();
        let response = self
            .llm
            .complete_json(CompletionRequest {
                instruction: S::instruction(),
                schema: &schema,
                content: html,
            })
            .await
            .map_err(|source| DiscoveryError::Llm {
                url: source_url.to_string(),
                source,
            })?;

        let object = first_object(response, source_url)?;
        let mut selectors = S::repair(&object);
        {
            let document = Html::parse_document(html);
            validate_selectors(&document, &mut selectors);
            selectors.verify(&document);
        }
        debug!("Validated {} selectors: {:?}", S::KIND, selectors.entries());

        let path = self.store.save(domain, &selectors)?;
        Ok(Discovered {
            domain: domain.to_string(),
            selectors,
            path,
        })
    }
}

/// Take the response object, or the first element of a response list.
fn first_object(response: Value, source_url: &str) -> Result<Value, DiscoveryError> {
    let candidate = match response {
        Value::Array(items) => items
            .into_iter()
            .next()
            .ok_or_else(|| DiscoveryError::EmptyExtraction(source_url.to_string()))?,
        other => other,
    };
    if candidate.is_object() {
        Ok(candidate)
    } else {
        Err(DiscoveryError::NotAnObject(source_url.to_string()))
    }
}
