//! Chain listing discovery into product discovery for a new domain.

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use super::{
    Discovered, DiscoveryError, ListingSelectors, PageKind, ProductSelectors, SelectorDiscovery,
};
use crate::replay::listing_targets;
use crate::scrapers::{FetchError, HtmlCollector};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(
        "cannot bootstrap product selectors for {0}: listing selectors lack product_card or \
         product_link; run `selectorkit discover product <url>` once first"
    )]
    MissingListingSelectors(String),

    #[error("no product link found in the product cards of {0}")]
    NoProductLink(String),

    #[error("could not fetch product page {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

/// What the bootstrap step did.
#[derive(Debug, Clone)]
pub enum BootstrapOutcome {
    /// Product selectors already existed and were left untouched.
    AlreadyPresent(PathBuf),
    /// Product selectors were discovered from this product page.
    Discovered {
        product_url: String,
        discovered: Discovered<ProductSelectors>,
    },
}

/// Ensure product selectors exist under `domain`.
///
/// `domain` is the partition the listing selectors were filed under; it can
/// differ from the listing page's own host (sitemap samples). `listing_url`
/// is only used to resolve product links. Never overwrites an existing
/// product selector file.
pub async fn bootstrap_product_selectors(
    listing: &ListingSelectors,
    listing_html: &str,
    listing_url: &str,
    domain: &str,
    collector: &HtmlCollector<'_>,
    discovery: &SelectorDiscovery<'_>,
) -> Result<BootstrapOutcome, BootstrapError> {
    let store = discovery.store();
    if store.exists(domain, PageKind::Product) {
        info!("Product selectors already exist for {}; keeping them", domain);
        return Ok(BootstrapOutcome::AlreadyPresent(
            store.path(domain, PageKind::Product),
        ));
    }

    if !listing.can_locate_products() {
        return Err(BootstrapError::MissingListingSelectors(domain.to_string()));
    }

    let product_url = listing_targets(listing_html, listing_url, listing)
        .into_iter()
        .next()
        .ok_or_else(|| BootstrapError::NoProductLink(listing_url.to_string()))?;

    info!("Bootstrapping product selectors from {}", product_url);
    let page = collector
        .collect(&product_url)
        .await
        .map_err(|source| BootstrapError::Fetch {
            url: product_url.clone(),
            source,
        })?;

    let discovered = discovery
        .discover_for_domain::<ProductSelectors>(page.html(), &product_url, domain)
        .await?;

    Ok(BootstrapOutcome::Discovered {
        product_url,
        discovered,
    })
}
