//! CSS selector sets: schemas, validation, persistence, discovery and
//! the listing-to-product bootstrap.

mod bootstrap;
mod discovery;
mod schema;
mod store;
mod validate;

pub use bootstrap::{bootstrap_product_selectors, BootstrapError, BootstrapOutcome};
pub use discovery::{Discovered, DiscoveryError, SelectorDiscovery, MIN_LISTING_CARDS};
pub use schema::{ListingSelectors, ProductSelectors, SelectorSchema};
pub use store::{SelectorStore, StoreError};
pub use validate::{match_count, validate_selector, validate_selectors};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Page template a selector set was discovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    /// Single product detail page.
    Product,
    /// Category, collection or search-results page.
    Listing,
}

impl PageKind {
    /// File name of the persisted selector set.
    pub fn file_name(self) -> &'static str {
        match self {
            PageKind::Product => "product_selector.json",
            PageKind::Listing => "listing_selector.json",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PageKind::Product => "product",
            PageKind::Listing => "listing",
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
