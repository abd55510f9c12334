//! Typed selector sets and the projection from raw LLM output into them.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use scraper::Html;
use tracing::warn;

use super::{match_count, PageKind, MIN_LISTING_CARDS};
use crate::llm::{LISTING_SELECTOR_PROMPT, PRODUCT_SELECTOR_PROMPT};

/// A fixed set of named CSS selectors.
///
/// Every field named in `FIELDS` is always present as a string. Values that
/// come from outside (LLM responses, files on disk) enter only through
/// [`SelectorSchema::repair`], which coerces missing or non-string fields to
/// the empty string and drops unknown keys.
pub trait SelectorSchema: Default + Clone + Serialize + DeserializeOwned + Send + Sync {
    /// Page kind this schema describes.
    const KIND: PageKind;

    /// Field names in output order.
    const FIELDS: &'static [&'static str];

    /// Extraction rules sent to the LLM.
    fn instruction() -> &'static str;

    fn selector(&self, field: &str) -> Option<&str>;

    fn selector_mut(&mut self, field: &str) -> Option<&mut String>;

    /// Project an untyped JSON value onto this schema.
    fn repair(value: &Value) -> Self {
        let mut repaired = Self::default();
        if let Some(object) = value.as_object() {
            fill_fields(&mut repaired, object);
        }
        repaired
    }

    /// Empty template describing the expected response shape.
    fn template() -> Value {
        Value::Object(
            Self::FIELDS
                .iter()
                .map(|field| (field.to_string(), Value::String(String::new())))
                .collect(),
        )
    }

    /// Page-level checks run after every selector has been validated.
    fn verify(&mut self, _document: &Html) {}

    /// (field, selector) pairs in schema order.
    fn entries(&self) -> Vec<(&'static str, &str)> {
        Self::FIELDS
            .iter()
            .map(|field| (*field, self.selector(field).unwrap_or_default()))
            .collect()
    }
}

fn fill_fields<S: SelectorSchema>(target: &mut S, object: &Map<String, Value>) {
    for field in S::FIELDS {
        if let (Some(Value::String(selector)), Some(slot)) =
            (object.get(*field), target.selector_mut(field))
        {
            *slot = selector.trim().to_string();
        }
    }
}

/// Selectors for a product detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductSelectors {
    pub name: String,
    pub price: String,
    pub description: String,
    pub category: String,
    pub brand: String,
    pub availability: String,
    pub ratings: String,
    pub reviews: String,
    pub size: String,
    pub size_container: String,
}

impl SelectorSchema for ProductSelectors {
    const KIND: PageKind = PageKind::Product;
    const FIELDS: &'static [&'static str] = &[
        "name",
        "price",
        "description",
        "category",
        "brand",
        "availability",
        "ratings",
        "reviews",
        "size",
        "size_container",
    ];

    fn instruction() -> &'static str {
        PRODUCT_SELECTOR_PROMPT
    }

    fn selector(&self, field: &str) -> Option<&str> {
        let value = match field {
            "name" => &self.name,
            "price" => &self.price,
            "description" => &self.description,
            "category" => &self.category,
            "brand" => &self.brand,
            "availability" => &self.availability,
            "ratings" => &self.ratings,
            "reviews" => &self.reviews,
            "size" => &self.size,
            "size_container" => &self.size_container,
            _ => return None,
        };
        Some(value.as_str())
    }

    fn selector_mut(&mut self, field: &str) -> Option<&mut String> {
        match field {
            "name" => Some(&mut self.name),
            "price" => Some(&mut self.price),
            "description" => Some(&mut self.description),
            "category" => Some(&mut self.category),
            "brand" => Some(&mut self.brand),
            "availability" => Some(&mut self.availability),
            "ratings" => Some(&mut self.ratings),
            "reviews" => Some(&mut self.reviews),
            "size" => Some(&mut self.size),
            "size_container" => Some(&mut self.size_container),
            _ => None,
        }
    }
}

/// Selectors for a listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingSelectors {
    /// One product tile; expected to match many elements.
    pub product_card: String,
    /// Anchor to the product page, scoped to a card.
    pub product_link: String,
    /// Next-page link or button.
    pub pagination: String,
    /// Set when the page did not look like a listing.
    pub error: bool,
}

impl ListingSelectors {
    /// Whether the card and link selectors needed to locate products are set.
    pub fn can_locate_products(&self) -> bool {
        !self.product_card.is_empty() && !self.product_link.is_empty()
    }
}

impl SelectorSchema for ListingSelectors {
    const KIND: PageKind = PageKind::Listing;
    const FIELDS: &'static [&'static str] = &["product_card", "product_link", "pagination"];

    fn instruction() -> &'static str {
        LISTING_SELECTOR_PROMPT
    }

    fn selector(&self, field: &str) -> Option<&str> {
        match field {
            "product_card" => Some(self.product_card.as_str()),
            "product_link" => Some(self.product_link.as_str()),
            "pagination" => Some(self.pagination.as_str()),
            _ => None,
        }
    }

    fn selector_mut(&mut self, field: &str) -> Option<&mut String> {
        match field {
            "product_card" => Some(&mut self.product_card),
            "product_link" => Some(&mut self.product_link),
            "pagination" => Some(&mut self.pagination),
            _ => None,
        }
    }

    fn repair(value: &Value) -> Self {
        let mut repaired = Self::default();
        if let Some(object) = value.as_object() {
            fill_fields(&mut repaired, object);
            repaired.error = object
                .get("error")
                .and_then(Value::as_bool)
                .unwrap_or(false);
        }
        repaired
    }

    /// A listing card must repeat; a selector matching a single element is
    /// most likely the page wrapper or a hero banner.
    fn verify(&mut self, document: &Html) {
        if !self.product_card.is_empty() {
            let cards = match_count(document, &self.product_card);
            if cards < MIN_LISTING_CARDS {
                warn!(
                    "product_card {:?} matches {} element(s); discarding it",
                    self.product_card, cards
                );
                self.product_card.clear();
            }
        }
        if self.product_card.is_empty() {
            self.error = true;
        }
    }

    fn template() -> Value {
        serde_json::json!({
            "product_card": "",
            "product_link": "",
            "pagination": "",
            "error": false
        })
    }
}
