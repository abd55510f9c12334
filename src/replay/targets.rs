//! Product URLs reachable from a listing page.

use std::collections::HashSet;

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::selectors::ListingSelectors;
use crate::utils::resolve_href;

/// Resolve the product link of every card on a listing page.
///
/// Links are looked up inside each card, resolved against `<base href>` when
/// the page declares one and against `page_url` otherwise, and deduplicated
/// in first-seen order. Returns nothing when the card or link selector is
/// empty or does not parse.
pub fn listing_targets(html: &str, page_url: &str, selectors: &ListingSelectors) -> Vec<String> {
    if !selectors.can_locate_products() {
        return Vec::new();
    }
    let (Ok(card), Ok(link)) = (
        Selector::parse(&selectors.product_card),
        Selector::parse(&selectors.product_link),
    ) else {
        debug!("Listing selectors do not parse; no targets");
        return Vec::new();
    };
    let Ok(page_url) = Url::parse(page_url) else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let base = base_url(&document, &page_url);

    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    for card in document.select(&card) {
        let Some(href) = card
            .select(&link)
            .find_map(|anchor| anchor.value().attr("href"))
        else {
            continue;
        };
        if let Some(resolved) = resolve_href(&base, href) {
            let resolved = resolved.to_string();
            if seen.insert(resolved.clone()) {
                targets.push(resolved);
            }
        }
    }
    debug!("Found {} product links", targets.len());
    targets
}

fn base_url(document: &Html, page_url: &Url) -> Url {
    let Ok(selector) = Selector::parse("base[href]") else {
        return page_url.clone();
    };
    document
        .select(&selector)
        .next()
        .and_then(|base| base.value().attr("href"))
        .and_then(|href| page_url.join(href).ok())
        .unwrap_or_else(|| page_url.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selectors() -> ListingSelectors {
        ListingSelectors {
            product_card: ".card".to_string(),
            product_link: "a.title".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_duplicate_links_collapse_in_order() {
        let html = r#"<html><body>
            <div class="card"><a class="title" href="/p/1">One</a></div>
            <div class="card"><a class="title" href="/p/2">Two</a></div>
            <div class="card"><a class="title" href="/p/1#reviews">One again</a></div>
        </body></html>"#;
        let targets = listing_targets(html, "https://shop.com/list?page=1", &selectors());
        assert_eq!(
            targets,
            vec!["https://shop.com/p/1", "https://shop.com/p/2"]
        );
    }

    #[test]
    fn test_links_are_scoped_to_cards() {
        let html = r#"<html><body>
            <a class="title" href="/outside">Not a card</a>
            <div class="card"><span>no link</span></div>
            <div class="card"><a class="title" href="p/3">Three</a></div>
        </body></html>"#;
        let targets = listing_targets(html, "https://shop.com/c/shoes/", &selectors());
        assert_eq!(targets, vec!["https://shop.com/c/shoes/p/3"]);
    }

    #[test]
    fn test_base_href_wins_over_page_url() {
        let html = r#"<html><head><base href="https://cdn.shop.com/store/"></head><body>
            <div class="card"><a class="title" href="item-9">Nine</a></div>
        </body></html>"#;
        let targets = listing_targets(html, "https://shop.com/list", &selectors());
        assert_eq!(targets, vec!["https://cdn.shop.com/store/item-9"]);
    }

    #[test]
    fn test_missing_selectors_yield_nothing() {
        let html = r#"<div class="card"><a class="title" href="/p/1">One</a></div>"#;
        let mut incomplete = selectors();
        incomplete.product_link.clear();
        assert!(listing_targets(html, "https://shop.com/", &incomplete).is_empty());
    }
}
