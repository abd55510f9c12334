//! Selector validation against a parsed sample page.

use scraper::{Html, Selector};
use tracing::debug;

use super::SelectorSchema;

/// Number of elements `selector` matches in `document`; 0 when the
/// selector does not parse.
pub fn match_count(document: &Html, selector: &str) -> usize {
    match Selector::parse(selector) {
        Ok(parsed) => document.select(&parsed).count(),
        Err(_) => 0,
    }
}

/// Return the longest suffix of `selector` (dropping whole leading scope
/// tokens) that matches at least one element, or an empty string.
///
/// Surrounding whitespace is trimmed first, so a full match comes back
/// trimmed rather than byte-for-byte unchanged. Unparseable selectors count as "no match" at that trim level.
pub fn validate_selector(document: &Html, selector: &str) -> String {
    let mut current = selector.trim();
    while !current.is_empty() {
        if match_count(document, current) > 0 {
            return current.to_string();
        }
        match current.split_once(' ') {
            Some((_, rest)) => current = rest.trim_start(),
            None => break,
        }
    }
    String::new()
}

/// Validate every non-empty selector of a set in place.
pub fn validate_selectors<S: SelectorSchema>(document: &Html, selectors: &mut S) {
    for field in S::FIELDS {
        let Some(slot) = selectors.selector_mut(field) else {
            continue;
        };
        if slot.is_empty() {
            continue;
        }
        let validated = validate_selector(document, slot);
        if validated != *slot {
            debug!("Selector for {} trimmed: {:?} -> {:?}", field, slot, validated);
        }
        *slot = validated;
    }
}
