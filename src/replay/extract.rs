//! Apply a selector set to one page.

use scraper::{Html, Selector};

use crate::dataset::ScrapedRow;
use crate::selectors::SelectorSchema;

/// Field added to every row naming the page it came from.
pub const URL_FIELD: &str = "url";

/// Extract one row: every schema field in order, then `url`.
///
/// A field is the text of the first element its selector matches, with
/// whitespace runs collapsed. Empty, unparseable or unmatched selectors give
/// an empty value.
pub fn extract_row<S: SelectorSchema>(html: &str, url: &str, selectors: &S) -> ScrapedRow {
    let document = Html::parse_document(html);
    let mut row = ScrapedRow::new();
    for (field, selector) in selectors.entries() {
        row.insert(field, first_text(&document, selector));
    }
    row.insert(URL_FIELD, url);
    row
}

fn first_text(document: &Html, selector: &str) -> String {
    if selector.is_empty() {
        return String::new();
    }
    let Ok(parsed) = Selector::parse(selector) else {
        return String::new();
    };
    document
        .select(&parsed)
        .next()
        .map(|element| {
            element
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::ProductSelectors;

    const PAGE: &str = r#"<html><body>
        <h1 class="title">
            Trail   Runner
            <small>2024</small>
        </h1>
        <span class="price">$99</span>
        <span class="price">$79</span>
    </body></html>"#;

    #[test]
    fn test_row_has_schema_fields_then_url() {
        let selectors = ProductSelectors {
            name: "h1.title".to_string(),
            price: ".price".to_string(),
            brand: ".brand".to_string(),
            description: "div[".to_string(),
            ..Default::default()
        };
        let row = extract_row(PAGE, "https://shop.com/p/1", &selectors);

        let mut expected: Vec<&str> = ProductSelectors::FIELDS.to_vec();
        expected.push(URL_FIELD);
        assert_eq!(row.keys().collect::<Vec<_>>(), expected);

        assert_eq!(row.get("name"), Some("Trail Runner 2024"));
        assert_eq!(row.get("price"), Some("$99"));
        assert_eq!(row.get("brand"), Some(""));
        assert_eq!(row.get("description"), Some(""));
        assert_eq!(row.get("category"), Some(""));
        assert_eq!(row.get(URL_FIELD), Some("https://shop.com/p/1"));
    }
}
