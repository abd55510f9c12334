//! Tag stripping for the "clean" HTML variant.

use scraper::{Html, Selector};

/// Elements removed from clean HTML.
pub const EXCLUDED_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "svg", "canvas", "link", "meta",
];

/// Remove every element in [`EXCLUDED_TAGS`] (and its subtree) from a document.
pub fn clean_html(raw: &str) -> String {
    let mut document = Html::parse_document(raw);
    let Ok(selector) = Selector::parse(&EXCLUDED_TAGS.join(", ")) else {
        return raw.to_string();
    };

    let ids: Vec<_> = document.select(&selector).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
    document.html()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_html_strips_excluded_tags() {
        let raw = r#"<html><head><meta charset="utf-8"><style>p{}</style>
            <link rel="stylesheet" href="a.css"></head>
            <body><h1 class="title">Shoe</h1><script>track()</script>
            <noscript>enable js</noscript><svg><path d="M0"/></svg>
            <p class="price">$10</p></body></html>"#;

        let cleaned = clean_html(raw);
        assert!(cleaned.contains(r#"<h1 class="title">Shoe</h1>"#));
        assert!(cleaned.contains("$10"));
        for gone in ["<script", "<style", "<meta", "<link", "<noscript", "<svg", "track()"] {
            assert!(!cleaned.contains(gone), "{} survived", gone);
        }
    }

    #[test]
    fn test_clean_html_keeps_plain_documents() {
        let cleaned = clean_html("<html><body><p>hi</p></body></html>");
        assert!(cleaned.contains("<p>hi</p>"));
    }
}
