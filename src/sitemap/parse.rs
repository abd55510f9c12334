//! Sitemap XML parsing.

use quick_xml::events::Event;
use quick_xml::Reader;

/// A parsed sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<urlset>`: page URLs.
    UrlSet(Vec<String>),
    /// `<sitemapindex>`: child sitemap URLs.
    Index(Vec<String>),
    /// Well-formed XML with some other root element.
    Unknown,
}

/// Parse a sitemap or sitemap index.
///
/// Only `<loc>` elements directly inside `<url>` or `<sitemap>` count, so
/// extension tags such as `<image:loc>` are skipped.
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut root: Option<Vec<u8>> = None;
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut in_loc = false;
    let mut current = String::new();
    let mut locs = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if root.is_none() {
                    root = Some(name.clone());
                }
                let parent = stack.last().map(Vec::as_slice);
                let under_entry = matches!(parent, Some(b"url") | Some(b"sitemap"));
                if name == b"loc" && under_entry && e.name().prefix().is_none() {
                    in_loc = true;
                    current.clear();
                }
                stack.push(name);
            }
            Event::Text(t) if in_loc => current.push_str(&t.unescape()?),
            Event::CData(c) if in_loc => {
                current.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Event::End(_) => {
                if let Some(name) = stack.pop() {
                    if in_loc && name == b"loc" {
                        in_loc = false;
                        let loc = current.trim();
                        if !loc.is_empty() {
                            locs.push(loc.to_string());
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(match root.as_deref() {
        Some(b"urlset") => SitemapDocument::UrlSet(locs),
        Some(b"sitemapindex") => SitemapDocument::Index(locs),
        _ => SitemapDocument::Unknown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urlset() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
                    xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">
              <url><loc> https://shop.com/p/1 </loc><lastmod>2024-01-01</lastmod></url>
              <url>
                <loc>https://shop.com/p/2?a=1&amp;b=2</loc>
                <image:image><image:loc>https://cdn.shop.com/1.jpg</image:loc></image:image>
              </url>
            </urlset>"#;
        assert_eq!(
            parse_sitemap(xml).unwrap(),
            SitemapDocument::UrlSet(vec![
                "https://shop.com/p/1".to_string(),
                "https://shop.com/p/2?a=1&b=2".to_string(),
            ])
        );
    }

    #[test]
    fn test_index() {
        let xml = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <sitemap><loc>https://shop.com/sitemap-1.xml</loc></sitemap>
              <sitemap><loc><![CDATA[https://shop.com/sitemap-2.xml]]></loc></sitemap>
            </sitemapindex>"#;
        assert_eq!(
            parse_sitemap(xml).unwrap(),
            SitemapDocument::Index(vec![
                "https://shop.com/sitemap-1.xml".to_string(),
                "https://shop.com/sitemap-2.xml".to_string(),
            ])
        );
    }

    #[test]
    fn test_other_root_is_unknown() {
        assert_eq!(
            parse_sitemap("<rss><channel><loc>x</loc></channel></rss>").unwrap(),
            SitemapDocument::Unknown
        );
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        assert!(parse_sitemap("<urlset><url><loc>x</url></urlset>").is_err());
    }
}
