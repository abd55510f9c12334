//! URL helpers shared by collection, replay and crawl.

use url::Url;

/// Hostname of `url`, or `None` when it is not an absolute URL with a host.
pub fn domain_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}

/// True for absolute http:// or https:// URLs with a host.
pub fn is_http_url(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// File stem for a collected page: the URL path with `/` turned into `_`,
/// or `root` for the site root.
pub fn page_slug(url: &str) -> String {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_default();
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "root".to_string()
    } else {
        trimmed.replace('/', "_")
    }
}

/// File stem for crawl artifacts: the whole URL flattened so that query
/// variants of the same path do not collide.
pub fn artifact_slug(url: &str) -> String {
    url.replace("://", "_")
        .replace(['/', '?', '&', '='], "_")
}

/// Resolve an href against a page URL. Returns `None` for hrefs that do not
/// produce an http(s) URL (mailto:, javascript:, malformed input).
pub fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let mut resolved = base.join(href).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    resolved.set_fragment(None);
    Some(resolved)
}
