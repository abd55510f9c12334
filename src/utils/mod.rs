//! Shared utility functions.
//!
//! - `url`: host extraction, page slugs and href resolution

mod url;

pub use self::url::{artifact_slug, domain_of, is_http_url, page_slug, resolve_href};
