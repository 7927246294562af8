//! Utility functions and helpers.

pub mod http;
pub mod log;

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static ENTRY_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/mangas/(\d+)(?:/|$)").expect("entry id pattern is valid"));

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Extract the numeric entry id from a listing path like `/mangas/5/one-piece`.
pub fn extract_entry_id(path: &str) -> Option<u32> {
    ENTRY_ID
        .captures(path)
        .and_then(|caps| caps.get(1))
        .and_then(|id| id.as_str().parse().ok())
}

/// File-system friendly name for a title: spaces become `_`, separators are dropped.
pub fn file_stem(title: &str) -> String {
    title
        .trim()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            '/' | '\\' | ':' | '\0' => None,
            c => Some(c),
        })
        .collect()
}
