//! URL shaping
//!
//! Reduces a merged URL list to a short, representative one: rejects asset
//! and template URLs, generalizes deep listing paths, keeps the first URL of
//! every similarity cluster, caps the list by URL length and finally makes
//! sure every kept host's origin is present. Clustering is greedy, so input
//! order decides which URL represents a cluster.

pub mod similarity;

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

use crate::utils::constants::SHAPED_URL_LIMIT;
use crate::utils::url_utils::{origin_of, unique_urls};

pub use similarity::{is_path_similar, path_segments};

static DENYLIST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i:\.(css|jpg|jpeg|png|ico|gif|webp|mp3|mp4|ttf|tif|tiff|woff|woff2|vue)$)|YYYY|MM|DD|HH",
    )
    .expect("static shaping denylist regex is valid")
});

const DISALLOWED_PATH_CHARS: &[char] = &['\'', '"', '+'];
const DISALLOWED_ENCODED: &[&str] = &["%22", "%27", "%2b", "%2B"];

/// Tunables of the shaping pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapingOptions {
    /// Maximum number of URLs kept before origin completion
    pub limit: usize,
    /// Deep paths without query or extension are cut to this many segments
    pub max_depth: usize,
}

impl Default for ShapingOptions {
    fn default() -> Self {
        Self {
            limit: SHAPED_URL_LIMIT,
            max_depth: 3,
        }
    }
}

/// Shape `urls` with default options
#[must_use]
pub fn shape_urls<I, S>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    shape_urls_with(urls, ShapingOptions::default())
}

#[must_use]
pub fn shape_urls_with<I, S>(urls: I, options: ShapingOptions) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let candidates = unique_urls(
        urls.into_iter()
            .filter_map(|u| rewrite_url(u.as_ref(), options.max_depth)),
    );

    let mut kept: Vec<(String, Vec<String>)> = Vec::new();
    for candidate in candidates {
        let segments = path_segments(&candidate);
        if kept
            .iter()
            .any(|(_, existing)| is_path_similar(&segments, existing))
        {
            continue;
        }
        kept.push((candidate, segments));
    }
    let mut list: Vec<String> = kept.into_iter().map(|(url, _)| url).collect();

    if list.len() > options.limit {
        list.sort_by_key(String::len);
        list.truncate(options.limit);
    }

    complete_origins(list)
}

/// Reject pass for one URL: `None` drops it, otherwise the generalized form.
///
/// Unparseable input is passed through unchanged.
#[must_use]
pub fn rewrite_url(raw: &str, max_depth: usize) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let Ok(url) = Url::parse(raw) else {
        return Some(raw.to_string());
    };

    let path = url.path();
    if path.contains(DISALLOWED_PATH_CHARS)
        || DISALLOWED_ENCODED.iter().any(|enc| path.contains(enc))
        || DENYLIST_RE.is_match(path)
    {
        return None;
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let generalize = url.query().is_none()
        && segments.len() > max_depth
        && segments.last().is_some_and(|last| !last.contains('.'));
    let path = if generalize {
        format!("/{}/", segments[..max_depth].join("/"))
    } else {
        path.to_string()
    };

    let origin = origin_of(&url).unwrap_or_else(|| format!("{}:", url.scheme()));
    let mut shaped = format!("{origin}{}", path.trim_end_matches('/'));
    if let Some(query) = url.query() {
        shaped.push('?');
        shaped.push_str(query);
    }
    Some(shaped)
}

fn complete_origins(mut list: Vec<String>) -> Vec<String> {
    let mut present: HashSet<String> = list.iter().cloned().collect();
    let origins: Vec<String> = list
        .iter()
        .filter_map(|u| Url::parse(u).ok())
        .filter_map(|u| origin_of(&u))
        .collect();
    for origin in origins {
        if present.insert(origin.clone()) {
            list.push(origin);
        }
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_paths_are_truncated() {
        assert_eq!(
            rewrite_url("http://h/a/b/c/d/e", 3).as_deref(),
            Some("http://h/a/b/c")
        );
        assert_eq!(
            rewrite_url("http://h/a/b/c/d/e.php", 3).as_deref(),
            Some("http://h/a/b/c/d/e.php")
        );
        assert_eq!(
            rewrite_url("http://h/a/b/c/d?x=1", 3).as_deref(),
            Some("http://h/a/b/c/d?x=1")
        );
    }

    #[test]
    fn rejects_assets_and_templates() {
        assert_eq!(rewrite_url("http://h/static/app.CSS", 3), None);
        assert_eq!(rewrite_url("http://h/archive/YYYY/MM", 3), None);
        assert_eq!(rewrite_url("http://h/a+b", 3), None);
        assert_eq!(rewrite_url("http://h/it's", 3), None);
        assert_eq!(rewrite_url("http://h/", 3).as_deref(), Some("http://h"));
    }

    #[test]
    fn origin_is_completed() {
        assert_eq!(
            shape_urls(["http://h/a/b"]),
            vec!["http://h/a/b", "http://h"]
        );
    }
}
