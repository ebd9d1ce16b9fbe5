//! Structural shape of a URL path.
//!
//! A shape is the segment count plus, per segment, either the literal text or a
//! `Variable` marker for segments that look like identifiers.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use url::Url;

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("static UUID regex is valid")
});

static HEX_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{16,}$").expect("static hex regex is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SegmentShape {
    Literal(String),
    Variable,
}

/// Whether a path segment looks like an identifier rather than a name.
///
/// Digits (optionally followed by an extension), UUIDs and long hex digests
/// count as variable.
#[must_use]
pub fn is_variable_segment(segment: &str) -> bool {
    let stem = segment.split_once('.').map_or(segment, |(stem, _)| stem);
    if stem.is_empty() {
        return false;
    }
    stem.bytes().all(|b| b.is_ascii_digit())
        || UUID_RE.is_match(stem)
        || (HEX_ID_RE.is_match(stem) && stem.bytes().any(|b| b.is_ascii_digit()))
}

/// Per-segment shape of the URL path; a bare `/` has no segments
#[must_use]
pub fn path_shape(url: &Url) -> Vec<SegmentShape> {
    url.path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(|s| {
                    if is_variable_segment(s) {
                        SegmentShape::Variable
                    } else {
                        SegmentShape::Literal(s.to_string())
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Key identifying every URL with the same origin and path shape.
///
/// With `with_query_keys`, the sorted set of query parameter names is part of
/// the key as well.
#[must_use]
pub fn shape_key(url: &Url, with_query_keys: bool) -> String {
    let mut key = format!(
        "{}://{}",
        url.scheme(),
        url.host_str().unwrap_or_default()
    );
    if let Some(port) = url.port() {
        key.push_str(&format!(":{port}"));
    }
    for segment in path_shape(url) {
        key.push('/');
        match segment {
            SegmentShape::Literal(text) => key.push_str(&text),
            SegmentShape::Variable => key.push_str("{var}"),
        }
    }
    if with_query_keys {
        let names: BTreeSet<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        key.push('?');
        key.push_str(&names.into_iter().collect::<Vec<_>>().join("&"));
    }
    key
}
