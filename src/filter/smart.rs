//! Structural-similarity filtering layered over `SimpleFilter`.

use dashmap::DashSet;
use log::trace;

use super::shape::shape_key;
use super::{RequestFilter, SimpleFilter};
use crate::request::Request;
use crate::utils::SCRIPT_SUFFIXES;

/// Decorator that keeps only the first URL of every path shape.
///
/// Smart mode ignores the query string entirely; strict mode treats two URLs
/// as duplicates only when their query parameter names also match.
pub struct SmartFilter {
    inner: SimpleFilter,
    strict: bool,
    shapes: DashSet<String>,
}

impl SmartFilter {
    /// Wrap `inner`; its static denylist is extended with script/style/data suffixes
    #[must_use]
    pub fn new(mut inner: SimpleFilter, strict: bool) -> Self {
        inner.extend_static_suffixes(SCRIPT_SUFFIXES);
        Self {
            inner,
            strict,
            shapes: DashSet::new(),
        }
    }
}

impl RequestFilter for SmartFilter {
    fn do_filter(&self, req: &Request) -> bool {
        if self.inner.do_filter(req) {
            return true;
        }
        let key = shape_key(&req.url, self.strict);
        if !self.shapes.insert(key) {
            trace!(target: "crawlscope::filter", "Similar shape already kept: {}", req.url);
            return true;
        }
        false
    }
}
