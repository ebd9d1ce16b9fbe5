//! Scope, uniqueness and static-resource filtering.

use dashmap::DashSet;
use log::trace;
use std::collections::HashSet;

use super::RequestFilter;
use crate::request::Request;
use crate::utils::STATIC_SUFFIXES;

/// Base filter: domain scope, then uniqueness, then static extensions.
///
/// The seen-set is a `DashSet`, so concurrent page sessions can share one
/// instance without external locking.
pub struct SimpleFilter {
    unique_set: DashSet<String>,
    host_limit: String,
    static_suffixes: HashSet<String>,
}

impl SimpleFilter {
    /// Filter scoped to `host_limit`; an empty host disables the scope check
    #[must_use]
    pub fn new(host_limit: impl Into<String>) -> Self {
        Self {
            unique_set: DashSet::new(),
            host_limit: host_limit.into(),
            static_suffixes: STATIC_SUFFIXES.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Filter with no scope, used for plain identity de-duplication
    #[must_use]
    pub fn unscoped() -> Self {
        Self::new(String::new())
    }

    /// Add extensions to the static denylist
    pub fn extend_static_suffixes<I, S>(&mut self, suffixes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.static_suffixes
            .extend(suffixes.into_iter().map(|s| s.as_ref().to_ascii_lowercase()));
    }

    /// Drop when the identity key was seen before, otherwise record it
    pub fn unique_filter(&self, req: &Request) -> bool {
        !self.unique_set.insert(req.unique_id())
    }

    /// Drop when the URL's extension is on the denylist
    #[must_use]
    pub fn static_filter(&self, req: &Request) -> bool {
        req.file_ext()
            .is_some_and(|ext| self.static_suffixes.contains(&ext))
    }

    /// Drop unless the request targets the scope host.
    ///
    /// A scope written as `host:80` (or `host:443`) also admits the bare
    /// host when the request's scheme implies that port.
    #[must_use]
    pub fn domain_filter(&self, req: &Request) -> bool {
        let hostname = req.url.host_str().unwrap_or_default();
        if req.host_with_port() == self.host_limit || hostname == self.host_limit {
            return false;
        }
        if req.url.port().is_none() {
            let implied = match req.url.scheme() {
                "http" => Some(":80"),
                "https" => Some(":443"),
                _ => None,
            };
            if let Some(port) = implied
                && self.host_limit.ends_with(port)
                && format!("{hostname}{port}") == self.host_limit
            {
                return false;
            }
        }
        true
    }
}

impl RequestFilter for SimpleFilter {
    fn do_filter(&self, req: &Request) -> bool {
        if !self.host_limit.is_empty() && self.domain_filter(req) {
            trace!(target: "crawlscope::filter", "Out of scope: {}", req.url);
            return true;
        }
        if self.unique_filter(req) {
            trace!(target: "crawlscope::filter", "Duplicate: {}", req.url);
            return true;
        }
        if self.static_filter(req) {
            trace!(target: "crawlscope::filter", "Static resource: {}", req.url);
            return true;
        }
        false
    }
}
