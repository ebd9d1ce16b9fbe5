//! Browser driver abstraction
//!
//! The crawl engine talks to the browser only through `BrowserDriver` and
//! `PageDriver`. `ChromiumBrowser` drives a real Chrome over CDP; tests plug in
//! scripted fakes.

pub mod chromium;
pub mod cleanup;

use anyhow::Result;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

pub use chromium::{ChromiumBrowser, ChromiumOptions, ChromiumPage, find_browser_executable};
pub use cleanup::CleanupResult;

/// One element returned by a selector query
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DomNode {
    pub node_id: i64,
    pub attributes: BTreeMap<String, String>,
}

impl DomNode {
    #[must_use]
    pub fn new(node_id: i64) -> Self {
        Self {
            node_id,
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Attribute value, empty when absent
    #[must_use]
    pub fn attr(&self, key: &str) -> &str {
        self.attributes.get(key).map_or("", String::as_str)
    }

    /// Build from CDP's flat `[name, value, name, value, ...]` list
    #[must_use]
    pub fn from_flat_attributes(node_id: i64, flat: &[String]) -> Self {
        let attributes = flat
            .chunks_exact(2)
            .map(|pair| (pair[0].to_ascii_lowercase(), pair[1].clone()))
            .collect();
        Self {
            node_id,
            attributes,
        }
    }
}

/// A browser capable of opening isolated pages
pub trait BrowserDriver: Send + Sync + 'static {
    type Page: PageDriver;

    fn new_page(&self) -> impl Future<Output = Result<Self::Page>> + Send;

    /// Release the browser. Must be safe to call more than once.
    fn close(&self) -> impl Future<Output = Result<()>> + Send;
}

/// DOM and script primitives on one open page.
///
/// `query_nodes` returns an empty list rather than an error when nothing
/// matches within `timeout`, and never runs past it. Mutation primitives are
/// best-effort; callers decide whether a failure matters.
pub trait PageDriver: Send + Sync + 'static {
    fn set_extra_headers(
        &self,
        headers: &BTreeMap<String, String>,
    ) -> impl Future<Output = Result<()>> + Send;

    fn navigate(&self, url: &str) -> impl Future<Output = Result<()>> + Send;

    /// `true` once the document has left the `loading` state
    fn wait_ready(&self, timeout: Duration) -> impl Future<Output = bool> + Send;

    fn query_nodes(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<DomNode>>> + Send;

    fn evaluate(&self, script: &str) -> impl Future<Output = Result<serde_json::Value>> + Send;

    /// Serialized HTML of the current document
    fn content(&self) -> impl Future<Output = Result<String>> + Send;

    fn send_keys(&self, node: &DomNode, text: &str) -> impl Future<Output = Result<()>> + Send;

    fn set_attribute(
        &self,
        node: &DomNode,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    fn remove_attribute(&self, node: &DomNode, key: &str)
    -> impl Future<Output = Result<()>> + Send;

    /// Assign a JavaScript property on the element, e.g. `value` or `selected`
    fn set_property(
        &self,
        node: &DomNode,
        key: &str,
        value: serde_json::Value,
    ) -> impl Future<Output = Result<()>> + Send;

    fn set_input_files(
        &self,
        node: &DomNode,
        file: &Path,
    ) -> impl Future<Output = Result<()>> + Send;

    fn close(self) -> impl Future<Output = Result<()>> + Send;
}
