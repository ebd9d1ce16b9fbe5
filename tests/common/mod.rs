//! Shared test helpers: a scripted in-memory browser and fast task configs

#![allow(dead_code)]

use anyhow::Result;
use crawlscope::page_session::js_scripts::{COLLECT_LINKS_SCRIPT, MARK_EVENT_TARGETS_SCRIPT};
use crawlscope::{BrowserDriver, DomNode, PageDriver, TaskConfig, TaskConfigBuilder};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

type LinkSource = dyn Fn(&str) -> Vec<String> + Send + Sync;

/// Everything the fake pages were asked to do
#[derive(Debug, Default, Clone)]
pub struct Recorded {
    pub navigations: Vec<String>,
    pub headers: Vec<BTreeMap<String, String>>,
    pub send_keys: Vec<(i64, String)>,
    pub set_attributes: Vec<(i64, String, String)>,
    pub set_properties: Vec<(i64, String, Value)>,
    pub removed_attributes: Vec<(i64, String)>,
    pub uploads: Vec<(i64, PathBuf)>,
}

pub struct FakeState {
    links: Box<LinkSource>,
    html: String,
    has_body: bool,
    nodes: BTreeMap<String, Vec<DomNode>>,
    pub pages_opened: AtomicUsize,
    pub pages_closed: AtomicUsize,
    pub browser_closes: AtomicUsize,
    pub live_pages: AtomicUsize,
    pub max_live_pages: AtomicUsize,
    pub opened_at: Mutex<Vec<Instant>>,
    pub query_delays: Mutex<BTreeMap<String, Duration>>,
    pub recorded: Mutex<Recorded>,
}

/// Browser whose pages serve links from a closure instead of the network
#[derive(Clone)]
pub struct FakeBrowser {
    pub state: Arc<FakeState>,
}

impl FakeBrowser {
    /// Pages discover `links(url)` through the DOM link script
    pub fn with_links<F>(links: F) -> Self
    where
        F: Fn(&str) -> Vec<String> + Send + Sync + 'static,
    {
        Self::build(Box::new(links), String::new(), true, BTreeMap::new())
    }

    /// A page whose `<body>` never appears
    pub fn without_body() -> Self {
        Self::build(Box::new(|_| Vec::new()), String::new(), false, BTreeMap::new())
    }

    /// Every page renders `html`, serves `links` and answers selector queries
    /// from `nodes`
    pub fn page_with(
        html: &str,
        links: Vec<String>,
        nodes: BTreeMap<String, Vec<DomNode>>,
    ) -> Self {
        Self::build(Box::new(move |_| links.clone()), html.to_string(), true, nodes)
    }

    fn build(
        links: Box<LinkSource>,
        html: String,
        has_body: bool,
        nodes: BTreeMap<String, Vec<DomNode>>,
    ) -> Self {
        Self {
            state: Arc::new(FakeState {
                links,
                html,
                has_body,
                nodes,
                pages_opened: AtomicUsize::new(0),
                pages_closed: AtomicUsize::new(0),
                browser_closes: AtomicUsize::new(0),
                live_pages: AtomicUsize::new(0),
                max_live_pages: AtomicUsize::new(0),
                opened_at: Mutex::new(Vec::new()),
                query_delays: Mutex::new(BTreeMap::new()),
                recorded: Mutex::new(Recorded::default()),
            }),
        }
    }

    pub fn pages_opened(&self) -> usize {
        self.state.pages_opened.load(Ordering::SeqCst)
    }

    pub fn pages_closed(&self) -> usize {
        self.state.pages_closed.load(Ordering::SeqCst)
    }

    pub fn browser_closes(&self) -> usize {
        self.state.browser_closes.load(Ordering::SeqCst)
    }

    /// Most pages that were open at the same time
    pub fn max_live_pages(&self) -> usize {
        self.state.max_live_pages.load(Ordering::SeqCst)
    }

    pub fn opened_at(&self) -> Vec<Instant> {
        self.state.opened_at.lock().clone()
    }

    /// Make every query for `selector` stall for `delay` before answering
    pub fn delay_queries(&self, selector: &str, delay: Duration) -> &Self {
        self.state
            .query_delays
            .lock()
            .insert(selector.to_string(), delay);
        self
    }

    pub fn recorded(&self) -> Recorded {
        self.state.recorded.lock().clone()
    }

    /// Page handle for driving a session directly
    pub fn page(&self) -> FakePage {
        FakePage {
            state: Arc::clone(&self.state),
            url: Mutex::new(String::new()),
        }
    }
}

impl BrowserDriver for FakeBrowser {
    type Page = FakePage;

    async fn new_page(&self) -> Result<FakePage> {
        self.state.pages_opened.fetch_add(1, Ordering::SeqCst);
        self.state.opened_at.lock().push(Instant::now());
        let live = self.state.live_pages.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_live_pages.fetch_max(live, Ordering::SeqCst);
        Ok(self.page())
    }

    async fn close(&self) -> Result<()> {
        self.state.browser_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakePage {
    state: Arc<FakeState>,
    url: Mutex<String>,
}

impl PageDriver for FakePage {
    async fn set_extra_headers(&self, headers: &BTreeMap<String, String>) -> Result<()> {
        self.state.recorded.lock().headers.push(headers.clone());
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        *self.url.lock() = url.to_string();
        self.state.recorded.lock().navigations.push(url.to_string());
        Ok(())
    }

    async fn wait_ready(&self, _timeout: Duration) -> bool {
        true
    }

    async fn query_nodes(&self, selector: &str, _timeout: Duration) -> Result<Vec<DomNode>> {
        let delay = self.state.query_delays.lock().get(selector).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if selector == "body" {
            return Ok(if self.state.has_body {
                vec![DomNode::new(1)]
            } else {
                Vec::new()
            });
        }
        Ok(self.state.nodes.get(selector).cloned().unwrap_or_default())
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        if script == COLLECT_LINKS_SCRIPT {
            let url = self.url.lock().clone();
            return Ok(Value::from((self.state.links)(&url)));
        }
        if script == MARK_EVENT_TARGETS_SCRIPT {
            return Ok(Value::from(0));
        }
        if script == "location.href" {
            return Ok(Value::from(self.url.lock().clone()));
        }
        Ok(Value::Null)
    }

    async fn content(&self) -> Result<String> {
        Ok(self.state.html.clone())
    }

    async fn send_keys(&self, node: &DomNode, text: &str) -> Result<()> {
        self.state
            .recorded
            .lock()
            .send_keys
            .push((node.node_id, text.to_string()));
        Ok(())
    }

    async fn set_attribute(&self, node: &DomNode, key: &str, value: &str) -> Result<()> {
        self.state.recorded.lock().set_attributes.push((
            node.node_id,
            key.to_string(),
            value.to_string(),
        ));
        Ok(())
    }

    async fn set_property(&self, node: &DomNode, key: &str, value: Value) -> Result<()> {
        self.state
            .recorded
            .lock()
            .set_properties
            .push((node.node_id, key.to_string(), value));
        Ok(())
    }

    async fn remove_attribute(&self, node: &DomNode, key: &str) -> Result<()> {
        self.state
            .recorded
            .lock()
            .removed_attributes
            .push((node.node_id, key.to_string()));
        Ok(())
    }

    async fn set_input_files(&self, node: &DomNode, file: &Path) -> Result<()> {
        self.state
            .recorded
            .lock()
            .uploads
            .push((node.node_id, file.to_path_buf()));
        Ok(())
    }

    async fn close(self) -> Result<()> {
        self.state.pages_closed.fetch_add(1, Ordering::SeqCst);
        self.state.live_pages.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Builder with every delay shortened for tests
pub fn fast_config() -> TaskConfigBuilder {
    TaskConfig::builder()
        .before_exit_delay(Duration::ZERO)
        .event_trigger_interval(Duration::ZERO)
        .dom_content_loaded_timeout(Duration::from_millis(100))
        .page_load_timeout(Duration::from_secs(1))
        .tab_run_timeout(Duration::from_secs(5))
        .max_run_time(60)
}
