//! Page session: one request processed in one tab
//!
//! A session walks a fixed sequence of phases. Navigation problems are logged
//! and tolerated; a page whose `<body>` never appears ends the session with
//! no discoveries. The form autofill jobs and the mutation observer run
//! concurrently and both finish before the after-load phase collects links.

pub mod form_fill;
pub mod js_scripts;
pub mod link_collector;

use log::{debug, trace, warn};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::browser::PageDriver;
use crate::config::TaskConfig;
use crate::request::Request;
use crate::utils::constants::{MAX_TRIGGERED_EVENTS, ROOT_ELEMENT_TIMEOUT};

pub use form_fill::{FormValueResolver, InputAction, classify_input, fill_forms};
pub use link_collector::{
    encode_url_with_charset, parse_static_links, requests_from_dom_links, resolve_link,
};

/// Everything a session needs besides the page and its request
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub resolver: FormValueResolver,
    pub headers: BTreeMap<String, String>,
    pub upload_file: PathBuf,
    pub page_load_timeout: Duration,
    pub dom_content_loaded_timeout: Duration,
    pub event_trigger_interval: Duration,
    pub before_exit_delay: Duration,
    pub encode_url_with_charset: bool,
}

impl SessionContext {
    /// Context for a task; `headers` is the already merged extra-header set
    #[must_use]
    pub fn from_config(config: &TaskConfig, headers: BTreeMap<String, String>) -> Self {
        Self {
            resolver: FormValueResolver::from_config(config),
            headers,
            upload_file: config.upload_file_path(),
            page_load_timeout: config.page_load_timeout(),
            dom_content_loaded_timeout: config.dom_content_loaded_timeout(),
            event_trigger_interval: config.event_trigger_interval(),
            before_exit_delay: config.before_exit_delay(),
            encode_url_with_charset: config.encode_url_with_charset(),
        }
    }
}

/// Phases of a session, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionPhase {
    Navigate,
    ResolveRoot,
    DomTasks,
    AfterLoad,
    Finished,
}

/// What a session produced and how far it got
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub phase: SessionPhase,
    pub discovered: Vec<Request>,
}

pub struct PageSession<'a, P: PageDriver> {
    page: &'a P,
    request: &'a Request,
    ctx: &'a SessionContext,
    phase: SessionPhase,
}

impl<'a, P: PageDriver> PageSession<'a, P> {
    #[must_use]
    pub fn new(page: &'a P, request: &'a Request, ctx: &'a SessionContext) -> Self {
        Self {
            page,
            request,
            ctx,
            phase: SessionPhase::Navigate,
        }
    }

    fn enter(&mut self, phase: SessionPhase) {
        trace!(target: "crawlscope::session", "{:?} -> {:?} for {}", self.phase, phase, self.request.url);
        self.phase = phase;
    }

    fn outcome(&self, discovered: Vec<Request>) -> SessionOutcome {
        SessionOutcome {
            phase: self.phase,
            discovered,
        }
    }

    pub async fn run(mut self) -> SessionOutcome {
        self.navigate().await;

        self.enter(SessionPhase::ResolveRoot);
        if !self.resolve_root().await {
            debug!(target: "crawlscope::session", "No document body for {}, ending session", self.request.url);
            return self.outcome(Vec::new());
        }

        self.enter(SessionPhase::DomTasks);
        tokio::join!(
            fill_forms(self.page, &self.ctx.resolver, &self.ctx.upload_file),
            self.install_observer(),
        );

        self.enter(SessionPhase::AfterLoad);
        let discovered = self.after_load().await;

        self.enter(SessionPhase::Finished);
        self.outcome(discovered)
    }

    async fn navigate(&self) {
        let mut headers = self.ctx.headers.clone();
        headers.extend(self.request.headers.clone());
        if let Err(e) = self.page.set_extra_headers(&headers).await {
            debug!(target: "crawlscope::session", "Setting extra headers failed: {e}");
        }

        let url = self.request.url.as_str();
        match tokio::time::timeout(self.ctx.page_load_timeout, self.page.navigate(url)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(target: "crawlscope::session", "Navigation failed for {url}: {e}"),
            Err(_) => warn!(
                target: "crawlscope::session",
                "Navigation timeout after {:?} for {url}", self.ctx.page_load_timeout
            ),
        }

        let timeout = self.ctx.dom_content_loaded_timeout;
        let ready = tokio::time::timeout(timeout, self.page.wait_ready(timeout))
            .await
            .unwrap_or(false);
        if !ready {
            debug!(target: "crawlscope::session", "DOMContentLoaded not seen for {url}");
        }
    }

    async fn resolve_root(&self) -> bool {
        let lookup = self.page.query_nodes("body", ROOT_ELEMENT_TIMEOUT);
        match tokio::time::timeout(ROOT_ELEMENT_TIMEOUT, lookup).await {
            Ok(Ok(nodes)) => !nodes.is_empty(),
            Ok(Err(e)) => {
                debug!(target: "crawlscope::session", "Body lookup failed: {e}");
                false
            }
            Err(_) => {
                debug!(target: "crawlscope::session", "Body lookup timed out after {ROOT_ELEMENT_TIMEOUT:?}");
                false
            }
        }
    }

    async fn install_observer(&self) {
        if let Err(e) = self.page.evaluate(js_scripts::OBSERVER_SCRIPT).await {
            debug!(target: "crawlscope::session", "Observer injection failed: {e}");
        }
    }

    async fn trigger_events(&self) {
        let marked = match self.page.evaluate(js_scripts::MARK_EVENT_TARGETS_SCRIPT).await {
            Ok(value) => value.as_u64().unwrap_or(0) as usize,
            Err(e) => {
                debug!(target: "crawlscope::session", "Marking event targets failed: {e}");
                return;
            }
        };
        for index in 0..marked.min(MAX_TRIGGERED_EVENTS) {
            let _ = self
                .page
                .evaluate(&js_scripts::trigger_event_script(index))
                .await;
            tokio::time::sleep(self.ctx.event_trigger_interval).await;
        }
    }

    /// Page URL after redirects, falling back to the requested URL
    async fn current_url(&self) -> Url {
        self.page
            .evaluate("location.href")
            .await
            .ok()
            .and_then(|v| v.as_str().and_then(|s| Url::parse(s).ok()))
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or_else(|| self.request.url.clone())
    }

    async fn after_load(&self) -> Vec<Request> {
        self.trigger_events().await;
        tokio::time::sleep(self.ctx.before_exit_delay).await;

        let base = self.current_url().await;
        let encode = self.ctx.encode_url_with_charset;
        let mut discovered = Vec::new();

        match self.page.evaluate(js_scripts::COLLECT_LINKS_SCRIPT).await {
            Ok(value) => discovered.extend(requests_from_dom_links(&value, &base, encode)),
            Err(e) => debug!(target: "crawlscope::session", "Link collection failed: {e}"),
        }

        match self.page.content().await {
            Ok(html) => discovered.extend(parse_static_links(
                &html,
                &base,
                &self.ctx.resolver,
                encode,
            )),
            Err(e) => debug!(target: "crawlscope::session", "Reading page content failed: {e}"),
        }

        debug!(
            target: "crawlscope::session",
            "{} discovered {} candidate requests", self.request.url, discovered.len()
        );
        discovered
    }
}
