//! Crawl task scheduling
//!
//! Admitted requests go into a bounded work queue. A dispatcher drains the
//! queue, running at most `max_tabs_count` page sessions at a time, and every
//! session feeds its filtered discoveries back into the same queue. The
//! crawl budget decides admission; a `TaskGroup` tracks admitted work so the
//! dispatcher knows when the crawl has drained.

use log::{debug, info, trace, warn};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};

use super::budget::{CrawlBudget, Rejection};
use super::crawl_types::{CrawlError, CrawlResult};
use super::page_timeout::{tab_timeout, with_page_timeout};
use super::results::{CrawlOutput, ResultCollector};
use super::seed_expansion::{
    build_http_client, expand_fuzz_dict, expand_fuzz_pattern, fetch_robots_paths,
};
use super::task_group::TaskGroup;
use crate::browser::{BrowserDriver, ChromiumBrowser, ChromiumOptions, PageDriver};
use crate::config::TaskConfig;
use crate::filter::{RequestFilter, build_filter, is_ignored_by_keywords};
use crate::page_session::{PageSession, SessionContext};
use crate::request::{Request, RequestSource};

/// One crawl run over a set of seeds
pub struct CrawlTask<B: BrowserDriver> {
    targets: Vec<Request>,
    config: TaskConfig,
    headers: BTreeMap<String, String>,
    scope_host: String,
    browser: Arc<B>,
}

impl CrawlTask<ChromiumBrowser> {
    /// Validate seeds and configuration, then launch or attach to Chrome
    pub async fn new(targets: Vec<Request>, config: TaskConfig) -> CrawlResult<Self> {
        let targets = prepare_targets(targets)?;
        let headers = config
            .merged_extra_headers()
            .map_err(|e| CrawlError::Config(format!("{e:#}")))?;

        let options = ChromiumOptions {
            executable: config.chromium_path().map(ToOwned::to_owned),
            ws_url: config.chromium_ws_url().map(ToOwned::to_owned),
            proxy: config.proxy().map(ToOwned::to_owned),
            headless: config.headless(),
        };
        let browser = ChromiumBrowser::open(&options)
            .await
            .map_err(|e| CrawlError::Browser(format!("{e:#}")))?;

        Ok(Self::assemble(targets, config, headers, browser))
    }
}

impl<B: BrowserDriver> CrawlTask<B> {
    /// Build a task around an already open browser
    pub fn with_browser(targets: Vec<Request>, config: TaskConfig, browser: B) -> CrawlResult<Self> {
        let targets = prepare_targets(targets)?;
        let headers = config
            .merged_extra_headers()
            .map_err(|e| CrawlError::Config(format!("{e:#}")))?;
        Ok(Self::assemble(targets, config, headers, browser))
    }

    fn assemble(
        targets: Vec<Request>,
        config: TaskConfig,
        headers: BTreeMap<String, String>,
        browser: B,
    ) -> Self {
        let scope_host = targets
            .first()
            .map(Request::host_with_port)
            .unwrap_or_default();
        Self {
            targets,
            config,
            headers,
            scope_host,
            browser: Arc::new(browser),
        }
    }

    #[must_use]
    pub fn targets(&self) -> &[Request] {
        &self.targets
    }

    #[must_use]
    pub fn scope_host(&self) -> &str {
        &self.scope_host
    }

    /// Shared browser handle, e.g. for closing it from a signal handler
    #[must_use]
    pub fn browser(&self) -> Arc<B> {
        Arc::clone(&self.browser)
    }

    /// Run to completion. The browser is closed however the crawl ends.
    pub async fn run(self) -> CrawlResult<CrawlOutput> {
        let browser = Arc::clone(&self.browser);
        let output = self.crawl().await;
        if let Err(e) = browser.close().await {
            warn!(target: "crawlscope::scheduler", "Failed to close browser: {e:#}");
        }
        Ok(output)
    }

    async fn crawl(self) -> CrawlOutput {
        let start_time = Instant::now();
        let config = self.config;
        let mut targets = self.targets;
        targets.extend(expand_seeds(&targets[0], &config, &self.headers).await);

        let filter = build_filter(config.filter_mode(), &self.scope_host);
        let (sender, receiver) = mpsc::channel(config.queue_capacity());
        let shared = Arc::new(Shared {
            browser: self.browser,
            filter,
            budget: CrawlBudget::starting_at(
                config.max_crawl_count(),
                config.max_run_time(),
                start_time,
            ),
            results: ResultCollector::new(),
            group: Arc::new(TaskGroup::new()),
            sender,
            session: SessionContext::from_config(&config, self.headers),
            ignore_keywords: config.ignore_keywords().to_vec(),
            tab_run_timeout: config.tab_run_timeout(),
        });

        info!(
            target: "crawlscope::scheduler",
            "Starting crawl of {} with {} targets (mode: {}, max crawl: {}, tabs: {})",
            self.scope_host,
            targets.len(),
            config.filter_mode(),
            config.max_crawl_count(),
            config.max_tabs_count()
        );

        shared.results.push_all(targets.iter().cloned());
        for target in targets {
            shared.consider(target);
        }

        dispatch(Arc::clone(&shared), receiver, config.max_tabs_count()).await;

        let output = shared.results.finish(&self.scope_host);
        info!(
            target: "crawlscope::scheduler",
            "Crawl of {} finished in {:.1}s: {} sessions, {} kept, {} seen",
            self.scope_host,
            start_time.elapsed().as_secs_f64(),
            shared.budget.crawled_count(),
            output.req_list.len(),
            output.all_req_list.len()
        );
        output
    }
}

/// Validate seeds, tag them as targets and add the opposite-scheme twin of a
/// single seed
fn prepare_targets(mut targets: Vec<Request>) -> CrawlResult<Vec<Request>> {
    if targets.is_empty() {
        return Err(CrawlError::NoTargets);
    }
    if targets.len() == 1
        && let Some(twin) = targets[0].with_flipped_scheme()
    {
        targets.push(twin);
    }
    for target in &mut targets {
        target.source = RequestSource::Target;
    }
    Ok(targets)
}

async fn expand_seeds(
    seed: &Request,
    config: &TaskConfig,
    headers: &BTreeMap<String, String>,
) -> Vec<Request> {
    let mut extra = Vec::new();

    if config.path_from_robots() {
        let fetched = match build_http_client(config.proxy(), headers) {
            Ok(client) => fetch_robots_paths(&seed.url, &client).await,
            Err(e) => Err(e),
        };
        match fetched {
            Ok(reqs) => {
                info!(target: "crawlscope::seeds", "Got {} paths from robots.txt", reqs.len());
                extra.extend(reqs);
            }
            Err(e) => warn!(target: "crawlscope::seeds", "robots.txt expansion failed: {e:#}"),
        }
    }

    if config.path_by_fuzz() || config.fuzz_dict_path().is_some() {
        let reqs = match config.fuzz_dict_path() {
            Some(dict) => match expand_fuzz_dict(&seed.url, dict).await {
                Ok(reqs) => reqs,
                Err(e) => {
                    warn!(target: "crawlscope::seeds", "Fuzz dictionary expansion failed: {e:#}");
                    Vec::new()
                }
            },
            None => expand_fuzz_pattern(&seed.url),
        };
        info!(target: "crawlscope::seeds", "Got {} paths from fuzzing", reqs.len());
        extra.extend(reqs);
    }

    extra
}

/// State shared by the dispatcher and every running page session
struct Shared<B: BrowserDriver> {
    browser: Arc<B>,
    filter: Arc<dyn RequestFilter>,
    budget: CrawlBudget,
    results: ResultCollector,
    group: Arc<TaskGroup>,
    sender: Sender<Request>,
    session: SessionContext,
    ignore_keywords: Vec<String>,
    tab_run_timeout: Duration,
}

impl<B: BrowserDriver> Shared<B> {
    /// Filter a candidate, record it, and queue it unless blacklisted
    fn consider(&self, req: Request) {
        if self.filter.do_filter(&req) {
            return;
        }
        self.results.push_kept(req.clone());
        if is_ignored_by_keywords(&req, &self.ignore_keywords) {
            debug!(target: "crawlscope::scheduler", "Ignored by keyword: {}", req.url);
            return;
        }
        self.submit(req);
    }

    /// Admit `req` against the budget and queue it
    fn submit(&self, req: Request) {
        if let Err(rejection) = self.budget.try_admit() {
            match rejection {
                Rejection::CountExhausted => {
                    trace!(target: "crawlscope::scheduler", "Crawl count exhausted, skipping {}", req.url);
                }
                Rejection::DeadlinePassed => {
                    debug!(target: "crawlscope::scheduler", "Run time exhausted, skipping {}", req.url);
                }
            }
            return;
        }

        self.group.add();
        if let Err(e) = self.sender.try_send(req) {
            self.group.done();
            let (error, req) = match e {
                TrySendError::Full(req) => (CrawlError::PoolSaturated, req),
                TrySendError::Closed(req) => (CrawlError::PoolClosed, req),
            };
            warn!(target: "crawlscope::scheduler", "{error}, dropping {}", req.url);
        }
    }

    async fn process(&self, req: Request) {
        let timeout = tab_timeout(self.tab_run_timeout, self.budget.remaining());
        if timeout.is_zero() {
            debug!(target: "crawlscope::scheduler", "No run time left for {}", req.url);
            return;
        }

        let page = match self.browser.new_page().await {
            Ok(page) => page,
            Err(e) => {
                warn!(target: "crawlscope::scheduler", "Failed to open tab for {}: {e:#}", req.url);
                return;
            }
        };

        debug!(target: "crawlscope::scheduler", "Crawling {} {}", req.method, req.url);
        let session = PageSession::new(&page, &req, &self.session);
        let discovered = match with_page_timeout(
            async { Ok(session.run().await) },
            timeout,
            "Page session",
        )
        .await
        {
            Ok(outcome) => outcome.discovered,
            Err(e) => {
                debug!(target: "crawlscope::scheduler", "{e} for {}", req.url);
                Vec::new()
            }
        };

        if let Err(e) = page.close().await {
            debug!(target: "crawlscope::scheduler", "Failed to close tab: {e:#}");
        }

        self.results.push_all(discovered.iter().cloned());
        for found in discovered {
            self.consider(found);
        }
    }
}

/// Run queued jobs with at most `max_tabs` in flight until no admitted job
/// remains
async fn dispatch<B: BrowserDriver>(
    shared: Arc<Shared<B>>,
    mut receiver: Receiver<Request>,
    max_tabs: usize,
) {
    let semaphore = Arc::new(Semaphore::new(max_tabs.max(1)));
    loop {
        tokio::select! {
            job = receiver.recv() => {
                let Some(req) = job else { break };
                let guard = shared.group.guard();
                let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                    warn!(target: "crawlscope::scheduler", "Tab semaphore closed unexpectedly");
                    break;
                };
                let shared = Arc::clone(&shared);
                tokio::spawn(async move {
                    let _guard = guard;
                    let _permit = permit;
                    shared.process(req).await;
                });
            }
            () = shared.group.wait_idle() => break,
        }
    }
    receiver.close();
}
