//! Chrome/Chromium driver over CDP

use anyhow::{Context, Result, anyhow};
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::cdp::browser_protocol::dom::{
    FocusParams, NodeId, RemoveAttributeParams, ResolveNodeParams, SetAttributeValueParams,
    SetFileInputFilesParams,
};
use chromiumoxide::cdp::browser_protocol::input::InsertTextParams;
use chromiumoxide::cdp::browser_protocol::network::{Headers, SetExtraHttpHeadersParams};
use chromiumoxide::cdp::js_protocol::runtime::{CallArgument, CallFunctionOnParams};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::{self, JoinHandle};
use tracing::{debug, error, info, trace, warn};

use super::cleanup::{CleanupResult, abort_handler, cleanup_browser_and_data};
use super::{BrowserDriver, DomNode, PageDriver};
use crate::utils::constants::CHROME_USER_AGENT;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Distinguishes profile directories of browsers launched by one process
static LAUNCH_SEQ: AtomicUsize = AtomicUsize::new(0);

/// How to obtain a browser
#[derive(Debug, Clone, Default)]
pub struct ChromiumOptions {
    /// Explicit executable; discovered when absent
    pub executable: Option<PathBuf>,
    /// Attach to a running browser instead of launching one
    pub ws_url: Option<String>,
    pub proxy: Option<String>,
    pub headless: bool,
}

/// Find Chrome/Chromium executable on the system with platform-specific search paths.
pub fn find_browser_executable(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        warn!("Configured browser path does not exist: {}", path.display());
    }

    // Environment variable overrides discovery
    if let Ok(path) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            info!(
                "Using browser from CHROMIUM_PATH environment variable: {}",
                path.display()
            );
            return Ok(path);
        }
        warn!(
            "CHROMIUM_PATH environment variable points to non-existent file: {}",
            path.display()
        );
    }

    let paths: &[&str] = if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "~/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "~/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/usr/local/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
    };

    for path_str in paths {
        let path = match path_str.strip_prefix("~/") {
            Some(rest) => match dirs::home_dir() {
                Some(home) => home.join(rest),
                None => continue,
            },
            None => PathBuf::from(path_str),
        };
        if path.exists() {
            info!("Found browser at: {}", path.display());
            return Ok(path);
        }
    }

    if !cfg!(target_os = "windows") {
        for cmd in &["chromium", "chromium-browser", "google-chrome", "chrome"] {
            if let Ok(output) = Command::new("which").arg(cmd).output()
                && output.status.success()
            {
                let path_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path_str.is_empty() {
                    let path = PathBuf::from(path_str);
                    info!("Found browser using 'which' command: {}", path.display());
                    return Ok(path);
                }
            }
        }
    }

    Err(anyhow!("Chrome/Chromium executable not found"))
}

/// Download a managed Chromium into the user cache directory
async fn download_managed_browser() -> Result<PathBuf> {
    info!("Downloading managed Chromium browser...");

    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("crawlscope")
        .join("chromium");
    tokio::fs::create_dir_all(&cache_dir)
        .await
        .context("Failed to create cache directory")?;

    let fetcher = BrowserFetcher::new(
        BrowserFetcherOptions::builder()
            .with_path(&cache_dir)
            .build()
            .context("Failed to build fetcher options")?,
    );
    let revision_info = fetcher.fetch().await.context("Failed to fetch browser")?;
    info!(
        "Downloaded Chromium to: {}",
        revision_info.folder_path.display()
    );
    Ok(revision_info.executable_path)
}

fn spawn_handler(mut handler: chromiumoxide::Handler) -> JoinHandle<()> {
    task::spawn(async move {
        while let Some(h) = handler.next().await {
            if let Err(e) = h {
                let error_msg = e.to_string();
                // Chrome emits CDP events chromiumoxide cannot decode; those are noise
                let benign = error_msg
                    .contains("data did not match any variant of untagged enum Message")
                    || error_msg.contains("Failed to deserialize WS response");
                if benign {
                    trace!("Suppressed benign CDP serialization error: {error_msg}");
                } else {
                    error!("Browser handler error: {e:?}");
                }
            }
        }
        debug!("Browser handler task completed");
    })
}

/// Browser handle shared by every page session of a crawl task
pub struct ChromiumBrowser {
    browser: RwLock<Browser>,
    handler_task: Mutex<Option<JoinHandle<()>>>,
    data_dir: Option<PathBuf>,
    launched: bool,
    closed: AtomicBool,
}

impl ChromiumBrowser {
    /// Launch a local browser, or attach when `ws_url` is set
    pub async fn open(options: &ChromiumOptions) -> Result<Self> {
        if let Some(ws_url) = options.ws_url.as_deref() {
            return Self::connect(ws_url).await;
        }
        Self::launch(options).await
    }

    pub async fn connect(ws_url: &str) -> Result<Self> {
        info!("Connecting to browser at {ws_url}");
        let (browser, handler) = Browser::connect(ws_url)
            .await
            .with_context(|| format!("Failed to connect to browser at {ws_url}"))?;
        Ok(Self {
            browser: RwLock::new(browser),
            handler_task: Mutex::new(Some(spawn_handler(handler))),
            data_dir: None,
            launched: false,
            closed: AtomicBool::new(false),
        })
    }

    pub async fn launch(options: &ChromiumOptions) -> Result<Self> {
        let chrome_path = match find_browser_executable(options.executable.as_deref()) {
            Ok(path) => path,
            Err(_) => {
                warn!("No Chrome/Chromium executable found. Will download and use fetcher.");
                download_managed_browser().await?
            }
        };

        let user_data_dir = std::env::temp_dir().join(format!(
            "crawlscope_chrome_{}_{}",
            std::process::id(),
            LAUNCH_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        tokio::fs::create_dir_all(&user_data_dir)
            .await
            .context("Failed to create user data directory")?;

        let mut config_builder = BrowserConfigBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .window_size(1920, 1080)
            .user_data_dir(user_data_dir.clone())
            .chrome_executable(chrome_path);

        if options.headless {
            config_builder = config_builder.headless_mode(HeadlessMode::default());
        } else {
            config_builder = config_builder.with_head();
        }

        if let Some(proxy) = options.proxy.as_deref() {
            config_builder = config_builder.arg(format!("--proxy-server={proxy}"));
        }

        config_builder = config_builder
            .arg(format!("--user-agent={CHROME_USER_AGENT}"))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-notifications")
            .arg("--disable-gpu")
            .arg("--disable-web-security")
            .arg("--disable-setuid-sandbox")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--ignore-certificate-errors")
            .arg("--disable-extensions")
            .arg("--disable-popup-blocking")
            .arg("--disable-background-networking")
            .arg("--disable-hang-monitor")
            .arg("--disable-prompt-on-repost")
            .arg("--password-store=basic")
            .arg("--use-mock-keychain")
            .arg("--mute-audio");

        let browser_config = config_builder
            .build()
            .map_err(|e| anyhow!("Failed to build browser config: {e}"))?;

        info!("Launching browser (headless: {})", options.headless);
        let (browser, handler) = Browser::launch(browser_config)
            .await
            .context("Failed to launch browser")?;

        Ok(Self {
            browser: RwLock::new(browser),
            handler_task: Mutex::new(Some(spawn_handler(handler))),
            data_dir: Some(user_data_dir),
            launched: true,
            closed: AtomicBool::new(false),
        })
    }
}

impl BrowserDriver for ChromiumBrowser {
    type Page = ChromiumPage;

    async fn new_page(&self) -> Result<ChromiumPage> {
        let browser = self.browser.read().await;
        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to open a new tab")?;
        Ok(ChromiumPage { page })
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let handler_task = self.handler_task.lock().take();
        if !self.launched {
            abort_handler(handler_task).await;
            return Ok(());
        }
        let mut browser = self.browser.write().await;
        match cleanup_browser_and_data(&mut browser, self.data_dir.clone(), handler_task).await {
            CleanupResult::Success => debug!("Browser closed"),
            CleanupResult::PartialFailure(errors) => {
                warn!("Browser cleanup completed with failures: {errors:?}");
            }
        }
        Ok(())
    }
}

/// One CDP target
pub struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    async fn focus(&self, node: &DomNode) -> Result<()> {
        self.page
            .execute(FocusParams::builder().node_id(NodeId::new(node.node_id)).build())
            .await?;
        Ok(())
    }
}

impl PageDriver for ChromiumPage {
    async fn set_extra_headers(&self, headers: &BTreeMap<String, String>) -> Result<()> {
        if headers.is_empty() {
            return Ok(());
        }
        let headers = Headers::new(serde_json::to_value(headers)?);
        self.page
            .execute(SetExtraHttpHeadersParams::new(headers))
            .await?;
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("Navigation to {url} failed"))?;
        Ok(())
    }

    async fn wait_ready(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            let left = timeout.saturating_sub(start.elapsed());
            if left.is_zero() {
                return false;
            }
            if let Ok(Ok(result)) =
                tokio::time::timeout(left, self.page.evaluate("document.readyState")).await
                && let Ok(state) = result.into_value::<String>()
                && state != "loading"
            {
                return true;
            }
            tokio::time::sleep(POLL_INTERVAL.min(timeout.saturating_sub(start.elapsed()))).await;
        }
    }

    async fn query_nodes(&self, selector: &str, timeout: Duration) -> Result<Vec<DomNode>> {
        let start = Instant::now();
        let elements = loop {
            let left = timeout.saturating_sub(start.elapsed());
            if left.is_zero() {
                return Ok(Vec::new());
            }
            if let Ok(Ok(elements)) =
                tokio::time::timeout(left, self.page.find_elements(selector)).await
                && !elements.is_empty()
            {
                break elements;
            }
            tokio::time::sleep(POLL_INTERVAL.min(timeout.saturating_sub(start.elapsed()))).await;
        };

        let mut nodes = Vec::with_capacity(elements.len());
        for element in elements {
            let left = timeout.saturating_sub(start.elapsed());
            let attributes = tokio::time::timeout(left, element.attributes())
                .await
                .ok()
                .and_then(Result::ok)
                .unwrap_or_default();
            nodes.push(DomNode::from_flat_attributes(
                *element.node_id.inner(),
                &attributes,
            ));
        }
        Ok(nodes)
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let result = self.page.evaluate(script).await?;
        // `undefined` results carry no value
        Ok(result.into_value().unwrap_or_default())
    }

    async fn content(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    async fn send_keys(&self, node: &DomNode, text: &str) -> Result<()> {
        self.focus(node).await?;
        self.page.execute(InsertTextParams::new(text)).await?;
        Ok(())
    }

    async fn set_attribute(&self, node: &DomNode, key: &str, value: &str) -> Result<()> {
        self.page
            .execute(SetAttributeValueParams::new(
                NodeId::new(node.node_id),
                key,
                value,
            ))
            .await?;
        Ok(())
    }

    async fn remove_attribute(&self, node: &DomNode, key: &str) -> Result<()> {
        self.page
            .execute(RemoveAttributeParams::new(NodeId::new(node.node_id), key))
            .await?;
        Ok(())
    }

    async fn set_property(
        &self,
        node: &DomNode,
        key: &str,
        value: serde_json::Value,
    ) -> Result<()> {
        let resolved = self
            .page
            .execute(
                ResolveNodeParams::builder()
                    .node_id(NodeId::new(node.node_id))
                    .build(),
            )
            .await?;
        let object_id = resolved
            .result
            .object
            .object_id
            .clone()
            .ok_or_else(|| anyhow!("Node {} has no remote object", node.node_id))?;
        let call = CallFunctionOnParams::builder()
            .function_declaration("function (key, value) { this[key] = value; }")
            .object_id(object_id)
            .argument(CallArgument::builder().value(serde_json::Value::from(key)).build())
            .argument(CallArgument::builder().value(value).build())
            .build()
            .map_err(anyhow::Error::msg)?;
        self.page.execute(call).await?;
        Ok(())
    }

    async fn set_input_files(&self, node: &DomNode, file: &Path) -> Result<()> {
        let params = SetFileInputFilesParams::builder()
            .files(vec![file.to_string_lossy().into_owned()])
            .node_id(NodeId::new(node.node_id))
            .build()
            .map_err(anyhow::Error::msg)?;
        self.page.execute(params).await?;
        Ok(())
    }

    async fn close(self) -> Result<()> {
        self.page.close().await?;
        Ok(())
    }
}
