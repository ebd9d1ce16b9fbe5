//! Core configuration types for crawl tasks
//!
//! `TaskConfig` is the value-level configuration surface consumed by the crawl
//! engine. Flags and files are the binary's business; everything here is plain
//! data and serializes to JSON for `--config` files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::filter::FilterMode;
use crate::utils::{
    DEFAULT_BEFORE_EXIT_DELAY, DEFAULT_DOM_CONTENT_LOADED_TIMEOUT, DEFAULT_EVENT_TRIGGER_INTERVAL,
    DEFAULT_FORM_VALUE, DEFAULT_IGNORE_KEYWORDS, DEFAULT_MAX_CRAWL_COUNT, DEFAULT_MAX_RUN_TIME_SECS,
    DEFAULT_MAX_TABS_COUNT, DEFAULT_PAGE_LOAD_TIMEOUT, DEFAULT_TAB_RUN_TIMEOUT,
};

/// One custom keyword override: any field whose lookup key contains
/// `keyword` is filled with `value`. Rules are tried in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormKeywordRule {
    pub keyword: String,
    pub value: String,
}

/// Main configuration struct for a crawl task
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Maximum number of page sessions admitted by one task
    pub(crate) max_crawl_count: usize,

    /// Number of page sessions allowed to run at the same time
    pub(crate) max_tabs_count: usize,

    /// Upper bound on one page session; shortened to the remaining run time
    #[serde(with = "duration_millis")]
    pub(crate) tab_run_timeout: Duration,

    /// Wall-clock budget for the whole task, in seconds
    pub(crate) max_run_time: u64,

    #[serde(with = "duration_millis")]
    pub(crate) dom_content_loaded_timeout: Duration,

    #[serde(with = "duration_millis")]
    pub(crate) event_trigger_interval: Duration,

    #[serde(with = "duration_millis")]
    pub(crate) before_exit_delay: Duration,

    /// Bound on `page.goto()`
    #[serde(with = "duration_millis")]
    pub(crate) page_load_timeout: Duration,

    pub(crate) filter_mode: FilterMode,

    /// Links whose URL contains any of these are never followed
    pub(crate) ignore_keywords: Vec<String>,

    /// Per-category value overrides (`mail`, `phone`, ..., and `default`)
    pub(crate) custom_form_values: BTreeMap<String, String>,

    /// Ordered keyword overrides checked before the built-in table
    pub(crate) custom_form_keyword_values: Vec<FormKeywordRule>,

    /// Value for fields nothing else matches, unless `custom_form_values["default"]` is set
    pub(crate) default_form_value: String,

    /// File handed to `<input type=file>`; defaults to `./upload/image.png`
    pub(crate) upload_file_path: Option<PathBuf>,

    pub(crate) extra_headers: BTreeMap<String, String>,

    /// Raw JSON object of headers, parsed when the task is constructed
    pub(crate) extra_headers_json: Option<String>,

    pub(crate) proxy: Option<String>,
    pub(crate) encode_url_with_charset: bool,
    pub(crate) path_from_robots: bool,
    pub(crate) path_by_fuzz: bool,
    pub(crate) fuzz_dict_path: Option<PathBuf>,

    pub(crate) chromium_path: Option<PathBuf>,
    /// Attach to a running browser instead of launching one
    pub(crate) chromium_ws_url: Option<String>,
    pub(crate) headless: bool,

    /// Bound on queued-but-not-started page sessions; defaults to `max_crawl_count`
    pub(crate) queue_capacity: Option<usize>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            max_crawl_count: DEFAULT_MAX_CRAWL_COUNT,
            max_tabs_count: DEFAULT_MAX_TABS_COUNT,
            tab_run_timeout: DEFAULT_TAB_RUN_TIMEOUT,
            max_run_time: DEFAULT_MAX_RUN_TIME_SECS,
            dom_content_loaded_timeout: DEFAULT_DOM_CONTENT_LOADED_TIMEOUT,
            event_trigger_interval: DEFAULT_EVENT_TRIGGER_INTERVAL,
            before_exit_delay: DEFAULT_BEFORE_EXIT_DELAY,
            page_load_timeout: DEFAULT_PAGE_LOAD_TIMEOUT,
            filter_mode: FilterMode::default(),
            ignore_keywords: DEFAULT_IGNORE_KEYWORDS
                .iter()
                .map(|k| (*k).to_string())
                .collect(),
            custom_form_values: BTreeMap::new(),
            custom_form_keyword_values: Vec::new(),
            default_form_value: DEFAULT_FORM_VALUE.to_string(),
            upload_file_path: None,
            extra_headers: BTreeMap::new(),
            extra_headers_json: None,
            proxy: None,
            encode_url_with_charset: false,
            path_from_robots: false,
            path_by_fuzz: false,
            fuzz_dict_path: None,
            chromium_path: None,
            chromium_ws_url: None,
            headless: true,
            queue_capacity: None,
        }
    }
}

impl TaskConfig {
    /// Load a JSON configuration file; absent fields keep their defaults
    pub fn from_json_file(path: &std::path::Path) -> anyhow::Result<Self> {
        use anyhow::Context;
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
