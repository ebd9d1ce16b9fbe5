//! Fluent builder for `TaskConfig`
//!
//! Every field has a default, so the builder starts from `TaskConfig::default()`
//! and validates numeric bounds once in `build()`.

use anyhow::{Result, anyhow};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use super::types::{FormKeywordRule, TaskConfig};
use crate::filter::FilterMode;

pub struct TaskConfigBuilder {
    config: TaskConfig,
}

impl Default for TaskConfigBuilder {
    fn default() -> Self {
        Self {
            config: TaskConfig::default(),
        }
    }
}

impl TaskConfig {
    /// Create a builder for configuring a `TaskConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> TaskConfigBuilder {
        TaskConfigBuilder::default()
    }

    /// Re-open an existing configuration for modification
    #[must_use]
    pub fn to_builder(&self) -> TaskConfigBuilder {
        TaskConfigBuilder {
            config: self.clone(),
        }
    }
}

impl TaskConfigBuilder {
    #[must_use]
    pub fn max_crawl_count(mut self, count: usize) -> Self {
        self.config.max_crawl_count = count;
        self
    }

    #[must_use]
    pub fn max_tabs_count(mut self, count: usize) -> Self {
        self.config.max_tabs_count = count;
        self
    }

    #[must_use]
    pub fn tab_run_timeout(mut self, timeout: Duration) -> Self {
        self.config.tab_run_timeout = timeout;
        self
    }

    /// Wall-clock budget for the whole task, in seconds
    #[must_use]
    pub fn max_run_time(mut self, secs: u64) -> Self {
        self.config.max_run_time = secs;
        self
    }

    #[must_use]
    pub fn dom_content_loaded_timeout(mut self, timeout: Duration) -> Self {
        self.config.dom_content_loaded_timeout = timeout;
        self
    }

    #[must_use]
    pub fn event_trigger_interval(mut self, interval: Duration) -> Self {
        self.config.event_trigger_interval = interval;
        self
    }

    #[must_use]
    pub fn before_exit_delay(mut self, delay: Duration) -> Self {
        self.config.before_exit_delay = delay;
        self
    }

    #[must_use]
    pub fn page_load_timeout(mut self, timeout: Duration) -> Self {
        self.config.page_load_timeout = timeout;
        self
    }

    #[must_use]
    pub fn filter_mode(mut self, mode: FilterMode) -> Self {
        self.config.filter_mode = mode;
        self
    }

    #[must_use]
    pub fn ignore_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.ignore_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn custom_form_values(mut self, values: BTreeMap<String, String>) -> Self {
        self.config.custom_form_values = values;
        self
    }

    /// Append a keyword override; earlier rules win
    #[must_use]
    pub fn custom_form_keyword_value(
        mut self,
        keyword: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.config.custom_form_keyword_values.push(FormKeywordRule {
            keyword: keyword.into(),
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn default_form_value(mut self, value: impl Into<String>) -> Self {
        self.config.default_form_value = value.into();
        self
    }

    #[must_use]
    pub fn upload_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.upload_file_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn extra_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.config.extra_headers = headers;
        self
    }

    /// Raw JSON header object; validated when the crawl task is constructed
    #[must_use]
    pub fn extra_headers_json(mut self, raw: impl Into<String>) -> Self {
        self.config.extra_headers_json = Some(raw.into());
        self
    }

    #[must_use]
    pub fn proxy(mut self, proxy: Option<String>) -> Self {
        self.config.proxy = proxy.filter(|p| !p.trim().is_empty());
        self
    }

    #[must_use]
    pub fn encode_url_with_charset(mut self, enabled: bool) -> Self {
        self.config.encode_url_with_charset = enabled;
        self
    }

    #[must_use]
    pub fn path_from_robots(mut self, enabled: bool) -> Self {
        self.config.path_from_robots = enabled;
        self
    }

    #[must_use]
    pub fn path_by_fuzz(mut self, enabled: bool) -> Self {
        self.config.path_by_fuzz = enabled;
        self
    }

    #[must_use]
    pub fn fuzz_dict_path(mut self, path: Option<PathBuf>) -> Self {
        self.config.fuzz_dict_path = path;
        self
    }

    #[must_use]
    pub fn chromium_path(mut self, path: Option<PathBuf>) -> Self {
        self.config.chromium_path = path;
        self
    }

    #[must_use]
    pub fn chromium_ws_url(mut self, url: Option<String>) -> Self {
        self.config.chromium_ws_url = url.filter(|u| !u.trim().is_empty());
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    #[must_use]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = Some(capacity);
        self
    }

    /// Validate and produce the configuration
    pub fn build(self) -> Result<TaskConfig> {
        let config = self.config;
        if config.max_crawl_count == 0 {
            return Err(anyhow!("max_crawl_count must be at least 1"));
        }
        if config.max_tabs_count == 0 {
            return Err(anyhow!("max_tabs_count must be at least 1"));
        }
        if config.max_run_time == 0 {
            return Err(anyhow!("max_run_time must be at least 1 second"));
        }
        if config.tab_run_timeout.is_zero() {
            return Err(anyhow!("tab_run_timeout must be positive"));
        }
        if config.queue_capacity == Some(0) {
            return Err(anyhow!("queue_capacity must be at least 1"));
        }
        Ok(config)
    }
}
