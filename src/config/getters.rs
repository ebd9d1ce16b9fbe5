//! Read accessors for `TaskConfig`

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::{FormKeywordRule, TaskConfig};
use crate::filter::FilterMode;

impl TaskConfig {
    #[must_use]
    pub fn max_crawl_count(&self) -> usize {
        self.max_crawl_count
    }

    #[must_use]
    pub fn max_tabs_count(&self) -> usize {
        self.max_tabs_count.max(1)
    }

    #[must_use]
    pub fn tab_run_timeout(&self) -> Duration {
        self.tab_run_timeout
    }

    /// Wall-clock budget for the whole task
    #[must_use]
    pub fn max_run_time(&self) -> Duration {
        Duration::from_secs(self.max_run_time)
    }

    #[must_use]
    pub fn dom_content_loaded_timeout(&self) -> Duration {
        self.dom_content_loaded_timeout
    }

    #[must_use]
    pub fn event_trigger_interval(&self) -> Duration {
        self.event_trigger_interval
    }

    #[must_use]
    pub fn before_exit_delay(&self) -> Duration {
        self.before_exit_delay
    }

    #[must_use]
    pub fn page_load_timeout(&self) -> Duration {
        self.page_load_timeout
    }

    #[must_use]
    pub fn filter_mode(&self) -> FilterMode {
        self.filter_mode
    }

    #[must_use]
    pub fn ignore_keywords(&self) -> &[String] {
        &self.ignore_keywords
    }

    #[must_use]
    pub fn custom_form_values(&self) -> &BTreeMap<String, String> {
        &self.custom_form_values
    }

    #[must_use]
    pub fn custom_form_keyword_values(&self) -> &[FormKeywordRule] {
        &self.custom_form_keyword_values
    }

    #[must_use]
    pub fn default_form_value(&self) -> &str {
        &self.default_form_value
    }

    /// File handed to file inputs, `./upload/image.png` unless configured
    #[must_use]
    pub fn upload_file_path(&self) -> PathBuf {
        self.upload_file_path.clone().unwrap_or_else(|| {
            std::env::current_dir()
                .unwrap_or_default()
                .join("upload")
                .join("image.png")
        })
    }

    #[must_use]
    pub fn extra_headers(&self) -> &BTreeMap<String, String> {
        &self.extra_headers
    }

    #[must_use]
    pub fn extra_headers_json(&self) -> Option<&str> {
        self.extra_headers_json.as_deref()
    }

    /// `extra_headers` overlaid with the parsed `extra_headers_json` object.
    ///
    /// Non-string JSON values are kept in their JSON text form.
    pub fn merged_extra_headers(&self) -> Result<BTreeMap<String, String>> {
        let mut headers = self.extra_headers.clone();
        let Some(raw) = self.extra_headers_json.as_deref().map(str::trim) else {
            return Ok(headers);
        };
        if raw.is_empty() {
            return Ok(headers);
        }
        let parsed: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(raw).context("Extra headers must be a JSON object")?;
        for (name, value) in parsed {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            headers.insert(name, value);
        }
        Ok(headers)
    }

    #[must_use]
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    #[must_use]
    pub fn encode_url_with_charset(&self) -> bool {
        self.encode_url_with_charset
    }

    #[must_use]
    pub fn path_from_robots(&self) -> bool {
        self.path_from_robots
    }

    #[must_use]
    pub fn path_by_fuzz(&self) -> bool {
        self.path_by_fuzz
    }

    #[must_use]
    pub fn fuzz_dict_path(&self) -> Option<&Path> {
        self.fuzz_dict_path.as_deref()
    }

    #[must_use]
    pub fn chromium_path(&self) -> Option<&Path> {
        self.chromium_path.as_deref()
    }

    #[must_use]
    pub fn chromium_ws_url(&self) -> Option<&str> {
        self.chromium_ws_url.as_deref()
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    /// Work-queue bound, never below the crawl budget's needs
    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(self.max_crawl_count).max(1)
    }
}
