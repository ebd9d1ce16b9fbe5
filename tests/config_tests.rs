//! Tests for the task configuration builder and JSON config files

use crawlscope::{FilterMode, TaskConfig};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_builder_defaults() {
    let config = TaskConfig::builder().build().unwrap();

    assert_eq!(config.max_crawl_count(), 200);
    assert_eq!(config.max_tabs_count(), 8);
    assert_eq!(config.max_run_time(), Duration::from_secs(3600));
    assert_eq!(config.filter_mode(), FilterMode::Smart);
    assert_eq!(config.ignore_keywords(), ["logout", "quit", "exit"]);
    assert_eq!(config.queue_capacity(), 200);
    assert!(config.headless());
    assert!(!config.encode_url_with_charset());
    assert!(config.upload_file_path().ends_with("upload/image.png"));
}

#[test]
fn test_builder_rejects_zero_budgets() {
    assert!(TaskConfig::builder().max_crawl_count(0).build().is_err());
    assert!(TaskConfig::builder().max_tabs_count(0).build().is_err());
    assert!(TaskConfig::builder().max_run_time(0).build().is_err());
    assert!(
        TaskConfig::builder()
            .tab_run_timeout(Duration::ZERO)
            .build()
            .is_err()
    );
    assert!(TaskConfig::builder().queue_capacity(0).build().is_err());
}

#[test]
fn test_to_builder_keeps_existing_values() {
    let base = TaskConfig::builder()
        .max_crawl_count(9)
        .filter_mode(FilterMode::Strict)
        .build()
        .unwrap();
    let derived = base.to_builder().max_tabs_count(2).build().unwrap();

    assert_eq!(derived.max_crawl_count(), 9);
    assert_eq!(derived.filter_mode(), FilterMode::Strict);
    assert_eq!(derived.max_tabs_count(), 2);
    assert_eq!(derived.queue_capacity(), 9);
}

#[test]
fn test_empty_proxy_is_ignored() {
    let config = TaskConfig::builder()
        .proxy(Some(String::new()))
        .chromium_ws_url(Some("ws://127.0.0.1:9222/devtools/browser/x".into()))
        .build()
        .unwrap();
    assert_eq!(config.proxy(), None);
    assert!(config.chromium_ws_url().is_some());
}

#[test]
fn test_merged_headers_overlay_json() {
    let mut headers = std::collections::BTreeMap::new();
    headers.insert("Cookie".to_string(), "old".to_string());
    headers.insert("Referer".to_string(), "http://example.com/".to_string());
    let config = TaskConfig::builder()
        .extra_headers(headers)
        .extra_headers_json(r#"{"Cookie": "new", "X-Retry": 3}"#)
        .build()
        .unwrap();

    let merged = config.merged_extra_headers().unwrap();
    assert_eq!(merged["Cookie"], "new");
    assert_eq!(merged["Referer"], "http://example.com/");
    assert_eq!(merged["X-Retry"], "3");

    let broken = TaskConfig::builder()
        .extra_headers_json("[1, 2]")
        .build()
        .unwrap();
    assert!(broken.merged_extra_headers().is_err());
}

#[test]
fn test_json_config_file_fills_missing_fields_with_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("task.json");
    std::fs::write(
        &path,
        r#"{
            "max_crawl_count": 7,
            "filter_mode": "strict",
            "tab_run_timeout": 1500,
            "custom_form_keyword_values": [{"keyword": "coupon", "value": "FREE"}]
        }"#,
    )
    .unwrap();

    let config = TaskConfig::from_json_file(&path).unwrap();
    assert_eq!(config.max_crawl_count(), 7);
    assert_eq!(config.filter_mode(), FilterMode::Strict);
    assert_eq!(config.tab_run_timeout(), Duration::from_millis(1500));
    assert_eq!(config.custom_form_keyword_values()[0].value, "FREE");
    assert_eq!(config.max_tabs_count(), 8);
}

#[test]
fn test_json_config_file_errors() {
    let dir = TempDir::new().unwrap();
    assert!(TaskConfig::from_json_file(&dir.path().join("missing.json")).is_err());

    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{"filter_mode": "fuzzy"}"#).unwrap();
    assert!(TaskConfig::from_json_file(&path).is_err());
}
