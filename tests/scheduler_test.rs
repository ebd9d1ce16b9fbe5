//! Crawl scheduling against a scripted browser

use crawlscope::{CrawlError, CrawlTask, FilterMode, Request, RequestSource};
use std::time::{Duration, Instant};

mod common;
use common::{FakeBrowser, fast_config};

fn seed(url: &str) -> Request {
    Request::parse_seed(url).unwrap()
}

#[tokio::test]
async fn test_budget_caps_page_sessions() {
    let browser = FakeBrowser::with_links(|_| {
        (0..100)
            .map(|i| format!("http://example.com/page{i}"))
            .collect()
    });
    let config = fast_config()
        .filter_mode(FilterMode::Simple)
        .max_crawl_count(5)
        .max_tabs_count(3)
        .build()
        .unwrap();

    let task = CrawlTask::with_browser(vec![seed("http://example.com/")], config, browser.clone())
        .unwrap();
    let output = task.run().await.unwrap();

    assert_eq!(browser.pages_opened(), 5);
    assert_eq!(browser.pages_closed(), 5);
    assert_eq!(browser.browser_closes(), 1);
    // Every discovered link is still reported even though only five ran
    assert!(output.req_list.len() > 5);
}

#[tokio::test]
async fn test_single_seed_gets_scheme_twin() {
    let browser = FakeBrowser::with_links(|_| Vec::new());
    let config = fast_config().build().unwrap();

    let task = CrawlTask::with_browser(vec![seed("example.com")], config, browser.clone()).unwrap();
    let urls: Vec<String> = task.targets().iter().map(|r| r.url.to_string()).collect();
    assert_eq!(urls, vec!["https://example.com/", "http://example.com/"]);
    assert!(task.targets().iter().all(|r| r.source == RequestSource::Target));
    assert_eq!(task.scope_host(), "example.com");

    let output = task.run().await.unwrap();
    assert_eq!(browser.pages_opened(), 2);
    assert_eq!(output.req_list.len(), 2);
}

#[tokio::test]
async fn test_no_targets_is_an_error() {
    let config = fast_config().build().unwrap();
    let result = CrawlTask::with_browser(Vec::new(), config, FakeBrowser::with_links(|_| Vec::new()));
    assert!(matches!(result, Err(CrawlError::NoTargets)));
}

#[tokio::test]
async fn test_malformed_header_json_is_a_config_error() {
    let config = fast_config().extra_headers_json("{not json").build().unwrap();
    let result = CrawlTask::with_browser(
        vec![seed("http://example.com/")],
        config,
        FakeBrowser::with_links(|_| Vec::new()),
    );
    assert!(matches!(result, Err(CrawlError::Config(_))));
}

#[tokio::test]
async fn test_ignored_links_are_kept_but_not_crawled() {
    let browser = FakeBrowser::with_links(|url| {
        if url == "http://example.com/" {
            vec![
                "/account/logout".to_string(),
                "/about".to_string(),
                "http://other.example.org/outside".to_string(),
            ]
        } else {
            Vec::new()
        }
    });
    let config = fast_config()
        .filter_mode(FilterMode::Simple)
        .ignore_keywords(["logout"])
        .build()
        .unwrap();

    let task = CrawlTask::with_browser(
        vec![seed("http://example.com/"), seed("http://example.com/start")],
        config,
        browser.clone(),
    )
    .unwrap();
    let output = task.run().await.unwrap();

    let kept = output.kept_urls();
    assert!(kept.contains(&"http://example.com/account/logout".to_string()));
    assert!(kept.contains(&"http://example.com/about".to_string()));
    assert!(!kept.iter().any(|u| u.contains("other.example.org")));

    let navigations = browser.recorded().navigations;
    assert!(navigations.contains(&"http://example.com/about".to_string()));
    assert!(!navigations.iter().any(|u| u.contains("logout")));

    // Out-of-scope links still show up in the domain summaries
    assert!(output.all_domain_list.contains(&"other.example.org".to_string()));
}

#[tokio::test]
async fn test_smart_mode_collapses_identifier_paths() {
    let browser = FakeBrowser::with_links(|url| {
        if url == "http://example.com/" {
            (1..=10)
                .map(|i| format!("http://example.com/item/{i}"))
                .collect()
        } else {
            Vec::new()
        }
    });
    let config = fast_config()
        .filter_mode(FilterMode::Smart)
        .max_crawl_count(50)
        .build()
        .unwrap();

    let task = CrawlTask::with_browser(
        vec![seed("http://example.com/"), seed("http://example.com/x")],
        config,
        browser.clone(),
    )
    .unwrap();
    let output = task.run().await.unwrap();

    let items: Vec<_> = output
        .kept_urls()
        .into_iter()
        .filter(|u| u.contains("/item/"))
        .collect();
    assert_eq!(items, vec!["http://example.com/item/1"]);
    assert_eq!(browser.pages_opened(), 3);
}

#[tokio::test]
async fn test_extra_headers_reach_every_page() {
    let browser = FakeBrowser::with_links(|_| Vec::new());
    let config = fast_config()
        .extra_headers_json(r#"{"Cookie": "sid=1", "X-Trace": 7}"#)
        .build()
        .unwrap();

    let task = CrawlTask::with_browser(vec![seed("http://example.com/")], config, browser.clone())
        .unwrap();
    task.run().await.unwrap();

    let headers = browser.recorded().headers;
    assert_eq!(headers.len(), 2);
    for set in headers {
        assert_eq!(set.get("Cookie").map(String::as_str), Some("sid=1"));
        assert_eq!(set.get("X-Trace").map(String::as_str), Some("7"));
    }
}

/// Every page links to five deeper pages, so the crawl never runs dry
fn endless_site() -> FakeBrowser {
    let browser = FakeBrowser::with_links(|url| {
        (0..5)
            .map(|i| format!("{}/n{i}", url.trim_end_matches('/')))
            .collect()
    });
    browser.delay_queries("body", Duration::from_millis(200));
    browser
}

#[tokio::test]
async fn test_no_session_starts_after_run_time() {
    let browser = endless_site();
    let config = fast_config()
        .filter_mode(FilterMode::Simple)
        .max_crawl_count(1000)
        .max_tabs_count(3)
        .max_run_time(1)
        .build()
        .unwrap();

    let started = Instant::now();
    let task = CrawlTask::with_browser(vec![seed("http://example.com/")], config, browser.clone())
        .unwrap();
    task.run().await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_secs(3), "crawl ran {elapsed:?}");
    assert!(browser.pages_opened() > 3);
    let deadline = started + Duration::from_millis(1100);
    for opened in browser.opened_at() {
        assert!(opened <= deadline);
    }
    assert_eq!(browser.pages_opened(), browser.pages_closed());
}

#[tokio::test]
async fn test_open_tabs_never_exceed_limit() {
    let browser = endless_site();
    let config = fast_config()
        .filter_mode(FilterMode::Simple)
        .max_crawl_count(20)
        .max_tabs_count(3)
        .build()
        .unwrap();

    let task = CrawlTask::with_browser(vec![seed("http://example.com/")], config, browser.clone())
        .unwrap();
    task.run().await.unwrap();

    assert_eq!(browser.pages_opened(), 20);
    assert!(browser.max_live_pages() <= 3);
    assert!(browser.max_live_pages() > 1);
}

#[tokio::test]
async fn test_saturated_queue_drops_work_and_still_drains() {
    let browser = FakeBrowser::with_links(|url| {
        if url == "http://example.com/" {
            (0..50)
                .map(|i| format!("http://example.com/p{i}"))
                .collect()
        } else {
            Vec::new()
        }
    });
    let config = fast_config()
        .filter_mode(FilterMode::Simple)
        .max_tabs_count(1)
        .queue_capacity(1)
        .build()
        .unwrap();

    let task = CrawlTask::with_browser(
        vec![seed("http://example.com/"), seed("http://example.com/start")],
        config,
        browser.clone(),
    )
    .unwrap();
    let output = tokio::time::timeout(Duration::from_secs(10), task.run())
        .await
        .expect("crawl must drain when submissions are rejected")
        .unwrap();

    // Rejected submissions are still reported
    assert_eq!(output.req_list.len(), 52);
    assert!(browser.pages_opened() >= 1);
    assert!(browser.pages_opened() < 52);
    assert_eq!(browser.browser_closes(), 1);
}
