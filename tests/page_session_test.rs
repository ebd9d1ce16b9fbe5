//! Page session phases and form autofill against a scripted page

use crawlscope::page_session::{PageSession, SessionContext, SessionPhase};
use crawlscope::{DomNode, FormValueResolver, Method, Request, RequestSource, TaskConfig};
use std::collections::BTreeMap;
use serde_json::Value;
use std::path::PathBuf;
use std::time::{Duration, Instant};

mod common;
use common::FakeBrowser;

fn context() -> SessionContext {
    let config = TaskConfig::builder()
        .upload_file_path("/tmp/crawlscope-upload.png")
        .build()
        .unwrap();
    SessionContext {
        resolver: FormValueResolver::from_config(&config),
        headers: BTreeMap::new(),
        upload_file: config.upload_file_path(),
        page_load_timeout: Duration::from_secs(1),
        dom_content_loaded_timeout: Duration::from_millis(100),
        event_trigger_interval: Duration::ZERO,
        before_exit_delay: Duration::ZERO,
        encode_url_with_charset: false,
    }
}

fn request(url: &str) -> Request {
    Request::parse(url, RequestSource::Target).unwrap()
}

fn form_nodes() -> BTreeMap<String, Vec<DomNode>> {
    let mut nodes = BTreeMap::new();
    nodes.insert(
        "input".to_string(),
        vec![
            DomNode::new(10).with_attribute("name", "email_addr"),
            DomNode::new(11).with_attribute("type", "checkbox"),
            DomNode::new(12).with_attribute("type", "file"),
            DomNode::new(13).with_attribute("type", "submit"),
            DomNode::new(14).with_attribute("type", "password"),
        ],
    );
    nodes.insert("textarea".to_string(), vec![DomNode::new(20)]);
    nodes.insert(
        "select option:first-child".to_string(),
        vec![DomNode::new(30)],
    );
    nodes
}

#[tokio::test]
async fn test_session_fills_forms_and_collects_links() {
    let html = r#"<html><body>
        <a href="/static-link">x</a>
        <img src="/logo.png">
        <form action="/login" method="post"><input name="user"></form>
    </body></html>"#;
    let browser = FakeBrowser::page_with(html, vec!["/dom-link".to_string()], form_nodes());
    let page = browser.page();
    let req = request("http://example.com/start");
    let ctx = context();

    let outcome = PageSession::new(&page, &req, &ctx).run().await;
    assert_eq!(outcome.phase, SessionPhase::Finished);

    let recorded = browser.recorded();
    assert_eq!(recorded.navigations, vec!["http://example.com/start"]);
    assert!(recorded
        .send_keys
        .contains(&(10, "crawlscope@example.com".to_string())));
    assert!(recorded.set_attributes.contains(&(
        10,
        "value".to_string(),
        "crawlscope@example.com".to_string()
    )));
    assert!(recorded
        .set_attributes
        .contains(&(11, "checked".to_string(), "true".to_string())));
    assert!(recorded.removed_attributes.contains(&(12, "accept".to_string())));
    assert!(recorded.removed_attributes.contains(&(12, "required".to_string())));
    assert_eq!(
        recorded.uploads,
        vec![(12, PathBuf::from("/tmp/crawlscope-upload.png"))]
    );
    assert!(!recorded.send_keys.iter().any(|(id, _)| *id == 13));
    assert!(recorded.send_keys.contains(&(14, "Crawlscope6.".to_string())));
    assert!(recorded.send_keys.contains(&(20, "crawlscope".to_string())));
    assert!(recorded
        .set_attributes
        .contains(&(30, "selected".to_string(), "true".to_string())));
    // Attributes alone don't change what the live form submits
    assert!(recorded
        .set_properties
        .contains(&(30, "selected".to_string(), Value::Bool(true))));
    assert!(recorded
        .set_properties
        .contains(&(20, "value".to_string(), Value::from("crawlscope"))));

    let dom: Vec<_> = outcome
        .discovered
        .iter()
        .filter(|r| r.source == RequestSource::DomDiscovered)
        .map(|r| r.url.as_str())
        .collect();
    assert_eq!(dom, vec!["http://example.com/dom-link"]);

    let statics: Vec<_> = outcome
        .discovered
        .iter()
        .filter(|r| r.source == RequestSource::StaticDiscovered)
        .collect();
    assert!(statics
        .iter()
        .any(|r| r.url.as_str() == "http://example.com/static-link"));
    let login = statics
        .iter()
        .find(|r| r.url.path() == "/login")
        .expect("form request");
    assert_eq!(login.method, Method::Post);
    assert_eq!(login.body, "user=crawlscope%40example.com");
}

#[tokio::test]
async fn test_session_without_body_ends_early() {
    let browser = FakeBrowser::without_body();
    let page = browser.page();
    let req = request("http://example.com/");
    let ctx = context();

    let outcome = PageSession::new(&page, &req, &ctx).run().await;
    assert_eq!(outcome.phase, SessionPhase::ResolveRoot);
    assert!(outcome.discovered.is_empty());
    assert!(browser.recorded().send_keys.is_empty());
}

#[tokio::test]
async fn test_request_headers_override_task_headers() {
    let browser = FakeBrowser::with_links(|_| Vec::new());
    let page = browser.page();
    let mut ctx = context();
    ctx.headers.insert("Cookie".into(), "task".into());
    ctx.headers.insert("X-Task".into(), "1".into());
    let mut req_headers = BTreeMap::new();
    req_headers.insert("Cookie".to_string(), "request".to_string());
    let req = request("http://example.com/").with_headers(req_headers);

    PageSession::new(&page, &req, &ctx).run().await;

    let sent = &browser.recorded().headers[0];
    assert_eq!(sent.get("Cookie").map(String::as_str), Some("request"));
    assert_eq!(sent.get("X-Task").map(String::as_str), Some("1"));
}

#[tokio::test]
async fn test_hanging_body_lookup_is_cut_off() {
    let browser = FakeBrowser::with_links(|_| Vec::new());
    browser.delay_queries("body", Duration::from_secs(30));
    let page = browser.page();
    let req = request("http://example.com/");
    let ctx = context();

    let started = Instant::now();
    let outcome = PageSession::new(&page, &req, &ctx).run().await;

    assert_eq!(outcome.phase, SessionPhase::ResolveRoot);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_hanging_form_lookup_does_not_block_other_fields() {
    let browser = FakeBrowser::page_with("", Vec::new(), form_nodes());
    browser.delay_queries("input", Duration::from_secs(30));
    let page = browser.page();
    let req = request("http://example.com/");
    let ctx = context();

    let started = Instant::now();
    let outcome = PageSession::new(&page, &req, &ctx).run().await;

    assert_eq!(outcome.phase, SessionPhase::Finished);
    assert!(started.elapsed() < Duration::from_secs(5));
    let recorded = browser.recorded();
    assert!(!recorded.send_keys.iter().any(|(id, _)| *id == 10));
    assert!(recorded.send_keys.contains(&(20, "crawlscope".to_string())));
}
