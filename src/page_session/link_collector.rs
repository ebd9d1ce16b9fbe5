//! Turning rendered pages into discovered requests
//!
//! Two sources feed a session's discoveries: the URL list returned by
//! `COLLECT_LINKS_SCRIPT` (live DOM plus observer records) and a static parse
//! of the rendered HTML, which also turns `<form>` elements into requests.

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use url::{Url, form_urlencoded};

use super::form_fill::{FormValueResolver, InputAction, TEXTAREA_LOOKUP_KEY, classify_input};
use crate::browser::DomNode;
use crate::request::{Method, Request, RequestSource};

static HREF_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href], area[href], link[href], base[href]")
        .expect("BUG: hardcoded CSS selector for href links is invalid")
});

static SRC_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("iframe[src], frame[src], script[src], embed[src]")
        .expect("BUG: hardcoded CSS selector for src links is invalid")
});

static FORM_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("form").expect("BUG: hardcoded CSS selector 'form' is invalid")
});

static FIELD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("input[name], textarea[name], select[name]")
        .expect("BUG: hardcoded CSS selector for form fields is invalid")
});

static OPTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("option").expect("BUG: hardcoded CSS selector 'option' is invalid")
});

/// Resolve `raw` against `base`, keeping only http(s) targets without fragment
#[must_use]
pub fn resolve_link(base: &Url, raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }
    let lower = raw.to_ascii_lowercase();
    if ["javascript:", "mailto:", "data:", "tel:", "about:", "blob:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }
    let mut url = base.join(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// Re-serialize the query string through form encoding so every reserved or
/// non-ASCII byte is percent-encoded the same way
pub fn encode_url_with_charset(url: &mut Url) {
    if url.query().is_none_or(str::is_empty) {
        return;
    }
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    url.query_pairs_mut().clear().extend_pairs(pairs);
}

fn finish(mut url: Url, encode: bool) -> Url {
    if encode {
        encode_url_with_charset(&mut url);
    }
    url
}

/// Requests from the JSON array produced by `COLLECT_LINKS_SCRIPT`
#[must_use]
pub fn requests_from_dom_links(value: &Value, base: &Url, encode: bool) -> Vec<Request> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_str)
        .filter_map(|raw| resolve_link(base, raw))
        .map(|url| Request::get(finish(url, encode), RequestSource::DomDiscovered))
        .collect()
}

/// Requests found by statically parsing rendered HTML
#[must_use]
pub fn parse_static_links(
    html: &str,
    base: &Url,
    resolver: &FormValueResolver,
    encode: bool,
) -> Vec<Request> {
    let document = Html::parse_document(html);
    let mut requests = Vec::new();

    let links = document
        .select(&HREF_SELECTOR)
        .filter_map(|el| el.value().attr("href"))
        .chain(
            document
                .select(&SRC_SELECTOR)
                .filter_map(|el| el.value().attr("src")),
        );
    for raw in links {
        if let Some(url) = resolve_link(base, raw) {
            requests.push(Request::get(
                finish(url, encode),
                RequestSource::StaticDiscovered,
            ));
        }
    }

    for form in document.select(&FORM_SELECTOR) {
        if let Some(req) = form_request(form, base, resolver, encode) {
            requests.push(req);
        }
    }

    requests
}

fn form_request(
    form: ElementRef<'_>,
    base: &Url,
    resolver: &FormValueResolver,
    encode: bool,
) -> Option<Request> {
    let action = form.value().attr("action").unwrap_or_default();
    let mut url = if action.trim().is_empty() {
        let mut url = base.clone();
        url.set_fragment(None);
        url
    } else {
        resolve_link(base, action)?
    };
    let method = match form.value().attr("method") {
        Some(m) if m.eq_ignore_ascii_case("post") => Method::Post,
        _ => Method::Get,
    };

    let fields: Vec<(String, String)> = form
        .select(&FIELD_SELECTOR)
        .filter_map(|field| form_field(field, resolver))
        .collect();

    match method {
        Method::Post => {
            let body = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&fields)
                .finish();
            let mut headers = BTreeMap::new();
            headers.insert(
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            );
            Some(
                Request::new(
                    Method::Post,
                    finish(url, encode),
                    RequestSource::StaticDiscovered,
                )
                .with_headers(headers)
                .with_body(body),
            )
        }
        _ => {
            if !fields.is_empty() {
                url.query_pairs_mut().clear().extend_pairs(&fields);
            }
            Some(Request::get(
                finish(url, encode),
                RequestSource::StaticDiscovered,
            ))
        }
    }
}

fn form_field(field: ElementRef<'_>, resolver: &FormValueResolver) -> Option<(String, String)> {
    let element = field.value();
    let name = element.attr("name")?.to_string();
    let preset = element.attr("value").filter(|v| !v.is_empty());

    let value = match element.name() {
        "textarea" => resolver.resolve(TEXTAREA_LOOKUP_KEY),
        "select" => field
            .select(&OPTION_SELECTOR)
            .next()
            .map(|opt| {
                opt.value()
                    .attr("value")
                    .map_or_else(|| opt.text().collect::<String>(), str::to_string)
            })
            .unwrap_or_default(),
        _ => {
            let node = element
                .attrs()
                .fold(DomNode::default(), |node, (k, v)| {
                    node.with_attribute(k.to_ascii_lowercase(), v)
                });
            match (classify_input(&node), preset) {
                (InputAction::Fill(_) | InputAction::Check, Some(preset)) => preset.to_string(),
                (InputAction::Fill(key), None) => resolver.resolve(&key),
                (InputAction::Check, None) => "on".to_string(),
                (InputAction::Upload, _) => return None,
                (InputAction::Skip, preset) => {
                    match node.attr("type").to_ascii_lowercase().as_str() {
                        "submit" | "hidden" => preset.unwrap_or_default().to_string(),
                        _ => return None,
                    }
                }
            }
        }
    };
    Some((name, value))
}
