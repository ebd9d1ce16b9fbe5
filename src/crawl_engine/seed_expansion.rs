//! Seed expansion from robots.txt and fuzz dictionaries
//!
//! Each producer turns one seed into extra GET requests on the seed's origin.
//! They never fail a crawl: callers log the error and move on.

use anyhow::{Context, Result};
use log::debug;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::request::{Request, RequestSource};
use crate::utils::constants::CHROME_USER_AGENT;
use crate::utils::read_url_lines;

/// Paths tried when fuzzing without a dictionary
const FUZZ_PATTERN_PATHS: &[&str] = &[
    "admin", "api", "api/v1", "backup", "config", "console", "dashboard", "debug", "docs",
    "download", "files", "graphql", "login", "manage", "manager", "phpinfo.php", "portal",
    "register", "robots.txt", "search", "server-status", "sitemap.xml", "static", "status",
    "swagger", "swagger-ui.html", "test", "upload", "uploads", "user", "users", "wp-admin",
    "wp-login.php", ".git/config", ".env",
];

const ROBOTS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for seed expansion, honouring proxy and extra headers
pub fn build_http_client(proxy: Option<&str>, headers: &BTreeMap<String, String>) -> Result<Client> {
    let mut default_headers = HeaderMap::new();
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                default_headers.insert(name, value);
            }
            _ => debug!(target: "crawlscope::seeds", "Skipping invalid header {name}"),
        }
    }

    let mut builder = Client::builder()
        .user_agent(CHROME_USER_AGENT)
        .default_headers(default_headers)
        .timeout(ROBOTS_FETCH_TIMEOUT)
        .danger_accept_invalid_certs(true);
    if let Some(proxy) = proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy).context("Invalid proxy URL")?);
    }
    builder.build().context("Failed to build HTTP client")
}

fn join_on_origin(seed: &Url, path: &str) -> Option<Url> {
    let mut url = seed.join(&format!("/{}", path.trim_start_matches('/'))).ok()?;
    url.set_fragment(None);
    Some(url)
}

/// Requests for every `Allow`/`Disallow` path of a robots.txt body
#[must_use]
pub fn paths_from_robots(seed: &Url, body: &str) -> Vec<Request> {
    let mut seen = HashSet::new();
    body.lines()
        .filter_map(|line| {
            let line = line.split('#').next().unwrap_or_default().trim();
            let (key, value) = line.split_once(':')?;
            let key = key.trim().to_ascii_lowercase();
            if key != "allow" && key != "disallow" {
                return None;
            }
            let path = value.trim().replace('*', "");
            let path = path.trim_end_matches('$');
            if path.is_empty() || path == "/" {
                return None;
            }
            Some(path.to_string())
        })
        .filter(|path| seen.insert(path.clone()))
        .filter_map(|path| join_on_origin(seed, &path))
        .map(|url| Request::get(url, RequestSource::Robots))
        .collect()
}

/// Download `/robots.txt` of the seed's origin and extract its paths
pub async fn fetch_robots_paths(seed: &Url, client: &Client) -> Result<Vec<Request>> {
    let robots_url = seed.join("/robots.txt").context("Invalid robots.txt URL")?;
    let response = client
        .get(robots_url.as_str())
        .send()
        .await
        .with_context(|| format!("Failed to fetch {robots_url}"))?;
    if !response.status().is_success() {
        debug!(target: "crawlscope::seeds", "{robots_url} returned {}", response.status());
        return Ok(Vec::new());
    }
    let body = response
        .text()
        .await
        .with_context(|| format!("Failed to read {robots_url}"))?;
    let requests = paths_from_robots(seed, &body);
    debug!(target: "crawlscope::seeds", "robots.txt yielded {} paths", requests.len());
    Ok(requests)
}

/// One request per dictionary line, resolved on the seed's origin
pub async fn expand_fuzz_dict(seed: &Url, dict_path: &Path) -> Result<Vec<Request>> {
    let lines = read_url_lines(dict_path)
        .await
        .with_context(|| format!("Failed to load fuzz dictionary {}", dict_path.display()))?;
    Ok(fuzz_requests(seed, lines.iter().map(String::as_str)))
}

/// Requests for the built-in list of common paths
#[must_use]
pub fn expand_fuzz_pattern(seed: &Url) -> Vec<Request> {
    fuzz_requests(seed, FUZZ_PATTERN_PATHS.iter().copied())
}

fn fuzz_requests<'a>(seed: &Url, paths: impl Iterator<Item = &'a str>) -> Vec<Request> {
    let mut seen = HashSet::new();
    paths
        .map(str::trim)
        .filter(|p| !p.is_empty() && !p.starts_with('#'))
        .filter_map(|p| join_on_origin(seed, p))
        .filter(|url| seen.insert(url.to_string()))
        .map(|url| Request::get(url, RequestSource::Fuzz))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn robots_paths_are_cleaned() {
        let seed = Url::parse("https://example.com/app/index").unwrap();
        let body = "User-agent: *\nDisallow: /admin/*\nAllow: /public$\nDisallow: /\nDisallow: /admin/\n# Disallow: /hidden\nSitemap: https://example.com/s.xml";
        let urls: Vec<String> = paths_from_robots(&seed, body)
            .into_iter()
            .map(|r| r.url.to_string())
            .collect();
        assert_eq!(
            urls,
            vec!["https://example.com/admin/", "https://example.com/public"]
        );
    }

    #[test]
    fn fuzz_pattern_stays_on_origin() {
        let seed = Url::parse("http://example.com:8080/x/y").unwrap();
        let reqs = expand_fuzz_pattern(&seed);
        assert!(!reqs.is_empty());
        assert!(reqs.iter().all(|r| r.url.host_str() == Some("example.com")
            && r.url.port() == Some(8080)
            && r.source == RequestSource::Fuzz));
    }
}
