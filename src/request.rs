//! Crawlable request model
//!
//! A `Request` is one unit of crawl work: method, parsed URL, headers, body and
//! the provenance tag telling where it was found. Identity for de-duplication is
//! a stable xxh3 digest over method, fragment-free URL and body.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use url::Url;
use xxhash_rust::xxh3::xxh3_64;

use crate::utils::url_utils::add_scheme_if_missing;

/// HTTP method of a crawl request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
}

impl Method {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" | "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "PATCH" => Ok(Self::Patch),
            other => Err(anyhow::anyhow!("Unsupported HTTP method: {other}")),
        }
    }
}

/// Where a request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestSource {
    Target,
    Robots,
    Fuzz,
    DomDiscovered,
    StaticDiscovered,
}

impl RequestSource {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Target => "target",
            Self::Robots => "robots",
            Self::Fuzz => "fuzz",
            Self::DomDiscovered => "dom-discovered",
            Self::StaticDiscovered => "static-discovered",
        }
    }
}

impl fmt::Display for RequestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One crawlable unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: String,
    pub source: RequestSource,
}

impl Request {
    #[must_use]
    pub fn new(method: Method, url: Url, source: RequestSource) -> Self {
        Self {
            method,
            url,
            headers: BTreeMap::new(),
            body: String::new(),
            source,
        }
    }

    /// GET request for an already parsed URL
    #[must_use]
    pub fn get(url: Url, source: RequestSource) -> Self {
        Self::new(Method::Get, url, source)
    }

    /// Parse `raw` as an absolute http(s) URL and build a GET request
    pub fn parse(raw: &str, source: RequestSource) -> Result<Self> {
        let url = Url::parse(raw).with_context(|| format!("Invalid URL: {raw}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("Unsupported scheme in {raw}");
        }
        Ok(Self::get(url, source))
    }

    /// Build a seed from user input, adding a scheme when it is missing
    pub fn parse_seed(input: &str) -> Result<Self> {
        Self::parse(&add_scheme_if_missing(input.trim()), RequestSource::Target)
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// URL without its fragment, as used for identity
    #[must_use]
    pub fn normalized_url(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.to_string()
    }

    /// Deterministic identity key over method, normalized URL and body
    #[must_use]
    pub fn unique_id(&self) -> String {
        let key = format!("{} {}\n{}", self.method, self.normalized_url(), self.body);
        format!("{:016x}", xxh3_64(key.as_bytes()))
    }

    /// Host including an explicit non-default port
    #[must_use]
    pub fn host_with_port(&self) -> String {
        let host = self.url.host_str().unwrap_or_default();
        match self.url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    /// Lower-cased extension of the final path segment, if any
    #[must_use]
    pub fn file_ext(&self) -> Option<String> {
        let last = self.url.path_segments()?.next_back()?;
        let (_, ext) = last.rsplit_once('.')?;
        if ext.is_empty() {
            None
        } else {
            Some(ext.to_ascii_lowercase())
        }
    }

    /// Copy of this request with http and https swapped
    #[must_use]
    pub fn with_flipped_scheme(&self) -> Option<Self> {
        let flipped = match self.url.scheme() {
            "http" => "https",
            "https" => "http",
            _ => return None,
        };
        let mut copy = self.clone();
        copy.url.set_scheme(flipped).ok()?;
        Some(copy)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
