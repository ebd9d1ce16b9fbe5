//! Result aggregation for one crawl task

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::net::IpAddr;

use crate::filter::SimpleFilter;
use crate::request::Request;

/// Registry labels that sit between a two-letter TLD and the registrable name
const SECOND_LEVEL_LABELS: &[&str] = &["co", "com", "net", "org", "gov", "edu", "ac"];

/// Final result of a crawl task
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlOutput {
    /// In-scope requests that survived the filter
    pub req_list: Vec<Request>,
    /// Every request seen, de-duplicated by identity
    pub all_req_list: Vec<Request>,
    pub all_domain_list: Vec<String>,
    pub sub_domain_list: Vec<String>,
}

impl CrawlOutput {
    /// URLs of the kept requests, in collection order
    #[must_use]
    pub fn kept_urls(&self) -> Vec<String> {
        self.req_list.iter().map(|r| r.url.to_string()).collect()
    }
}

#[derive(Debug, Default)]
struct ResultLists {
    req_list: Vec<Request>,
    all_req_list: Vec<Request>,
}

/// Lists shared by every page session of a task, behind one lock
#[derive(Debug, Default)]
pub struct ResultCollector {
    lists: Mutex<ResultLists>,
}

impl ResultCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_all<I: IntoIterator<Item = Request>>(&self, reqs: I) {
        self.lists.lock().all_req_list.extend(reqs);
    }

    pub fn push_kept(&self, req: Request) {
        self.lists.lock().req_list.push(req);
    }

    /// Drain the lists, collapse duplicate discoveries and compute domain
    /// summaries against the root domain of `scope_host`
    #[must_use]
    pub fn finish(&self, scope_host: &str) -> CrawlOutput {
        let lists = std::mem::take(&mut *self.lists.lock());

        let unique = SimpleFilter::unscoped();
        let all_req_list: Vec<Request> = lists
            .all_req_list
            .into_iter()
            .filter(|req| !unique.unique_filter(req))
            .collect();

        let root = root_domain(scope_host);
        let mut seen = HashSet::new();
        let all_domain_list: Vec<String> = all_req_list
            .iter()
            .filter_map(|req| req.url.host_str())
            .map(str::to_ascii_lowercase)
            .filter(|host| seen.insert(host.clone()))
            .collect();
        let sub_domain_list = all_domain_list
            .iter()
            .filter(|host| is_subdomain_of(host, &root))
            .cloned()
            .collect();

        CrawlOutput {
            req_list: lists.req_list,
            all_req_list,
            all_domain_list,
            sub_domain_list,
        }
    }
}

/// Registrable part of a hostname, e.g. `example.co.uk` for `a.b.example.co.uk`
#[must_use]
pub fn root_domain(host: &str) -> String {
    let host = host
        .rsplit_once(':')
        .filter(|(_, port)| port.chars().all(|c| c.is_ascii_digit()))
        .map_or(host, |(h, _)| h)
        .trim_end_matches('.')
        .to_ascii_lowercase();
    if host.trim_matches(['[', ']']).parse::<IpAddr>().is_ok() {
        return host;
    }
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host;
    }
    let tld = labels[labels.len() - 1];
    let second = labels[labels.len() - 2];
    let keep = if tld.len() == 2 && SECOND_LEVEL_LABELS.contains(&second) {
        3
    } else {
        2
    };
    labels[labels.len().saturating_sub(keep)..].join(".")
}

fn is_subdomain_of(host: &str, root: &str) -> bool {
    !root.is_empty() && (host == root || host.ends_with(&format!(".{root}")))
}
