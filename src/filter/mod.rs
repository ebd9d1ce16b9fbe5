//! Request filter pipeline
//!
//! Every discovered request passes through a `RequestFilter` before it is
//! reported or followed. `SimpleFilter` enforces scope, uniqueness and static
//! resource rules; `SmartFilter` wraps it and additionally collapses
//! structurally identical paths.

pub mod keywords;
pub mod shape;
pub mod simple;
pub mod smart;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::request::Request;

pub use keywords::is_ignored_by_keywords;
pub use shape::{SegmentShape, path_shape, shape_key};
pub use simple::SimpleFilter;
pub use smart::SmartFilter;

/// Keep/drop decision for a request. `true` means drop.
///
/// Implementations are shared by every page session of a run and must be safe
/// to call concurrently.
pub trait RequestFilter: Send + Sync {
    fn do_filter(&self, req: &Request) -> bool;
}

impl<F: RequestFilter + ?Sized> RequestFilter for Arc<F> {
    fn do_filter(&self, req: &Request) -> bool {
        (**self).do_filter(req)
    }
}

/// Which filter variant a crawl task runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    Simple,
    #[default]
    Smart,
    Strict,
}

impl FromStr for FilterMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "smart" => Ok(Self::Smart),
            "strict" => Ok(Self::Strict),
            other => Err(anyhow::anyhow!(
                "Unknown filter mode '{other}', expected simple, smart or strict"
            )),
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Simple => "simple",
            Self::Smart => "smart",
            Self::Strict => "strict",
        })
    }
}

/// Build the configured filter for a run scoped to `scope_host`
#[must_use]
pub fn build_filter(mode: FilterMode, scope_host: &str) -> Arc<dyn RequestFilter> {
    let simple = SimpleFilter::new(scope_host);
    match mode {
        FilterMode::Simple => Arc::new(simple),
        FilterMode::Smart => Arc::new(SmartFilter::new(simple, false)),
        FilterMode::Strict => Arc::new(SmartFilter::new(simple, true)),
    }
}
