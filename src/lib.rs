//! Budgeted headless-browser crawling with scope filtering and URL shaping.
//!
//! A [`CrawlTask`] explores a target with a pool of browser tabs until its
//! crawl-count or wall-clock budget runs out, filtering every discovered
//! request through a [`RequestFilter`]. [`shape_urls`] then reduces merged
//! results to a short representative list.

pub mod browser;
pub mod config;
pub mod crawl_engine;
pub mod filter;
pub mod page_session;
pub mod request;
pub mod shaping;
pub mod utils;

pub use browser::{BrowserDriver, ChromiumBrowser, ChromiumOptions, DomNode, PageDriver};
pub use config::{FormKeywordRule, TaskConfig, TaskConfigBuilder};
pub use crawl_engine::{CrawlError, CrawlOutput, CrawlResult, CrawlTask};
pub use filter::{FilterMode, RequestFilter, SimpleFilter, SmartFilter, build_filter};
pub use page_session::{FormValueResolver, PageSession, SessionContext, SessionOutcome, SessionPhase};
pub use request::{Method, Request, RequestSource};
pub use shaping::{ShapingOptions, shape_urls, shape_urls_with};
pub use utils::{OutputNameError, validate_output_name};
