//! Crawl Engine Module
//!
//! Budgeted, recursive crawl scheduling: admission control, the work queue and
//! its dispatcher, result aggregation and seed expansion.

pub mod budget;
pub mod crawl_types;
pub mod page_timeout;
pub mod results;
pub mod scheduler;
pub mod seed_expansion;
pub mod task_group;

pub use budget::{CrawlBudget, Rejection};
pub use crawl_types::{CrawlError, CrawlResult};
pub use page_timeout::{tab_timeout, with_page_timeout};
pub use results::{CrawlOutput, ResultCollector, root_domain};
pub use scheduler::CrawlTask;
pub use seed_expansion::{
    build_http_client, expand_fuzz_dict, expand_fuzz_pattern, fetch_robots_paths,
    paths_from_robots,
};
pub use task_group::{TaskGroup, TaskGuard};
