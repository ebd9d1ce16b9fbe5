//! Error types for crawl tasks

use thiserror::Error;

/// Result type alias for crawl operations
pub type CrawlResult<T> = Result<T, CrawlError>;

/// Error types for crawl operations
#[derive(Debug, Clone, Error)]
pub enum CrawlError {
    /// Invalid configuration, including malformed extra headers
    #[error("Configuration error: {0}")]
    Config(String),

    /// No seed URL was supplied
    #[error("No crawl targets were provided")]
    NoTargets,

    /// Browser launch or connection failed
    #[error("Browser error: {0}")]
    Browser(String),

    /// Work queue is full
    #[error("Crawl queue is saturated")]
    PoolSaturated,

    /// Work queue no longer accepts jobs
    #[error("Crawl queue is closed")]
    PoolClosed,

    /// Other errors
    #[error("Crawl error: {0}")]
    Other(String),
}

impl From<anyhow::Error> for CrawlError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} keeps the context chain
        Self::Other(format!("{err:#}"))
    }
}
