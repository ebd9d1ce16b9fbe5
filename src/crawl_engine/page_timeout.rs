//! Timeout wrapper for page sessions

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// Run `operation` bounded by `timeout`.
///
/// Distinguishes a timeout from the operation's own failure in the error text.
pub async fn with_page_timeout<F, T>(operation: F, timeout: Duration, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "{operation_name} timeout after {:.1} seconds",
            timeout.as_secs_f64()
        )),
    }
}

/// Bound for one page session: the configured timeout, cut to what is left of the run
#[must_use]
pub fn tab_timeout(configured: Duration, remaining: Duration) -> Duration {
    configured.min(remaining)
}
