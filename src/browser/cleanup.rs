//! Browser teardown
//!
//! Order matters: close the browser while the CDP handler is still running,
//! wait for the process, remove the profile directory, then stop the handler.

use chromiumoxide::Browser;
use log::{debug, warn};
use std::path::PathBuf;
use tokio::task::JoinHandle;

/// Result of cleanup operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupResult {
    /// All cleanup operations succeeded
    Success,
    /// Some cleanup operations failed, with error details
    PartialFailure(Vec<String>),
}

/// Close a launched browser and remove its profile directory
pub async fn cleanup_browser_and_data(
    browser: &mut Browser,
    chrome_data_dir: Option<PathBuf>,
    handler_task: Option<JoinHandle<()>>,
) -> CleanupResult {
    let mut errors = Vec::new();

    debug!(target: "crawlscope::cleanup", "Closing browser");
    if let Err(e) = browser.close().await {
        warn!(target: "crawlscope::cleanup", "Failed to close browser: {e}");
        errors.push(format!("Browser close failed: {e}"));
    }

    debug!(target: "crawlscope::cleanup", "Waiting for browser process to exit");
    if let Err(e) = browser.wait().await {
        warn!(target: "crawlscope::cleanup", "Failed to wait for browser exit: {e}");
        errors.push(format!("Browser wait failed: {e}"));
    }

    if let Some(dir) = chrome_data_dir {
        debug!(target: "crawlscope::cleanup", "Removing profile directory {}", dir.display());
        if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
            warn!(target: "crawlscope::cleanup", "Failed to remove profile directory: {e}");
            errors.push(format!("Directory cleanup failed: {e}"));
        }
    }

    abort_handler(handler_task).await;

    if errors.is_empty() {
        CleanupResult::Success
    } else {
        CleanupResult::PartialFailure(errors)
    }
}

/// Stop the CDP handler task of a browser we only attached to
pub async fn abort_handler(handler_task: Option<JoinHandle<()>>) {
    let Some(handler_task) = handler_task else {
        return;
    };
    handler_task.abort();
    if let Err(e) = handler_task.await
        && !e.is_cancelled()
    {
        warn!(target: "crawlscope::cleanup", "Handler task failed during abort: {e}");
    }
}
