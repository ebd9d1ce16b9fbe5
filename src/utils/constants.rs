//! Shared configuration constants for crawlscope
//!
//! Default values and fixed bounds used throughout the codebase to ensure
//! consistency and avoid magic numbers.

use std::time::Duration;

/// Default cap on admitted page sessions per crawl task
pub const DEFAULT_MAX_CRAWL_COUNT: usize = 200;

/// Default number of page sessions running at once
pub const DEFAULT_MAX_TABS_COUNT: usize = 8;

/// Default bound on a single page session
pub const DEFAULT_TAB_RUN_TIMEOUT: Duration = Duration::from_secs(20);

/// Default wall-clock budget for a whole crawl task, in seconds
pub const DEFAULT_MAX_RUN_TIME_SECS: u64 = 3600;

/// Default bound on waiting for `DOMContentLoaded`
pub const DEFAULT_DOM_CONTENT_LOADED_TIMEOUT: Duration = Duration::from_secs(5);

/// Default pause between triggered DOM events
pub const DEFAULT_EVENT_TRIGGER_INTERVAL: Duration = Duration::from_millis(100);

/// Default pause before links are collected from a page
pub const DEFAULT_BEFORE_EXIT_DELAY: Duration = Duration::from_secs(1);

/// Default bound on `page.goto()`
pub const DEFAULT_PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Bound on resolving the document body after DOM ready
pub const ROOT_ELEMENT_TIMEOUT: Duration = Duration::from_secs(3);

/// Bound on the existence check that precedes each form-fill job
pub const FORM_ELEMENT_TIMEOUT: Duration = Duration::from_secs(2);

/// Fallback bound on mutating a single form element
pub const FORM_MUTATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Keywords that mark a link as dangerous to follow
pub const DEFAULT_IGNORE_KEYWORDS: &[&str] = &["logout", "quit", "exit"];

/// Value used for text fields nothing else matches
pub const DEFAULT_FORM_VALUE: &str = "crawlscope";

/// Number of URLs kept by the shaping step
pub const SHAPED_URL_LIMIT: usize = 25;

/// Chrome user agent string sent by launched browsers
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Extensions dropped by every filter mode
pub const STATIC_SUFFIXES: &[&str] = &[
    "png", "gif", "jpg", "jpeg", "mp4", "mp3", "mng", "pct", "bmp", "pst", "psp", "ttf", "tif",
    "tiff", "ai", "drw", "wma", "ogg", "wav", "ra", "aac", "mid", "au", "aiff", "dxf", "eps",
    "ps", "svg", "3gp", "asf", "asx", "avi", "mov", "mpg", "qt", "rm", "wmv", "m4a", "bin",
    "xls", "xlsx", "ppt", "pptx", "doc", "docx", "odt", "ods", "odg", "odp", "exe", "zip", "rar",
    "tar", "gz", "iso", "rss", "pdf", "txt", "dll", "ico", "gz2", "apk", "crt", "woff", "map",
    "woff2", "webp", "less", "dmg", "bz2", "otf", "swf", "flv", "mpeg", "dat", "xsl", "csv",
    "cab", "exif", "wps", "m4v", "rmvb",
];

/// Extra extensions dropped once structural filtering is on
pub const SCRIPT_SUFFIXES: &[&str] = &["js", "css", "json"];

/// Upper bound on inline event handlers fired per page
pub const MAX_TRIGGERED_EVENTS: usize = 200;
