//! Configuration module for crawl tasks
//!
//! This module provides the `TaskConfig` struct, its fluent builder with
//! validation, and read accessors used by the engine.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod types;

// Re-exports for public API
pub use builder::TaskConfigBuilder;
pub use types::{FormKeywordRule, TaskConfig};
