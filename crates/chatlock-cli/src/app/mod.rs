//! Application-level utilities for the Chatlock CLI.
//!
//! This module provides:
//! - Application context for unified CLI + config handling
//! - Path resolution for the config file, vault database and view documents

mod context;
mod resolver;

// Re-export public API
pub use context::AppContext;
pub use resolver::{resolve_config_path, resolve_store_path};
