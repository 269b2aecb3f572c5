//! Application-level utilities for the Strongbox CLI.
//!
//! This module provides:
//! - Application context for unified CLI + config handling
//! - Path resolution for config and store directories
//! - Store lookup by name or id
//! - Password handling with retry logic

mod context;
mod passphrase;
mod resolver;

// Re-export public API
pub use context::AppContext;
pub use passphrase::prompt_new_passphrase;
pub use resolver::resolve_config_path;
