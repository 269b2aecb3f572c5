//! Output formatting helpers for the CLI.
//!
//! This module provides formatting utilities for displaying stores and
//! their contents as JSON or as plain text and tables.

mod json;
mod text;

// Re-export public API
pub use json::{database_json, store_summary_json};
pub use text::{print_database, store_table};

/// Shown in place of an entry password unless `--reveal` is given.
pub const MASK: &str = "********";

/// First eight characters of an id, enough to select it by prefix.
pub fn short_id(id: &uuid::Uuid) -> String {
    id.to_string()[..8].to_string()
}
