//! Command handlers, one module per command group.

pub mod contents;
pub mod init;
pub mod misc;
pub mod stores;
