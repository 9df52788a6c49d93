//! Filesystem Inventory
//!
//! Directory listings built from privileged shell output: command
//! composition, positional parsing, and the three-stage builder.

pub mod builder;
pub mod commands;
pub mod parse;
pub mod probe;

// Re-exports for convenience
pub use builder::InventoryBuilder;
pub use commands::{shell_quote, PositionalBatch, PLACEHOLDER};
pub use parse::{parse_child_count, parse_stat_size};
pub use probe::{FilesystemProbe, LocalFilesystem};
