//! Core data models for rootops
//!
//! This module contains the data structures exchanged between the shell
//! session, the pipeline executor, the inventory builder and the remounter.

pub mod command;
pub mod inventory_entry;
pub mod mount_record;
pub mod shell_process;

// Re-exports for convenience
pub use command::{CommandRequest, CommandResult, COMMAND_SEPARATOR};
pub use inventory_entry::InventoryEntry;
pub use mount_record::MountRecord;
pub use shell_process::{ShellProcess, ShellState};
