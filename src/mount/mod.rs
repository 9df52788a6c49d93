//! Mount-State Remounting
//!
//! Mount table parsing, longest-prefix resolution, and scoped read-write
//! remounts for privileged writes.

pub mod remount;
pub mod table;

// Re-exports for convenience
pub use remount::Remounter;
pub use table::MountTable;
