//! Privileged Shell Sessions
//!
//! This module spawns the privileged shell, runs the line protocol over its
//! stdio, and manages the single session the process keeps.

pub mod manager;
pub mod process;
pub mod session;

// Re-exports for convenience
pub use manager::SessionManager;
pub use process::get_effective_environment;
pub use session::{Session, SessionInfo, PRIVILEGE_PROBE};
