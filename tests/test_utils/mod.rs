//! Test Utilities and Mocks
//!
//! Shared helpers for the rootops integration, contract and property tests.

#![allow(dead_code, unused_imports)]


// Re-exports for convenience
pub use fixtures::{android_mount_lines, stat_line, test_config};
pub use mock_shell::MockShell;
