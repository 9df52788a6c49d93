//! rootops - privileged shell pipelines and filesystem inventory
//!
//! This library drives one long-lived privileged shell (`su` by default)
//! to list directories, create and delete entries, and temporarily remount
//! read-only filesystems for writing.
//!
//! ## Module Organization
//!
//! - [`shell`] - Privileged shell process, line protocol, session reuse
//! - [`executor`] - Command submission contract, streaming results, timeouts
//! - [`inventory`] - Three-stage directory listing (names, counts, sizes)
//! - [`mount`] - Mount table parsing and scoped read-write remounts
//! - [`ops`] - Caller-facing operations and completion events
//! - [`config`] - Configuration loading, validation and live reload
//! - [`models`] - Data structures (InventoryEntry, MountRecord, ShellProcess)
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use rootops::{Config, RootOps};
//! use std::path::Path;
//!
//! # async fn run() -> rootops::Result<()> {
//! let ops = RootOps::new(&Config::default());
//! if ops.ensure_root().await {
//!     for entry in ops.list(Path::new("/data")).await? {
//!         println!("{}", entry);
//!     }
//! }
//! ops.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! All commands share one shell and run strictly one at a time in
//! submission order. A command's output is read until a per-session end
//! marker that also carries the exit code, so many commands can be sent
//! over the same stdin/stdout pair. Listings take three round-trips whose
//! output lines are matched to entries by position.

#[macro_use]
extern crate tracing;

pub mod config;
pub mod error;
pub mod executor;
pub mod inventory;
pub mod models;
pub mod mount;
pub mod ops;
pub mod shell;

// Re-exports for core functionality
pub use config::{Config, ListingPreferences};
pub use error::{Error, Result};
pub use executor::{CommandExecutor, CommandStream};
pub use inventory::InventoryBuilder;
pub use models::{InventoryEntry, MountRecord};
pub use mount::{MountTable, Remounter};
pub use ops::{EntryKind, OperationEvent, PendingDeletions, RootOps};
pub use shell::{Session, SessionManager};

// Convenience re-exports for common types
pub use config::loader::ConfigLoader;
pub use config::watcher::ConfigWatcher;

// Version information
/// The current version of rootops from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The package name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Load configuration from `path`, or from the default search locations.
///
/// An explicit path must exist and parse. Without one, a missing or broken
/// default file falls back to built-in defaults with a warning.
///
/// # Returns
///
/// The configuration and the file it came from, if any.
pub fn load_config(path: Option<&std::path::Path>) -> Result<(Config, Option<std::path::PathBuf>)> {
    info!("Initializing {} v{}", NAME, VERSION);

    if let Some(path) = path {
        if !path.exists() {
            return Err(Error::ConfigLoadFailed {
                path: path.to_path_buf(),
                reason: "Configuration file does not exist".to_string(),
            });
        }
        let config = ConfigLoader::load_from_path(path)?;
        info!("Configuration loaded from: {}", path.display());
        return Ok((config, Some(path.to_path_buf())));
    }

    match ConfigLoader::load() {
        Ok(loaded) => Ok(loaded),
        Err(e) => {
            warn!("Failed to load configuration: {}. Using defaults", e);
            Ok((Config::default(), None))
        }
    }
}

/// User-facing explanation of a startup failure
pub fn handle_startup_error(error: &Error) -> String {
    match error {
        Error::ConfigLoadFailed { path, reason } => {
            format!(
                "Configuration Error: Failed to load config from '{}': {}\n\nTry:\n• Check the path passed with --config\n• Ensure file permissions are correct",
                path.display(),
                reason
            )
        }
        Error::ConfigParseFailed { format, reason } => {
            format!(
                "Configuration Error: Failed to parse {} config: {}\n\nTry:\n• Check configuration file syntax",
                format, reason
            )
        }
        Error::ConfigValidationFailed { field, reason } => {
            format!(
                "Configuration Error: Validation failed for '{}': {}",
                field, reason
            )
        }
        Error::SessionUnavailable { reason } => {
            format!(
                "Shell Error: No privileged shell available: {}\n\nTry:\n• Check that the device is rooted\n• Grant root access to this program\n• Set shell.program in the configuration",
                reason
            )
        }
        Error::MountResolutionFailed { path } => {
            format!(
                "Mount Error: No mount point contains '{}'\n\nTry:\n• Use an absolute path",
                path.display()
            )
        }
        _ => format!("Error: {}", error),
    }
}
