//! Configuration management for rootops
//!
//! This module provides the configuration model, loading/saving of config
//! files, and a watcher that pushes listing preferences into running code.

pub mod loader;
pub mod watcher;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};

/// Main configuration structure for rootops
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Privileged shell configuration
    pub shell: ShellConfig,

    /// Directory listing configuration
    pub listing: ListingConfig,

    /// Storage layout configuration
    pub storage: StorageConfig,

    /// Operation event configuration
    pub events: EventsConfig,
}

impl Config {
    /// Validate the whole configuration
    pub fn validate(&self) -> Result<()> {
        if self.shell.program.trim().is_empty() {
            return Err(Error::ConfigValidationFailed {
                field: "shell.program".to_string(),
                reason: "Shell program cannot be empty".to_string(),
            });
        }

        if self.events.capacity == 0 {
            return Err(Error::ConfigValidationFailed {
                field: "events.capacity".to_string(),
                reason: "Event capacity must be greater than 0".to_string(),
            });
        }

        if let Some(root) = self
            .storage
            .unprivileged_roots
            .iter()
            .find(|root| !root.is_absolute())
        {
            return Err(Error::ConfigValidationFailed {
                field: "storage.unprivileged_roots".to_string(),
                reason: format!("'{}' is not an absolute path", root.display()),
            });
        }

        Ok(())
    }
}

/// Privileged shell configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Program that yields a privileged shell reading commands from stdin
    pub program: String,

    /// Arguments passed to the program
    pub args: Vec<String>,

    /// Extra environment variables
    pub env: HashMap<String, String>,

    /// Whether to inherit the parent environment
    pub inherit_env: bool,

    /// Refuse shells that do not run as uid 0
    pub require_root: bool,

    /// Per-command completion timeout in milliseconds (0 disables)
    pub command_timeout_ms: u64,

    /// Time allowed for the shell to answer its first command
    pub startup_timeout_ms: u64,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: "su".to_string(),
            args: Vec::new(),
            env: HashMap::new(),
            inherit_env: true,
            require_root: true,
            command_timeout_ms: 30_000,
            startup_timeout_ms: 10_000,
        }
    }
}

impl ShellConfig {
    /// A non-root shell, for development and tests
    pub fn unprivileged(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            require_root: false,
            ..Self::default()
        }
    }

    /// Per-command timeout, if enabled
    pub fn command_timeout(&self) -> Option<Duration> {
        (self.command_timeout_ms > 0).then(|| Duration::from_millis(self.command_timeout_ms))
    }

    /// Startup handshake timeout
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }
}

/// Directory listing configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Include dotfiles in listings and child counts
    pub show_hidden: bool,
}

/// Storage layout configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Roots reachable with ordinary file I/O; everything else needs root
    pub unprivileged_roots: Vec<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            unprivileged_roots: vec![
                PathBuf::from("/storage/emulated/0"),
                PathBuf::from("/sdcard"),
            ],
        }
    }
}

/// Operation event configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Buffered events per subscriber before lagging
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

/// Shared "include hidden entries" flag.
///
/// Clones observe the same value; it is read before every enumeration and
/// count command.
#[derive(Debug, Clone, Default)]
pub struct ListingPreferences {
    show_hidden: Arc<AtomicBool>,
}

impl ListingPreferences {
    /// Create preferences with an initial value
    pub fn new(show_hidden: bool) -> Self {
        Self {
            show_hidden: Arc::new(AtomicBool::new(show_hidden)),
        }
    }

    /// Current value of the flag
    pub fn show_hidden(&self) -> bool {
        self.show_hidden.load(Ordering::Relaxed)
    }

    /// Change the flag for every clone
    pub fn set_show_hidden(&self, value: bool) {
        self.show_hidden.store(value, Ordering::Relaxed);
    }
}

impl From<&ListingConfig> for ListingPreferences {
    fn from(config: &ListingConfig) -> Self {
        Self::new(config.show_hidden)
    }
}
