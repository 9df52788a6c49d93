//! Configuration File Watcher
//!
//! Watches the loaded configuration file and pushes changes to the listing
//! preferences into running code without a restart.

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use super::loader::ConfigLoader;
use super::{Config, ListingPreferences};
use crate::error::{Error, Result};

/// Configuration file watcher
pub struct ConfigWatcher {
    /// Path to the configuration file being watched
    config_path: PathBuf,
    /// File system watcher
    _watcher: RecommendedWatcher,
    /// Receiver for file system events
    event_rx: Receiver<notify::Result<Event>>,
    /// Last successfully loaded configuration
    current_config: Config,
    /// Preferences updated on every reload
    preferences: ListingPreferences,
    /// Flag to indicate if watching is active
    is_watching: Arc<AtomicBool>,
}

impl ConfigWatcher {
    /// Create a new configuration watcher
    ///
    /// # Errors
    /// Returns `ConfigWatchFailed` if the watcher cannot be created
    pub fn new(
        config_path: PathBuf,
        initial_config: Config,
        preferences: ListingPreferences,
    ) -> Result<Self> {
        let (event_tx, event_rx) = channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            if let Err(e) = event_tx.send(res) {
                error!("Failed to send file watch event: {}", e);
            }
        })
        .map_err(|e| Error::ConfigWatchFailed {
            reason: format!("Failed to create watcher: {}", e),
        })?;

        // Editors often replace the file, so watch its directory
        let watch_path = config_path
            .parent()
            .ok_or_else(|| Error::ConfigWatchFailed {
                reason: "Config file has no parent directory".to_string(),
            })?;

        watcher
            .watch(watch_path, RecursiveMode::NonRecursive)
            .map_err(|e| Error::ConfigWatchFailed {
                reason: format!("Failed to watch directory: {}", e),
            })?;

        info!("Started watching config file: {}", config_path.display());

        Ok(Self {
            config_path,
            _watcher: watcher,
            event_rx,
            current_config: initial_config,
            preferences,
            is_watching: Arc::new(AtomicBool::new(true)),
        })
    }

    /// The last successfully loaded configuration
    pub fn config(&self) -> &Config {
        &self.current_config
    }

    /// Check for configuration changes and reload if necessary
    ///
    /// # Returns
    /// `Ok(Some(config))` if the configuration was reloaded, `Ok(None)` if
    /// nothing changed, or the reload error
    pub fn check_and_reload(&mut self) -> Result<Option<Config>> {
        let mut changed = false;

        loop {
            match self.event_rx.try_recv() {
                Ok(Ok(event)) => {
                    if self.is_config_file_event(&event) {
                        debug!("Config file change detected: {:?}", event.kind);
                        changed = true;
                    }
                }
                Ok(Err(e)) => error!("File watch error: {}", e),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    error!("File watch channel disconnected");
                    self.stop();
                    break;
                }
            }
        }

        if !changed {
            return Ok(None);
        }

        match self.reload_config() {
            Ok(config) => {
                info!("Configuration reloaded from {}", self.config_path.display());
                Ok(Some(config))
            }
            Err(e) => {
                warn!("Failed to reload configuration: {}", e);
                Err(e)
            }
        }
    }

    fn is_config_file_event(&self, event: &Event) -> bool {
        event
            .paths
            .iter()
            .any(|p| same_file(p, &self.config_path))
    }

    fn reload_config(&mut self) -> Result<Config> {
        let config = ConfigLoader::load_from_path(&self.config_path)?;
        self.preferences
            .set_show_hidden(config.listing.show_hidden);
        self.current_config = config.clone();
        Ok(config)
    }

    /// Poll for changes every second on a background task
    pub fn start_background_watch(
        config_path: PathBuf,
        initial_config: Config,
        preferences: ListingPreferences,
    ) -> Result<tokio::task::JoinHandle<()>> {
        let mut watcher = Self::new(config_path.clone(), initial_config, preferences)?;

        let handle = tokio::spawn(async move {
            info!("Background config watcher started for: {}", config_path.display());

            while watcher.is_watching() {
                if let Err(e) = watcher.check_and_reload() {
                    debug!("Keeping previous configuration: {}", e);
                }
                sleep(Duration::from_secs(1)).await;
            }

            warn!("Config watcher stopped");
        });

        Ok(handle)
    }

    /// Stop watching for configuration changes
    pub fn stop(&self) {
        self.is_watching.store(false, Ordering::Relaxed);
    }

    /// Check if the watcher is still active
    pub fn is_watching(&self) -> bool {
        self.is_watching.load(Ordering::Relaxed)
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
