//! Root Operations
//!
//! The caller-facing surface: privileged listing, create and delete, plus
//! the root probe and privilege routing. Every operation returns its result
//! directly and also publishes a completion event on the operation bus.

pub mod events;
pub mod mutation;

pub use events::{OperationEvent, OperationEventBus, OperationEventSubscription};
pub use mutation::{normalize_path, EntryKind, PendingDeletions};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{Config, ListingPreferences};
use crate::error::Result;
use crate::executor::{CommandExecutor, RequestIds};
use crate::inventory::InventoryBuilder;
use crate::models::InventoryEntry;
use crate::mount::{MountTable, Remounter};
use crate::shell::{SessionManager, PRIVILEGE_PROBE};

/// Privileged filesystem operations over one shared executor
pub struct RootOps<E> {
    executor: E,
    builder: InventoryBuilder<E>,
    remounter: Remounter<E>,
    ids: RequestIds,
    unprivileged_roots: Vec<PathBuf>,
    events: OperationEventBus,
}

impl RootOps<Arc<SessionManager>> {
    /// Operations backed by a lazily started privileged shell
    pub fn new(config: &Config) -> Self {
        Self::with_preferences(config, ListingPreferences::from(&config.listing))
    }

    /// Like [`RootOps::new`], sharing an existing preferences handle
    pub fn with_preferences(config: &Config, preferences: ListingPreferences) -> Self {
        let manager = Arc::new(SessionManager::new(config.shell.clone()));
        Self::with_executor(manager, config, preferences)
    }

    /// Close the privileged shell. The next operation starts a new one.
    pub async fn close(&self) -> Result<()> {
        self.executor.close().await
    }
}

impl<E: CommandExecutor + Clone> RootOps<E> {
    /// Operations over a caller-supplied executor
    pub fn with_executor(executor: E, config: &Config, preferences: ListingPreferences) -> Self {
        Self {
            builder: InventoryBuilder::new(executor.clone(), preferences),
            remounter: Remounter::new(executor.clone()),
            executor,
            ids: RequestIds::new(),
            unprivileged_roots: config.storage.unprivileged_roots.clone(),
            events: OperationEventBus::new(config.events.capacity),
        }
    }
}

impl<E: CommandExecutor> RootOps<E> {
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Listing preferences shared with the inventory builder
    pub fn preferences(&self) -> &ListingPreferences {
        self.builder.preferences()
    }

    pub fn event_bus(&self) -> &OperationEventBus {
        &self.events
    }

    /// Subscribe to completion events
    pub fn subscribe(&self) -> OperationEventSubscription {
        self.events.subscribe()
    }

    /// Whether a root shell is available. Never fails; any error is `false`.
    pub async fn ensure_root(&self) -> bool {
        match self.executor.run(self.ids.request(PRIVILEGE_PROBE)).await {
            Ok(result) => {
                let is_root = result.success() && result.line(0).map(str::trim) == Some("0");
                if !is_root {
                    warn!("Shell is not running as root: {:?}", result.output_lines);
                }
                is_root
            }
            Err(e) => {
                warn!("Root shell unavailable: {}", e);
                false
            }
        }
    }

    /// Whether `path` lies outside every storage root reachable without root
    pub fn needs_root(&self, path: &Path) -> bool {
        !self
            .unprivileged_roots
            .iter()
            .any(|root| path.starts_with(root))
    }

    /// List `path` and publish [`OperationEvent::InventoryReady`]
    pub async fn list(&self, path: &Path) -> Result<Vec<InventoryEntry>> {
        let entries = match self.builder.list(path).await {
            Ok(entries) => entries,
            Err(e) => {
                error!("Listing {} failed: {}", path.display(), e);
                return Err(e);
            }
        };

        self.events.publish(OperationEvent::InventoryReady {
            path: path.to_path_buf(),
            entries: entries.clone(),
        });
        Ok(entries)
    }

    /// Current mount table
    pub async fn mount_table(&self) -> Result<MountTable> {
        self.remounter.mount_table().await
    }

    /// Create a file or directory at `path` with its mount made writable.
    ///
    /// Returns whether the shell reported success and publishes
    /// [`OperationEvent::MutationComplete`] either way.
    pub async fn create(&self, path: &str, kind: EntryKind) -> Result<bool> {
        let path = normalize_path(path);
        let command = kind.create_command(&path);
        info!("Creating {} {}", kind, path);

        let outcome = self
            .remounter
            .with_writable_mount(Path::new(&path), move || async move {
                let result = self.executor.run(self.ids.request(command)).await?;
                Ok(result.success())
            })
            .await;

        self.finish_mutation(path, outcome)
    }

    /// Delete every pending path in one `rm -rf`.
    ///
    /// The write is guarded by the mount of the first path. An empty set
    /// succeeds without running anything or publishing an event.
    pub async fn delete(&self, pending: &PendingDeletions) -> Result<bool> {
        let (Some(first), Some(command)) = (pending.first(), pending.remove_command()) else {
            debug!("Nothing pending for deletion");
            return Ok(true);
        };
        let first = first.to_string();
        info!("Deleting {} paths", pending.len());

        let outcome = self
            .remounter
            .with_writable_mount(Path::new(&first), move || async move {
                let result = self.executor.run(self.ids.request(command)).await?;
                Ok(result.success())
            })
            .await;

        self.finish_mutation(first, outcome)
    }

    fn finish_mutation(&self, path: String, outcome: Result<bool>) -> Result<bool> {
        let success = matches!(outcome, Ok(true));
        match &outcome {
            Ok(true) => info!("{} done", path),
            Ok(false) => warn!("Shell reported failure for {}", path),
            Err(e) => error!("Mutation of {} failed: {}", path, e),
        }

        self.events
            .publish(OperationEvent::MutationComplete { path, success });
        outcome
    }
}

impl<E> std::fmt::Debug for RootOps<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootOps")
            .field("unprivileged_roots", &self.unprivileged_roots)
            .field("events", &self.events)
            .finish()
    }
}
