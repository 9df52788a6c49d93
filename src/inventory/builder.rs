//! Inventory Builder
//!
//! Lists a directory through the privileged shell in three sequential
//! round-trips:
//!
//! 1. enumerate entry names (`ls`)
//! 2. count children of every directory (`ls | wc -l`, `echo 0` for files)
//! 3. stat every file (`stat -t`, `echo 0` for directories)
//!
//! Stages 2 and 3 rely on positional alignment: line *i* of their output
//! belongs to entry *i* of stage 1. The directory is assumed not to change
//! between round-trips; if it does, counts and sizes may land on the wrong
//! entries without any error.

use std::path::Path;

use super::commands::{count_command, list_command, stat_command, PositionalBatch};
use super::parse::{parse_child_count, parse_stat_size};
use super::probe::{FilesystemProbe, LocalFilesystem};
use crate::config::ListingPreferences;
use crate::error::Result;
use crate::executor::{CommandExecutor, RequestIds};
use crate::models::{CommandResult, InventoryEntry};

/// Builds directory inventories through a [`CommandExecutor`]
pub struct InventoryBuilder<E, P = LocalFilesystem> {
    executor: E,
    probe: P,
    preferences: ListingPreferences,
    ids: RequestIds,
}

impl<E: CommandExecutor> InventoryBuilder<E, LocalFilesystem> {
    /// Builder probing entries on the local filesystem
    pub fn new(executor: E, preferences: ListingPreferences) -> Self {
        Self::with_probe(executor, LocalFilesystem, preferences)
    }
}

impl<E: CommandExecutor, P: FilesystemProbe> InventoryBuilder<E, P> {
    /// Builder with a custom directory probe
    pub fn with_probe(executor: E, probe: P, preferences: ListingPreferences) -> Self {
        Self {
            executor,
            probe,
            preferences,
            ids: RequestIds::new(),
        }
    }

    /// Preferences consulted before each enumeration and count
    pub fn preferences(&self) -> &ListingPreferences {
        &self.preferences
    }

    /// Executor the builder runs its commands through
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Full three-stage listing of `path`, in enumeration order.
    ///
    /// An empty directory returns immediately without stages 2 and 3.
    ///
    /// # Errors
    /// Session and process failures abort the listing. Unparseable count or
    /// size lines do not; the affected field stays zero.
    pub async fn list(&self, path: &Path) -> Result<Vec<InventoryEntry>> {
        let mut entries = self.enumerate(path).await?;
        if entries.is_empty() {
            debug!("{} is empty, skipping count and size stages", path.display());
            return Ok(entries);
        }

        self.resolve_child_counts(&mut entries).await?;
        self.resolve_sizes(&mut entries).await?;

        info!("Listed {} entries in {}", entries.len(), path.display());
        Ok(entries)
    }

    /// Stage 1: one empty entry per `ls` output line
    pub async fn enumerate(&self, path: &Path) -> Result<Vec<InventoryEntry>> {
        let dir = path.to_string_lossy();
        let command = list_command(&dir, self.preferences.show_hidden());
        let result = self.executor.run(self.ids.request(command)).await?;

        if !result.success() {
            warn!(
                "Listing {} exited with {}, using {} lines of output",
                dir,
                result.exit_code,
                result.output_lines.len()
            );
        }

        let entries = result
            .output_lines
            .iter()
            .filter(|name| !name.is_empty())
            .map(|name| {
                let entry_path = path.join(name);
                let is_directory = self.probe.is_directory(&entry_path);
                InventoryEntry::new(entry_path.to_string_lossy(), name.as_str(), is_directory)
            })
            .collect();

        Ok(entries)
    }

    /// Stage 2: child counts for directories, zero for files
    pub async fn resolve_child_counts(&self, entries: &mut [InventoryEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let show_hidden = self.preferences.show_hidden();
        let mut batch = PositionalBatch::new();
        for entry in entries.iter() {
            if entry.is_directory {
                batch.push(count_command(&entry.path, show_hidden));
            } else {
                batch.push_placeholder();
            }
        }

        let result = self.executor.run(batch.into_request(self.ids.next_id())).await?;
        check_alignment("count", entries.len(), &result);

        for (index, entry) in entries.iter_mut().enumerate() {
            if !entry.is_directory {
                continue;
            }
            match parse_child_count(result.line(index).unwrap_or_default()) {
                Ok(count) => entry.child_count = count,
                Err(e) => debug!("Child count of {} left at 0: {}", entry.path, e),
            }
        }

        Ok(())
    }

    /// Stage 3: byte sizes for files, zero for directories
    pub async fn resolve_sizes(&self, entries: &mut [InventoryEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut batch = PositionalBatch::new();
        for entry in entries.iter() {
            if entry.is_directory {
                batch.push_placeholder();
            } else {
                batch.push_fallible(stat_command(&entry.path));
            }
        }

        let result = self.executor.run(batch.into_request(self.ids.next_id())).await?;
        check_alignment("size", entries.len(), &result);

        for (index, entry) in entries.iter_mut().enumerate() {
            if entry.is_directory {
                continue;
            }
            match parse_stat_size(result.line(index).unwrap_or_default(), &entry.path) {
                Ok(size) => entry.size_bytes = size,
                Err(e) => debug!("Size of {} left at 0: {}", entry.path, e),
            }
        }

        Ok(())
    }
}

fn check_alignment(stage: &str, expected: usize, result: &CommandResult) {
    if result.output_lines.len() != expected {
        warn!(
            "{} stage returned {} lines for {} entries; positions may be misaligned",
            stage,
            result.output_lines.len(),
            expected
        );
    }
}
