//! Mount-State Remounter
//!
//! Runs a privileged write with the target's mount temporarily read-write.
//! A read-only mount is switched with `mount -o rw,remount` before the
//! write and always switched back with `umount -r` afterwards, whether the
//! write succeeded, failed, or panicked.

use futures::FutureExt;
use std::future::Future;
use std::panic::{resume_unwind, AssertUnwindSafe};
use std::path::Path;

use super::table::MountTable;
use crate::error::{Error, Result};
use crate::executor::{CommandExecutor, RequestIds};
use crate::inventory::commands::{remount_ro_command, remount_rw_command, MOUNT_TABLE_COMMAND};
use crate::models::MountRecord;

/// Scoped read-write access to mounts through a [`CommandExecutor`]
pub struct Remounter<E> {
    executor: E,
    ids: RequestIds,
}

impl<E: CommandExecutor> Remounter<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            ids: RequestIds::new(),
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Snapshot of the current mount table
    pub async fn mount_table(&self) -> Result<MountTable> {
        let result = self.executor.run(self.ids.request(MOUNT_TABLE_COMMAND)).await?;
        if !result.success() {
            warn!("mount exited with {}", result.exit_code);
        }
        Ok(MountTable::parse(&result.output_lines))
    }

    /// The mount that `path` lives on
    ///
    /// # Errors
    /// `MountResolutionFailed` when no mount point contains `path`
    pub async fn resolve(&self, path: &Path) -> Result<MountRecord> {
        let table = self.mount_table().await?;
        table
            .resolve(path)
            .cloned()
            .ok_or_else(|| Error::MountResolutionFailed {
                path: path.to_path_buf(),
            })
    }

    /// Run `action` with the mount containing `path` writable.
    ///
    /// A `rw` mount runs `action` directly. A `ro` mount is remounted
    /// read-write first and restored to read-only after `action` returns,
    /// including when it returns an error or panics. Mounts with neither
    /// flag run `action` as is.
    ///
    /// # Errors
    /// - `MountResolutionFailed` if no mount contains `path`; `action` is not run
    /// - `RemountFailed` if the read-write remount exits non-zero; `action` is
    ///   not run and nothing is restored
    /// - the error of `action`, which takes precedence over a failed restore
    /// - `RemountFailed` if `action` succeeded but the restore exits non-zero
    ///
    /// # Cancellation
    /// Not cancellation safe. The restore runs only if the returned future is
    /// polled to completion; dropping it while `action` runs leaves the mount
    /// read-write. Bound the write with the executor's command timeout rather
    /// than an outer timeout: a timed-out command returns an error here and
    /// the restore still runs.
    pub async fn with_writable_mount<F, Fut, T>(&self, path: &Path, action: F) -> Result<T>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
        T: Send,
    {
        let record = self.resolve(path).await?;
        debug!(
            "{} is on {} ({})",
            path.display(),
            record.mount_point,
            record.options.iter().cloned().collect::<Vec<_>>().join(",")
        );

        if record.is_read_write() {
            return action().await;
        }

        if !record.is_read_only() {
            warn!(
                "Mount {} is neither rw nor ro, running without remount",
                record.mount_point
            );
            return action().await;
        }

        let mount_point = record.mount_point;
        self.remount(&mount_point, remount_rw_command(&mount_point))
            .await?;
        info!("Remounted {} read-write", mount_point);

        let outcome = AssertUnwindSafe(async move { action().await })
            .catch_unwind()
            .await;

        let restored = self
            .remount(&mount_point, remount_ro_command(&mount_point))
            .await;
        match &restored {
            Ok(()) => info!("Restored {} read-only", mount_point),
            Err(e) => error!("Failed to restore {} read-only: {}", mount_point, e),
        }

        match outcome {
            Err(panic) => resume_unwind(panic),
            Ok(Err(e)) => Err(e),
            Ok(Ok(value)) => restored.map(|()| value),
        }
    }

    async fn remount(&self, mount_point: &str, command: String) -> Result<()> {
        let result = self.executor.run(self.ids.request(command)).await?;
        if result.success() {
            Ok(())
        } else {
            Err(Error::RemountFailed {
                mount_point: mount_point.to_string(),
                exit_code: result.exit_code,
            })
        }
    }
}
