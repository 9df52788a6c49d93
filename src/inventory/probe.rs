//! Filesystem probe
//!
//! Classifies enumerated entries without a privileged round-trip.

use std::path::Path;

/// Answers "is this path a directory" for the inventory builder
pub trait FilesystemProbe: Send + Sync {
    /// Whether `path` is a directory. Unreadable paths are not directories.
    fn is_directory(&self, path: &Path) -> bool;
}

/// Probe backed by the local filesystem with the caller's own permissions
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    pub fn new() -> Self {
        Self
    }
}

impl FilesystemProbe for LocalFilesystem {
    fn is_directory(&self, path: &Path) -> bool {
        path.metadata().map(|m| m.is_dir()).unwrap_or(false)
    }
}

impl<F> FilesystemProbe for F
where
    F: Fn(&Path) -> bool + Send + Sync,
{
    fn is_directory(&self, path: &Path) -> bool {
        self(path)
    }
}
