//! Privileged mutation requests

use serde::{Deserialize, Serialize};

use crate::inventory::commands::{mkdir_command, remove_command, touch_command};

/// What a privileged create makes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    /// Shell command creating an entry of this kind at `path`
    pub fn create_command(self, path: &str) -> String {
        match self {
            EntryKind::File => touch_command(path),
            EntryKind::Directory => mkdir_command(path),
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Directory => write!(f, "directory"),
        }
    }
}

/// Absolute, lexically resolved form of `path`.
///
/// Repeated slashes and `.` collapse, `..` drops the previous component and
/// stops at `/`. Symlinks are not followed.
pub fn normalize_path(path: &str) -> String {
    let mut components: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            name => components.push(name),
        }
    }
    format!("/{}", components.join("/"))
}

/// Paths marked for deletion, in marking order and without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDeletions {
    paths: Vec<String>,
}

impl PendingDeletions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a path. Returns false if it was already marked.
    pub fn insert(&mut self, path: &str) -> bool {
        let path = normalize_path(path);
        if self.paths.contains(&path) {
            return false;
        }
        self.paths.push(path);
        true
    }

    /// Unmark a path. Returns false if it was not marked.
    pub fn remove(&mut self, path: &str) -> bool {
        let path = normalize_path(path);
        match self.paths.iter().position(|p| *p == path) {
            Some(index) => {
                self.paths.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(&normalize_path(path))
    }

    pub fn first(&self) -> Option<&str> {
        self.paths.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// One `rm -rf` for every marked path, or `None` when nothing is marked
    pub fn remove_command(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(remove_command(self.iter()))
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for PendingDeletions {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut pending = Self::new();
        for path in iter {
            pending.insert(path.as_ref());
        }
        pending
    }
}
