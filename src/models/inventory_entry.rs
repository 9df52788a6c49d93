//! Inventory Entry Model
//!
//! One record per immediate child of a listed directory.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single entry of a directory inventory.
///
/// Exactly one of `child_count` and `size_bytes` is meaningful, selected by
/// `is_directory`; the other stays zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    /// Absolute path, unique within a listing
    pub path: String,
    /// Entry name as printed by `ls`
    pub name: String,
    /// Whether the probe classified the entry as a directory
    pub is_directory: bool,
    /// Number of visible children (directories only)
    pub child_count: u32,
    /// Size in bytes (files only)
    pub size_bytes: u64,
}

impl InventoryEntry {
    /// Create an empty entry as produced by enumeration
    pub fn new(path: impl Into<String>, name: impl Into<String>, is_directory: bool) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            is_directory,
            child_count: 0,
            size_bytes: 0,
        }
    }

    /// Whether the entry is a dotfile
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }

    /// Directories first, then case-insensitive name.
    ///
    /// The inventory builder never sorts; views use this for display order.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        match (self.is_directory, other.is_directory) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => self
                .name
                .to_lowercase()
                .cmp(&other.name.to_lowercase()),
        }
    }
}

impl std::fmt::Display for InventoryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_directory {
            write!(f, "{}/ ({} items)", self.name, self.child_count)
        } else {
            write!(f, "{} ({} bytes)", self.name, self.size_bytes)
        }
    }
}
