//! Mount Record Model
//!
//! One line of `mount` output, reduced to what remount decisions need.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Mount point and its option flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountRecord {
    /// Where the filesystem is mounted
    pub mount_point: String,
    /// Option flags such as `rw`, `ro`, `nosuid`
    pub options: BTreeSet<String>,
}

impl MountRecord {
    /// Create a record from a mount point and a comma separated option list
    pub fn new(mount_point: impl Into<String>, options: &str) -> Self {
        Self {
            mount_point: mount_point.into(),
            options: split_options(options),
        }
    }

    /// Parse one line of `mount` output.
    ///
    /// Two layouts are accepted:
    /// - `dev on /mnt type fs (opts)`: mount point at field 2, options at field 5
    /// - `dev /mnt fs opts 0 0` (`/proc/mounts`, toybox): fields 1 and 3
    pub fn parse(line: &str) -> Option<Self> {
        let words: Vec<&str> = line.split_whitespace().collect();

        if words.len() >= 6 && words[1] == "on" && words[3] == "type" {
            return Some(Self::new(words[2], words[5]));
        }

        if words.len() >= 4 && words[1].starts_with('/') {
            return Some(Self::new(words[1], words[3]));
        }

        None
    }

    /// Whether the options contain `rw`
    pub fn is_read_write(&self) -> bool {
        self.options.contains("rw")
    }

    /// Whether the options contain `ro`
    pub fn is_read_only(&self) -> bool {
        self.options.contains("ro")
    }
}

fn split_options(raw: &str) -> BTreeSet<String> {
    raw.trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
