//! Shell command composition
//!
//! Every privileged command string the crate sends is built here.

use crate::models::CommandRequest;

/// Output of a positional slot that has nothing to report
pub const PLACEHOLDER: &str = "echo 0";

/// Quote a path for `sh`. Plain paths are left untouched.
pub fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+,:@%".contains(c));

    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

fn hidden_flag(show_hidden: bool) -> &'static str {
    if show_hidden {
        "-A "
    } else {
        ""
    }
}

/// `ls [-A] <path>`
pub fn list_command(path: &str, show_hidden: bool) -> String {
    format!("ls {}{}", hidden_flag(show_hidden), shell_quote(path))
}

/// `ls [-A] <dir> | wc -l`
pub fn count_command(dir: &str, show_hidden: bool) -> String {
    format!("{} | wc -l", list_command(dir, show_hidden))
}

/// `stat -t <path>`
pub fn stat_command(path: &str) -> String {
    format!("stat -t {}", shell_quote(path))
}

/// `touch <path>`
pub fn touch_command(path: &str) -> String {
    format!("touch {}", shell_quote(path))
}

/// `mkdir <path>`
pub fn mkdir_command(path: &str) -> String {
    format!("mkdir {}", shell_quote(path))
}

/// `rm -rf <path>...`
pub fn remove_command<'a, I>(paths: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let args: Vec<String> = paths.into_iter().map(shell_quote).collect();
    format!("rm -rf {}", args.join(" "))
}

/// `mount`
pub const MOUNT_TABLE_COMMAND: &str = "mount";

/// `mount -o rw,remount <mountpoint>`
pub fn remount_rw_command(mount_point: &str) -> String {
    format!("mount -o rw,remount {}", shell_quote(mount_point))
}

/// `umount -r <mountpoint>`
pub fn remount_ro_command(mount_point: &str) -> String {
    format!("umount -r {}", shell_quote(mount_point))
}

/// Several commands whose output lines map 1:1 to slot positions.
///
/// Each slot must print exactly one line. Slots that may print nothing on
/// failure are given an `echo 0` fallback so later positions stay aligned.
#[derive(Debug, Clone, Default)]
pub struct PositionalBatch {
    slots: Vec<String>,
}

impl PositionalBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot that always prints one line
    pub fn push(&mut self, command: String) {
        self.slots.push(command);
    }

    /// A slot that prints one line on success and nothing on failure
    pub fn push_fallible(&mut self, command: String) {
        self.slots
            .push(format!("{} 2>/dev/null || {}", command, PLACEHOLDER));
    }

    /// A slot with nothing to report
    pub fn push_placeholder(&mut self) {
        self.slots.push(PLACEHOLDER.to_string());
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// One shell round-trip for the whole batch
    pub fn into_request(self, id: u32) -> CommandRequest {
        CommandRequest::joined(id, self.slots)
    }
}
