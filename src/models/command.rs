//! Command Request / Result Models
//!
//! The request/result contract between callers and the pipeline executor.

use serde::{Deserialize, Serialize};

/// Separator used when several sub-commands share one shell round-trip
pub const COMMAND_SEPARATOR: &str = ";";

/// One shell invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    /// Caller-assigned identifier used to correlate output
    pub id: u32,
    /// Text written to the shell, possibly several `;`-joined sub-commands
    pub command_text: String,
}

impl CommandRequest {
    /// Create a request for a single command line
    pub fn new(id: u32, command_text: impl Into<String>) -> Self {
        Self {
            id,
            command_text: command_text.into(),
        }
    }

    /// Join several sub-commands into one round-trip
    pub fn joined<I, S>(id: u32, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parts: Vec<String> = commands
            .into_iter()
            .map(|c| c.as_ref().trim().trim_end_matches(COMMAND_SEPARATOR).to_string())
            .filter(|c| !c.is_empty())
            .collect();
        Self::new(id, parts.join(&format!("{} ", COMMAND_SEPARATOR)))
    }
}

/// Outcome of one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Identifier of the request this result answers
    pub request_id: u32,
    /// Stdout lines in emission order
    pub output_lines: Vec<String>,
    /// Exit status of the last sub-command
    pub exit_code: i32,
}

impl CommandResult {
    /// Whether the command exited with status 0
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Line at a position, if the shell produced that many
    pub fn line(&self, index: usize) -> Option<&str> {
        self.output_lines.get(index).map(String::as_str)
    }
}
