//! Shell Process Model
//!
//! Lifecycle record of the privileged shell process owned by a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents the state of a shell process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ShellState {
    /// Process has been created but not started
    #[default]
    Created,
    /// Process is accepting commands
    Running,
    /// Process has exited or was closed
    Terminated,
}

/// Lifecycle of one privileged shell process
#[derive(Debug, Clone)]
pub struct ShellProcess {
    /// OS process identifier
    pub pid: Option<u32>,

    /// Current state of the process
    pub state: ShellState,

    /// When the process was started
    pub start_time: Option<DateTime<Utc>>,

    /// When the process terminated (if applicable)
    pub end_time: Option<DateTime<Utc>>,

    /// Exit code (if process has terminated and reported one)
    pub exit_code: Option<i32>,

    /// Shell program that was executed
    pub program: String,

    /// Arguments passed to the program
    pub args: Vec<String>,
}

impl ShellProcess {
    /// Create a new shell process in the Created state
    pub fn new(program: String, args: Vec<String>) -> Self {
        Self {
            pid: None,
            state: ShellState::Created,
            start_time: None,
            end_time: None,
            exit_code: None,
            program,
            args,
        }
    }

    /// Mark the process as started with the given PID
    pub fn mark_started(&mut self, pid: Option<u32>) {
        self.pid = pid;
        self.state = ShellState::Running;
        self.start_time = Some(Utc::now());
    }

    /// Mark the process as terminated. Idempotent: the first exit wins.
    pub fn mark_terminated(&mut self, exit_code: Option<i32>) {
        if self.is_terminated() {
            return;
        }
        self.state = ShellState::Terminated;
        self.end_time = Some(Utc::now());
        self.exit_code = exit_code;
    }

    /// Check if the process is currently running
    pub fn is_running(&self) -> bool {
        matches!(self.state, ShellState::Running)
    }

    /// Check if the process has terminated
    pub fn is_terminated(&self) -> bool {
        matches!(self.state, ShellState::Terminated)
    }

    /// Time the process has been (or was) alive
    pub fn uptime(&self) -> Option<std::time::Duration> {
        let start = self.start_time?;
        let end = self.end_time.unwrap_or_else(Utc::now);
        end.signed_duration_since(start).to_std().ok()
    }

    /// Get a display string for the process
    pub fn display_string(&self) -> String {
        let state_str = match self.state {
            ShellState::Created => "Created",
            ShellState::Running => "Running",
            ShellState::Terminated => "Terminated",
        };

        let pid_str = self.pid.map_or("N/A".to_string(), |pid| pid.to_string());

        format!(
            "{} {} [{}] - {}{}",
            self.program,
            self.args.join(" "),
            pid_str,
            state_str,
            self.exit_code
                .map_or(String::new(), |code| format!(" (exit: {})", code))
        )
    }
}

impl std::fmt::Display for ShellProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_string())
    }
}
