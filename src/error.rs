//! Error types and Result aliases for rootops

use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for rootops operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for rootops
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // === Session errors ===
    /// No privileged shell could be obtained
    #[error("Privileged shell unavailable: {reason}")]
    SessionUnavailable { reason: String },

    /// The command could not be handed to the shell
    #[error("Failed to submit command '{command}': {reason}")]
    CommandSubmissionFailed { command: String, reason: String },

    /// The shell went away before the command completed
    #[error("Command '{command}' aborted: {reason}")]
    CommandAborted { command: String, reason: String },

    /// No completion arrived within the configured timeout
    #[error("Command '{command}' timed out after {duration:?}")]
    CommandTimeout { command: String, duration: Duration },

    // === Output errors ===
    /// A single output line did not parse into the expected field
    #[error("Unparseable output line '{line}': {reason}")]
    ParseAnomaly { line: String, reason: String },

    // === Mount errors ===
    /// No mount record covers the target path
    #[error("No mount point found for '{}'", path.display())]
    MountResolutionFailed { path: PathBuf },

    /// Remount command exited non-zero
    #[error("Remount of '{mount_point}' failed with exit code {exit_code}")]
    RemountFailed { mount_point: String, exit_code: i32 },

    // === Configuration errors ===
    /// Failed to load configuration file
    #[error("Failed to load config from '{}': {reason}", path.display())]
    ConfigLoadFailed { path: PathBuf, reason: String },

    /// Failed to parse configuration
    #[error("Failed to parse {format} config: {reason}")]
    ConfigParseFailed { format: String, reason: String },

    /// Failed to serialize configuration
    #[error("Failed to serialize config as {format}: {reason}")]
    ConfigSerializationFailed { format: String, reason: String },

    /// Configuration validation failed
    #[error("Configuration validation failed for '{field}': {reason}")]
    ConfigValidationFailed { field: String, reason: String },

    /// Failed to watch configuration file
    #[error("Failed to watch config: {reason}")]
    ConfigWatchFailed { reason: String },

    /// Configuration file not found
    #[error("Configuration file not found")]
    ConfigNotFound,

    // === I/O and serialization errors ===
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    // === Generic fallback (use sparingly) ===
    /// Generic errors
    #[error("Error: {0}")]
    Other(String),
}

impl Error {
    /// Transient, process-level failures. Rerunning the whole pipeline is safe.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::CommandSubmissionFailed { .. }
                | Error::CommandAborted { .. }
                | Error::CommandTimeout { .. }
        )
    }

    /// Failures that no retry of the same operation can fix
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::SessionUnavailable { .. } | Error::MountResolutionFailed { .. }
        )
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
