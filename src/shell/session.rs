//! Shell Session
//!
//! Line protocol over one privileged shell process. Every command is
//! followed by an end marker echo carrying `$?`; the reader forwards
//! stdout lines until it sees the marker.
//!
//! The session lock is held from submission until the marker arrives, so
//! commands run strictly one at a time and in submission order. A caller
//! that stops listening does not desynchronise the protocol: the reader
//! keeps draining until the marker. If the shell dies first, the reader
//! aborts the command and releases the lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, ChildStdout};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::sync::{oneshot, watch, Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use super::process::spawn_shell_process;
use crate::config::ShellConfig;
use crate::error::{Error, Result};
use crate::executor::{CommandEvent, CommandExecutor, CommandStream};
use crate::models::{CommandRequest, ShellProcess};

/// How long `close` waits for `exit` before killing the shell
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Command used to verify privilege
pub const PRIVILEGE_PROBE: &str = "id -u";

/// Piped stdio of the shell, guarded by the session lock
struct ShellIo {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// Snapshot of a session for display and diagnostics
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Session identifier
    pub id: String,
    /// Process ID of the shell
    pub pid: Option<u32>,
    /// Shell program
    pub program: String,
    /// Start time
    pub start_time: Option<DateTime<Utc>>,
    /// Whether the shell still accepts commands
    pub is_alive: bool,
}

/// Handle to one privileged shell process.
///
/// Clones share the same process; the process is killed once the last
/// clone is dropped.
#[derive(Clone)]
pub struct Session {
    id: String,
    marker: String,
    io: Arc<Mutex<ShellIo>>,
    process: Arc<RwLock<ShellProcess>>,
    kill_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
    exited_rx: watch::Receiver<bool>,
    command_timeout: Option<Duration>,
}

impl Session {
    /// Spawn a shell and verify it answers (and is root, when required)
    ///
    /// # Errors
    /// `SessionUnavailable` if the shell cannot be started, does not answer
    /// within the startup timeout, or is not privileged.
    pub async fn spawn(config: &ShellConfig) -> Result<Self> {
        let spawned = spawn_shell_process(config)?;
        let id = Uuid::new_v4().to_string();

        let session = Self {
            marker: format!("__ROOTOPS_END_{}__", id.replace('-', "")),
            id,
            io: Arc::new(Mutex::new(ShellIo {
                stdin: spawned.stdin,
                stdout: spawned.stdout,
            })),
            process: spawned.process,
            kill_tx: Arc::new(Mutex::new(Some(spawned.kill_tx))),
            exited_rx: spawned.exited_rx,
            command_timeout: config.command_timeout(),
        };

        if let Err(e) = session.handshake(config).await {
            session.kill().await;
            return Err(e);
        }

        info!("Session {} ready ({})", session.id, config.program);
        Ok(session)
    }

    async fn handshake(&self, config: &ShellConfig) -> Result<()> {
        let probe = if config.require_root {
            PRIVILEGE_PROBE
        } else {
            "true"
        };
        let stream = self.submit(CommandRequest::new(0, probe)).await;
        let outcome = match stream {
            Ok(stream) => tokio::time::timeout(config.startup_timeout(), stream.collect_result())
                .await
                .unwrap_or_else(|_| {
                    Err(Error::CommandTimeout {
                        command: probe.to_string(),
                        duration: config.startup_timeout(),
                    })
                }),
            Err(e) => Err(e),
        };

        let result = outcome.map_err(|e| Error::SessionUnavailable {
            reason: format!("'{}' did not answer: {}", config.program, e),
        })?;

        if config.require_root {
            let uid = result.line(0).map(str::trim).unwrap_or_default();
            if uid != "0" {
                return Err(Error::SessionUnavailable {
                    reason: format!("'{}' is not privileged (uid '{}')", config.program, uid),
                });
            }
        }

        Ok(())
    }

    /// Session identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the shell process is still running
    pub async fn is_alive(&self) -> bool {
        self.process.read().await.is_running()
    }

    /// Get information about the session
    pub async fn info(&self) -> SessionInfo {
        let process = self.process.read().await;
        SessionInfo {
            id: self.id.clone(),
            pid: process.pid,
            program: process.program.clone(),
            start_time: process.start_time,
            is_alive: process.is_running(),
        }
    }

    /// Ask the shell to exit, killing it if it does not within a grace period
    pub async fn close(&self) -> Result<()> {
        if self.is_alive().await {
            match tokio::time::timeout(CLOSE_GRACE, self.io.lock()).await {
                Ok(mut io) => {
                    if let Err(e) = write_payload(&mut io.stdin, "exit\n").await {
                        debug!("Session {}: exit not delivered: {}", self.id, e);
                    }
                }
                Err(_) => debug!("Session {} is busy, not sending exit", self.id),
            }
        }

        let mut exited = self.exited_rx.clone();
        if tokio::time::timeout(CLOSE_GRACE, exited.wait_for(|done| *done))
            .await
            .is_err()
        {
            warn!("Session {} did not exit in {:?}, killing", self.id, CLOSE_GRACE);
            self.kill().await;
        }

        info!("Session {} closed", self.id);
        Ok(())
    }

    async fn kill(&self) {
        if let Some(tx) = self.kill_tx.lock().await.take() {
            let _ = tx.send(());
        }
        let mut exited = self.exited_rx.clone();
        let _ = exited.wait_for(|done| *done).await;
    }

    fn payload(&self, command_text: &str) -> String {
        // stdin is closed for the command so it cannot swallow the marker line
        format!(
            "{{\n{}\n}} </dev/null\necho \"{} $?\"\n",
            command_text, self.marker
        )
    }
}

#[async_trait]
impl CommandExecutor for Session {
    async fn submit(&self, request: CommandRequest) -> Result<CommandStream> {
        let mut io = self.io.clone().lock_owned().await;

        if !self.is_alive().await {
            return Err(Error::CommandSubmissionFailed {
                command: request.command_text,
                reason: "shell process has exited".to_string(),
            });
        }

        debug!("Session {} <- [{}] {}", self.id, request.id, request.command_text);
        if let Err(e) = write_payload(&mut io.stdin, &self.payload(&request.command_text)).await {
            self.process.write().await.mark_terminated(None);
            return Err(Error::CommandSubmissionFailed {
                command: request.command_text,
                reason: e.to_string(),
            });
        }

        let (tx, rx) = unbounded_channel();
        tokio::spawn(read_until_marker(
            io,
            self.marker.clone(),
            self.process.clone(),
            self.exited_rx.clone(),
            request.id,
            tx,
        ));

        Ok(CommandStream::new(request, rx))
    }

    fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout
    }

    /// Kill the shell; the running command is aborted and the session is dead
    async fn interrupt(&self) {
        warn!("Killing session {}", self.id);
        self.kill().await;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}

async fn write_payload(stdin: &mut ChildStdin, payload: &str) -> std::io::Result<()> {
    stdin.write_all(payload.as_bytes()).await?;
    stdin.flush().await
}

/// Forward stdout lines until the end marker, then release the session lock.
///
/// Also stops when the shell exits: a command's own children can keep
/// stdout open long after the shell is gone.
async fn read_until_marker(
    mut io: OwnedMutexGuard<ShellIo>,
    marker: String,
    process: Arc<RwLock<ShellProcess>>,
    mut exited: watch::Receiver<bool>,
    request_id: u32,
    tx: UnboundedSender<CommandEvent>,
) {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = tokio::select! {
            biased;
            read = io.stdout.read_until(b'\n', &mut buf) => read,
            _ = exited.wait_for(|done| *done) => {
                warn!("Shell exited during request {}", request_id);
                let _ = tx.send(CommandEvent::Aborted {
                    reason: "shell exited".to_string(),
                });
                break;
            }
        };

        match read {
            Ok(0) => {
                process.write().await.mark_terminated(None);
                error!("Shell closed its output during request {}", request_id);
                let _ = tx.send(CommandEvent::Aborted {
                    reason: "shell closed its output".to_string(),
                });
                break;
            }
            Ok(_) => {
                let raw = String::from_utf8_lossy(&buf);
                let line = raw.trim_end_matches(['\n', '\r']);
                match split_marker(line, &marker) {
                    Some((before, exit_code)) => {
                        if !before.is_empty() {
                            let _ = tx.send(CommandEvent::Output(before.to_string()));
                        }
                        debug!("Request {} completed with {}", request_id, exit_code);
                        let _ = tx.send(CommandEvent::Completed { exit_code });
                        break;
                    }
                    None => {
                        // Receiver may be gone; keep draining regardless
                        let _ = tx.send(CommandEvent::Output(line.to_string()));
                    }
                }
            }
            Err(e) => {
                process.write().await.mark_terminated(None);
                error!("Shell read failed during request {}: {}", request_id, e);
                let _ = tx.send(CommandEvent::Aborted {
                    reason: e.to_string(),
                });
                break;
            }
        }
    }
}

/// Split a line at the end marker.
///
/// Returns the text printed before the marker (output without a trailing
/// newline) and the exit code; `-1` if the code is unreadable.
fn split_marker<'a>(line: &'a str, marker: &str) -> Option<(&'a str, i32)> {
    let idx = line.find(marker)?;
    let exit_code = line[idx + marker.len()..].trim().parse().unwrap_or(-1);
    Some((&line[..idx], exit_code))
}
